//! envcache - offline cache and computation layer for a civic air-quality
//! tracker
//!
//! Provides a durable, partitioned key-value store with TTL expiration and
//! LRU eviction, a typed façade that distinguishes stale from absent, and a
//! score computation service with request coalescing and circuit breaking.

pub mod cache;
pub mod compute;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{CacheStore, Partition};
pub use compute::{ComputeConfig, HttpReadingsProvider, ReadingsProvider, ScoreService};
pub use config::Config;
pub use domain::DomainCache;
pub use error::{ComputeError, ProviderError};
pub use tasks::spawn_cleanup_task;
