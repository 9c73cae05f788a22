//! Computation Service Module
//!
//! Produces air-quality scores for districts by combining an in-memory
//! result cache, concurrent-request coalescing and a circuit breaker around
//! the external readings fetch. The pure score model itself is supplied by
//! the embedding application.

mod breaker;
mod provider;
mod service;

pub use breaker::CircuitBreaker;
pub use provider::{HttpReadingsProvider, ReadingsProvider};
pub use service::{ComputeConfig, ScoreModel, ScoreService};
