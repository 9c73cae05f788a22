//! Configuration Module
//!
//! Handles loading and managing data-layer configuration from environment
//! variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Data-layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding partition snapshot files (None = volatile store)
    pub cache_dir: Option<PathBuf>,
    /// Maximum entries in the search-results partition
    pub search_max_entries: usize,
    /// Maximum entries in the district-details partition
    pub detail_max_entries: usize,
    /// Maximum entries in the search-index partition
    pub index_max_entries: usize,
    /// TTL for cached search results
    pub search_ttl: Duration,
    /// TTL for cached district details and mirrored summaries
    pub detail_ttl: Duration,
    /// TTL for computed scores held by the computation service
    pub score_ttl: Duration,
    /// Consecutive failures that open the circuit breaker
    pub failure_threshold: u32,
    /// Time the breaker stays open before the next real attempt
    pub circuit_cooldown: Duration,
    /// Pure-calculation duration above which a warning is emitted
    pub slow_calc_threshold: Duration,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Snapshot directory (default: unset, volatile store)
    /// - `SEARCH_MAX_ENTRIES` - Search partition capacity (default: 50)
    /// - `DETAIL_MAX_ENTRIES` - Detail partition capacity (default: 100)
    /// - `INDEX_MAX_ENTRIES` - Search-index partition capacity (default: 200)
    /// - `SEARCH_TTL` - Search result TTL in seconds (default: 900)
    /// - `DETAIL_TTL` - Detail TTL in seconds (default: 3600)
    /// - `SCORE_TTL` - Computed score TTL in seconds (default: 1800)
    /// - `FAILURE_THRESHOLD` - Breaker trip threshold (default: 5)
    /// - `CIRCUIT_COOLDOWN` - Breaker cooldown in seconds (default: 30)
    /// - `SLOW_CALC_MS` - Slow-calculation warning threshold (default: 250)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR").ok().map(PathBuf::from),
            search_max_entries: env_or("SEARCH_MAX_ENTRIES", defaults.search_max_entries),
            detail_max_entries: env_or("DETAIL_MAX_ENTRIES", defaults.detail_max_entries),
            index_max_entries: env_or("INDEX_MAX_ENTRIES", defaults.index_max_entries),
            search_ttl: Duration::from_secs(env_or("SEARCH_TTL", 900)),
            detail_ttl: Duration::from_secs(env_or("DETAIL_TTL", 3600)),
            score_ttl: Duration::from_secs(env_or("SCORE_TTL", 1800)),
            failure_threshold: env_or("FAILURE_THRESHOLD", defaults.failure_threshold),
            circuit_cooldown: Duration::from_secs(env_or("CIRCUIT_COOLDOWN", 30)),
            slow_calc_threshold: Duration::from_millis(env_or("SLOW_CALC_MS", 250)),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }
}

/// Parses an environment variable, falling back to `default` when unset or
/// unparseable.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            search_max_entries: 50,
            detail_max_entries: 100,
            index_max_entries: 200,
            search_ttl: Duration::from_secs(900),
            detail_ttl: Duration::from_secs(3600),
            score_ttl: Duration::from_secs(1800),
            failure_threshold: 5,
            circuit_cooldown: Duration::from_secs(30),
            slow_calc_threshold: Duration::from_millis(250),
            cleanup_interval: 60,
        }
    }
}
