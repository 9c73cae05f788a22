//! District records and cached-read envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact district record shown in search results and offline lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictSummary {
    /// Stable district identifier
    pub id: String,
    pub name: String,
    pub region: String,
}

/// Full district record as returned by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictDetail {
    /// Stable district identifier
    pub id: String,
    pub name: String,
    pub region: String,
    pub population: u64,
    /// Number of active monitoring stations in the district
    pub station_count: u32,
}

impl From<&DistrictDetail> for DistrictSummary {
    fn from(detail: &DistrictDetail) -> Self {
        Self {
            id: detail.id.clone(),
            name: detail.name.clone(),
            region: detail.region.clone(),
        }
    }
}

// == Cache Source ==
/// How a cached value reached the caller. Network-sourced values are labeled
/// by the caller itself, not by the cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheSource {
    /// Served from cache within its TTL
    Cache,
    /// Served from cache past its TTL; caller decides whether to refetch
    StaleCache,
}

// == Cached Result ==
/// A cached value together with its freshness, so callers can implement
/// stale-while-revalidate without the store knowing about that policy.
#[derive(Debug, Clone, Serialize)]
pub struct CachedResult<T> {
    pub data: T,
    pub source: CacheSource,
    /// When the value was written to the cache
    pub cached_at: DateTime<Utc>,
    /// True once the entry's TTL has elapsed
    pub is_stale: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_detail() {
        let detail = DistrictDetail {
            id: "d-7".to_string(),
            name: "Oak Hill".to_string(),
            region: "North".to_string(),
            population: 48_000,
            station_count: 3,
        };

        let summary = DistrictSummary::from(&detail);
        assert_eq!(summary.id, "d-7");
        assert_eq!(summary.name, "Oak Hill");
        assert_eq!(summary.region, "North");
    }
}
