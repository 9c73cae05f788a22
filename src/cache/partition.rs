//! Cache Partition Module
//!
//! Named, independently-keyed subdivisions of the store. Each partition
//! declares its own key shape (normalized query text or stable district id),
//! capacity bound and default TTL.

use std::time::Duration;

use crate::config::Config;

// == Partition Enum ==
/// Logical namespace for cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Free-text search results, keyed by normalized query
    SearchResults,
    /// Full district records, keyed by district id
    DistrictDetails,
    /// District summaries mirrored from detail writes, keyed by district id;
    /// the browsable surface for offline mode
    SearchIndex,
}

impl Partition {
    /// Every partition, in snapshot/sweep order.
    pub const ALL: [Partition; 3] = [
        Partition::SearchResults,
        Partition::DistrictDetails,
        Partition::SearchIndex,
    ];

    /// Stable name, also used as the snapshot file stem.
    pub fn name(self) -> &'static str {
        match self {
            Partition::SearchResults => "search_results",
            Partition::DistrictDetails => "district_details",
            Partition::SearchIndex => "search_index",
        }
    }
}

// == Partition Spec ==
/// Per-partition behavior: capacity bound and default TTL.
#[derive(Debug, Clone)]
pub struct PartitionSpec {
    /// Maximum number of entries, None = unbounded
    pub max_entries: Option<usize>,
    /// TTL applied when the caller does not pass one
    pub default_ttl: Duration,
}

impl PartitionSpec {
    /// Resolves the spec for `partition` from configuration.
    pub fn for_partition(partition: Partition, config: &Config) -> Self {
        match partition {
            Partition::SearchResults => Self {
                max_entries: Some(config.search_max_entries),
                default_ttl: config.search_ttl,
            },
            Partition::DistrictDetails => Self {
                max_entries: Some(config.detail_max_entries),
                default_ttl: config.detail_ttl,
            },
            Partition::SearchIndex => Self {
                max_entries: Some(config.index_max_entries),
                default_ttl: config.detail_ttl,
            },
        }
    }
}
