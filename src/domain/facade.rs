//! Typed façade over the partitioned store.
//!
//! Unlike the raw store's `get`, the read operations here tolerate serving
//! stale data: the entry's freshness is reported alongside the value so the
//! caller can serve-stale-and-refetch without the store knowing about that
//! policy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore, Partition};
use crate::models::{CacheSource, CachedResult, DistrictDetail, DistrictSummary};

// == Domain Cache ==
/// Domain-typed view of the shared cache store.
#[derive(Clone)]
pub struct DomainCache {
    store: Arc<RwLock<CacheStore>>,
}

impl DomainCache {
    pub fn new(store: Arc<RwLock<CacheStore>>) -> Self {
        Self { store }
    }

    /// Shared handle to the underlying store (for sweeps and stats).
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.store)
    }

    // == Search Results ==
    /// Caches search results under the normalized query.
    ///
    /// Empty or whitespace-only queries are ignored.
    pub async fn cache_search_results(&self, query: &str, results: &[DistrictSummary]) {
        let Some(key) = normalize_query(query) else {
            debug!("empty search query, nothing cached");
            return;
        };
        let Some(value) = encode(results) else {
            return;
        };
        self.store
            .write()
            .await
            .set(Partition::SearchResults, &key, value, None);
    }

    /// Returns cached results for a query, stale ones included.
    ///
    /// The entry is never deleted here even when expired; `is_stale` tells
    /// the caller to decide between showing it and forcing a refetch.
    pub async fn get_cached_search_results(
        &self,
        query: &str,
    ) -> Option<CachedResult<Vec<DistrictSummary>>> {
        let key = normalize_query(query)?;
        let entry = self
            .store
            .write()
            .await
            .peek(Partition::SearchResults, &key)?;
        into_cached_result(entry)
    }

    // == District Details ==
    /// Caches a district detail record, mirroring its summary into the
    /// search index so detail fetches also populate offline browsing.
    pub async fn cache_district_detail(&self, detail: &DistrictDetail) {
        let Some(value) = encode(detail) else {
            return;
        };
        let summary = DistrictSummary::from(detail);
        let Some(summary_value) = encode(&summary) else {
            return;
        };

        let mut store = self.store.write().await;
        store.set(Partition::DistrictDetails, &detail.id, value, None);
        store.set(Partition::SearchIndex, &detail.id, summary_value, None);
    }

    /// Returns a cached district detail, stale ones included.
    pub async fn get_cached_district_detail(&self, id: &str) -> Option<CachedResult<DistrictDetail>> {
        let entry = self
            .store
            .write()
            .await
            .peek(Partition::DistrictDetails, id)?;
        into_cached_result(entry)
    }

    // == Offline Views ==
    /// All unexpired district summaries known to the search index.
    pub async fn get_all_cached_summaries(&self) -> Vec<DistrictSummary> {
        let store = self.store.read().await;
        store
            .get_all(Partition::SearchIndex)
            .into_iter()
            .filter_map(|(_, entry)| decode(entry.value))
            .collect()
    }

    /// The most recently accessed district summaries, newest first.
    pub async fn get_recently_accessed(&self, limit: usize) -> Vec<DistrictSummary> {
        let store = self.store.read().await;
        let mut entries = store.get_all(Partition::SearchIndex);
        entries.sort_by(|a, b| {
            b.1.last_accessed_at
                .cmp(&a.1.last_accessed_at)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
            .into_iter()
            .take(limit)
            .filter_map(|(_, entry)| decode(entry.value))
            .collect()
    }
}

// == Helpers ==
/// Normalizes a free-text query into a cache key: trimmed and case-folded.
/// Returns None for empty or whitespace-only input.
fn normalize_query(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

fn into_cached_result<T: DeserializeOwned>(entry: CacheEntry) -> Option<CachedResult<T>> {
    let is_stale = entry.is_expired();
    let cached_at = timestamp_ms_to_datetime(entry.created_at);
    let data = decode(entry.value)?;
    Some(CachedResult {
        data,
        source: if is_stale {
            CacheSource::StaleCache
        } else {
            CacheSource::Cache
        },
        cached_at,
        is_stale,
    })
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%err, "cache payload could not be encoded, skipping write");
            None
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(data) => Some(data),
        Err(err) => {
            warn!(%err, "cache payload could not be decoded, treating as absent");
            None
        }
    }
}

fn timestamp_ms_to_datetime(ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_else(Utc::now)
}
