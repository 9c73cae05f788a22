//! Cache Store Module
//!
//! Durable, partitioned key-value storage with per-entry TTL and LRU
//! eviction. Each partition is snapshotted to its own JSON file; a store
//! whose directory cannot be used degrades every operation to a no-op so
//! callers never have to handle storage failures.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{eviction, CacheEntry, Partition, PartitionSpec, PartitionStats};
use crate::config::Config;

// == Partition State ==
/// One partition's entries, bounds and counters.
#[derive(Debug)]
struct PartitionState {
    entries: HashMap<String, CacheEntry>,
    spec: PartitionSpec,
    stats: PartitionStats,
}

// == Cache Store ==
/// Partitioned cache storage with LRU eviction, TTL support and snapshot
/// persistence.
#[derive(Debug)]
pub struct CacheStore {
    /// Per-partition storage
    partitions: HashMap<Partition, PartitionState>,
    /// Snapshot directory, None = volatile store
    snapshot_dir: Option<PathBuf>,
    /// False when the storage medium was unusable at open time; fixed for
    /// the life of the store
    available: bool,
}

impl CacheStore {
    // == Constructors ==
    /// Creates a volatile store with no snapshot directory.
    pub fn in_memory(config: &Config) -> Self {
        Self {
            partitions: empty_partitions(config),
            snapshot_dir: None,
            available: true,
        }
    }

    /// Opens a durable store rooted at `dir`, loading existing partition
    /// snapshots.
    ///
    /// Never fails: if the directory cannot be created or written, the store
    /// comes up disabled and every operation degrades to a no-op / absent
    /// result. A corrupt partition snapshot is logged and that partition
    /// starts empty.
    pub fn open(dir: impl Into<PathBuf>, config: &Config) -> Self {
        let dir = dir.into();
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), %err, "cache directory unusable, store disabled");
            return Self::disabled(config);
        }
        let probe = dir.join(".probe");
        if let Err(err) = fs::write(&probe, b"ok") {
            warn!(dir = %dir.display(), %err, "cache directory not writable, store disabled");
            return Self::disabled(config);
        }
        let _ = fs::remove_file(&probe);

        let mut partitions = HashMap::new();
        for partition in Partition::ALL {
            let entries = load_partition(&dir, partition);
            let mut stats = PartitionStats::new();
            stats.set_total_entries(entries.len());
            partitions.insert(
                partition,
                PartitionState {
                    entries,
                    spec: PartitionSpec::for_partition(partition, config),
                    stats,
                },
            );
        }
        Self {
            partitions,
            snapshot_dir: Some(dir),
            available: true,
        }
    }

    /// Creates a store from configuration: durable when `cache_dir` is set,
    /// volatile otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.cache_dir {
            Some(dir) => Self::open(dir.clone(), config),
            None => Self::in_memory(config),
        }
    }

    fn disabled(config: &Config) -> Self {
        Self {
            partitions: empty_partitions(config),
            snapshot_dir: None,
            available: false,
        }
    }

    // == Availability ==
    /// True when operations are functional. False only when the storage
    /// medium was unusable at open time.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// True when entries survive process restarts.
    pub fn is_persistent(&self) -> bool {
        self.snapshot_dir.is_some()
    }

    // == Get ==
    /// Retrieves an entry if present and unexpired.
    ///
    /// An expired entry is deleted as a side effect and reported absent.
    /// On success the entry's access metadata is updated. Absence is a
    /// normal result, never an error.
    pub fn get(&mut self, partition: Partition, key: &str) -> Option<CacheEntry> {
        if !self.available {
            return None;
        }
        let state = self.partitions.get_mut(&partition)?;
        let Some(entry) = state.entries.get_mut(key) else {
            state.stats.record_miss();
            return None;
        };

        if entry.is_expired() {
            state.entries.remove(key);
            state.stats.record_expired_removal();
            state.stats.record_miss();
            let len = state.entries.len();
            state.stats.set_total_entries(len);
            self.persist_partition(partition);
            return None;
        }

        entry.touch();
        let entry = entry.clone();
        state.stats.record_hit();
        self.persist_partition(partition);
        Some(entry)
    }

    // == Peek ==
    /// Retrieves an entry without deleting it, even when expired.
    ///
    /// Access metadata is still updated; expiry is left to the caller to
    /// judge. This is the staleness-tolerant read behind the façade's
    /// stale-while-revalidate surface.
    pub fn peek(&mut self, partition: Partition, key: &str) -> Option<CacheEntry> {
        if !self.available {
            return None;
        }
        let state = self.partitions.get_mut(&partition)?;
        let Some(entry) = state.entries.get_mut(key) else {
            state.stats.record_miss();
            return None;
        };

        entry.touch();
        let entry = entry.clone();
        state.stats.record_hit();
        self.persist_partition(partition);
        Some(entry)
    }

    // == Set ==
    /// Inserts or overwrites the entry for `key`, stamping fresh timestamps.
    ///
    /// Inserting a new key into a bounded partition at capacity first evicts
    /// the least-recently-accessed entries to make room.
    pub fn set(&mut self, partition: Partition, key: &str, value: Value, ttl: Option<Duration>) {
        if !self.available {
            debug!(partition = partition.name(), key, "store disabled, set dropped");
            return;
        }
        let Some(state) = self.partitions.get_mut(&partition) else {
            return;
        };
        let ttl = ttl.unwrap_or(state.spec.default_ttl);

        let is_overwrite = state.entries.contains_key(key);
        if !is_overwrite {
            if let Some(max) = state.spec.max_entries {
                if state.entries.len() >= max {
                    let overflow = state.entries.len() - max + 1;
                    for victim in eviction::select_evictees(&state.entries, overflow) {
                        state.entries.remove(&victim);
                        state.stats.record_eviction();
                        debug!(
                            partition = partition.name(),
                            key = %victim,
                            "evicted least-recently-accessed entry"
                        );
                    }
                }
            }
        }

        state.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        let len = state.entries.len();
        state.stats.set_total_entries(len);
        self.persist_partition(partition);
    }

    // == Delete ==
    /// Removes an entry. Idempotent: deleting an absent key is a no-op.
    pub fn delete(&mut self, partition: Partition, key: &str) {
        if !self.available {
            return;
        }
        let Some(state) = self.partitions.get_mut(&partition) else {
            return;
        };
        if state.entries.remove(key).is_some() {
            let len = state.entries.len();
            state.stats.set_total_entries(len);
            self.persist_partition(partition);
        }
    }

    // == Get All ==
    /// Returns all unexpired entries of a partition with their keys.
    ///
    /// Expired entries are filtered from the result but not deleted; the
    /// sweep in [`CacheStore::cleanup`] reclaims them.
    pub fn get_all(&self, partition: Partition) -> Vec<(String, CacheEntry)> {
        if !self.available {
            return Vec::new();
        }
        let Some(state) = self.partitions.get(&partition) else {
            return Vec::new();
        };
        state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    // == Clear ==
    /// Removes all entries from one partition.
    pub fn clear(&mut self, partition: Partition) {
        if !self.available {
            return;
        }
        if let Some(state) = self.partitions.get_mut(&partition) {
            state.entries.clear();
            state.stats.set_total_entries(0);
            self.persist_partition(partition);
        }
    }

    /// Removes all entries from every partition.
    pub fn clear_all(&mut self) {
        for partition in Partition::ALL {
            self.clear(partition);
        }
    }

    // == Cleanup Expired ==
    /// Active sweep deleting every expired entry across all partitions.
    ///
    /// Returns the number of entries removed. Intended to run periodically
    /// or on demand, not on every read.
    pub fn cleanup(&mut self) -> usize {
        if !self.available {
            return 0;
        }
        let mut removed = 0;
        for partition in Partition::ALL {
            let Some(state) = self.partitions.get_mut(&partition) else {
                continue;
            };
            let expired: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect();
            if expired.is_empty() {
                continue;
            }
            for key in &expired {
                state.entries.remove(key);
                state.stats.record_expired_removal();
            }
            let len = state.entries.len();
            state.stats.set_total_entries(len);
            removed += expired.len();
            self.persist_partition(partition);
        }
        removed
    }

    // == Stats ==
    /// Returns current per-partition statistics.
    pub fn stats(&self) -> Vec<(Partition, PartitionStats)> {
        Partition::ALL
            .iter()
            .filter_map(|partition| {
                self.partitions.get(partition).map(|state| {
                    let mut stats = state.stats.clone();
                    stats.set_total_entries(state.entries.len());
                    (*partition, stats)
                })
            })
            .collect()
    }

    // == Length ==
    /// Returns the current number of entries in a partition.
    pub fn len(&self, partition: Partition) -> usize {
        self.partitions
            .get(&partition)
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }

    /// Returns true if the partition holds no entries.
    pub fn is_empty(&self, partition: Partition) -> bool {
        self.len(partition) == 0
    }

    // == Persistence ==
    /// Writes one partition's snapshot. Best-effort: failures are logged and
    /// swallowed so a full disk or revoked quota never interrupts callers.
    fn persist_partition(&self, partition: Partition) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        let Some(state) = self.partitions.get(&partition) else {
            return;
        };
        let path = snapshot_path(dir, partition);
        match serde_json::to_vec(&state.entries) {
            Ok(bytes) => {
                if let Err(err) = fs::write(&path, bytes) {
                    warn!(partition = partition.name(), %err, "snapshot write failed");
                }
            }
            Err(err) => {
                warn!(partition = partition.name(), %err, "snapshot encode failed");
            }
        }
    }
}

fn empty_partitions(config: &Config) -> HashMap<Partition, PartitionState> {
    Partition::ALL
        .iter()
        .map(|&partition| {
            (
                partition,
                PartitionState {
                    entries: HashMap::new(),
                    spec: PartitionSpec::for_partition(partition, config),
                    stats: PartitionStats::new(),
                },
            )
        })
        .collect()
}

fn snapshot_path(dir: &Path, partition: Partition) -> PathBuf {
    dir.join(format!("{}.json", partition.name()))
}

/// Loads one partition's snapshot; missing files are normal, unreadable or
/// corrupt ones are logged and treated as empty.
fn load_partition(dir: &Path, partition: Partition) -> HashMap<String, CacheEntry> {
    let path = snapshot_path(dir, partition);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return HashMap::new(),
        Err(err) => {
            warn!(partition = partition.name(), %err, "snapshot read failed, starting empty");
            return HashMap::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(partition = partition.name(), %err, "corrupt snapshot, starting empty");
            HashMap::new()
        }
    }
}
