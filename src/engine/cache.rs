//! MikroDB - LRU Table Tracker
//! Tracks per-table last-access order and selects eviction victims when the
//! resident table count exceeds the cache limit.

use std::collections::HashMap;

use crate::types::Record;

/// Tracks table access recency. Uses a monotonically increasing internal
/// sequence number rather than a wall-clock timestamp, so two accesses in
/// the same millisecond are still strictly ordered.
pub struct LruTracker {
    last_access: HashMap<String, u64>,
    sequence: u64,
}

impl LruTracker {
    pub fn new() -> Self {
        Self {
            last_access: HashMap::new(),
            sequence: 0,
        }
    }

    /// Record an access to `table`, making it the most-recently-used entry.
    pub fn track_table_access(&mut self, table: &str) {
        self.sequence += 1;
        self.last_access.insert(table.to_string(), self.sequence);
    }

    /// Stop tracking a table (used when it's evicted or explicitly deleted).
    pub fn remove(&mut self, table: &str) {
        self.last_access.remove(table);
    }

    pub fn len(&self) -> usize {
        self.last_access.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_access.is_empty()
    }

    /// Given the number of tables currently resident, return the
    /// `current_count - limit` least-recently-used table names (or an empty
    /// vec if at or below the limit). The returned tables are removed from
    /// the tracker; the caller is responsible for actually evicting them
    /// from the resident map.
    pub fn find_tables_for_eviction(&mut self, current_count: usize, limit: usize) -> Vec<String> {
        if current_count <= limit {
            return Vec::new();
        }
        let evict_count = current_count - limit;

        let mut by_recency: Vec<(String, u64)> = self
            .last_access
            .iter()
            .map(|(table, seq)| (table.clone(), *seq))
            .collect();
        by_recency.sort_by_key(|(_, seq)| *seq);

        let victims: Vec<String> = by_recency
            .into_iter()
            .take(evict_count)
            .map(|(table, _)| table)
            .collect();

        for table in &victims {
            self.last_access.remove(table);
        }

        victims
    }

    /// Return the keys among `records` whose expiration has already passed
    /// as of `now_ms`.
    pub fn find_expired_items(records: &HashMap<String, Record>, now_ms: u64) -> Vec<String> {
        records
            .iter()
            .filter(|(_, record)| record.is_expired_at(now_ms))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}
