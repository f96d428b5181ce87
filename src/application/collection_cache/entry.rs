use crate::collections::domain::{Pagination, QuerySignature, ResourceRecord};
use crate::shared::error::FetchError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Lifecycle status of one cached query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Never fetched, or invalidated and waiting for a refetch
    Pending,
    Ready,
    /// Last fetch failed; earlier records, if any, are still carried
    Error,
}

/// Snapshot of one cache entry, as handed to readers and subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionCacheEntry {
    pub signature: QuerySignature,
    pub status: CacheStatus,
    /// Records of the last successful fetch, in backend order
    pub records: Vec<ResourceRecord>,
    pub pagination: Option<Pagination>,
    /// When the last successful fetch settled; `None` if there never was one
    pub fetched_at: Option<DateTime<Utc>>,
    /// A fetch for this signature is outstanding
    pub is_fetching: bool,
    /// The records are known to be out of date (expired or invalidated)
    pub is_stale: bool,
    pub last_error: Option<FetchError>,
    /// Fetch generation the entry belongs to
    pub generation: u64,
    /// Bumped on every change; subscribers never see it go backwards
    pub revision: u64,
}

impl CollectionCacheEntry {
    pub fn pending(signature: QuerySignature) -> Self {
        Self {
            signature,
            status: CacheStatus::Pending,
            records: Vec::new(),
            pagination: None,
            fetched_at: None,
            is_fetching: false,
            is_stale: false,
            last_error: None,
            generation: 0,
            revision: 0,
        }
    }

    /// Whether a successful fetch ever populated this entry
    pub fn has_data(&self) -> bool {
        self.fetched_at.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.status == CacheStatus::Ready
    }

    /// Older than `ttl` at `now`. An entry without data is never "expired",
    /// it is simply pending.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        match self.fetched_at {
            Some(fetched_at) => now - fetched_at >= ttl,
            None => false,
        }
    }

    /// Total reported by the backend, falling back to the record count
    pub fn total(&self) -> u64 {
        self.pagination
            .map(|p| p.total)
            .unwrap_or(self.records.len() as u64)
    }
}
