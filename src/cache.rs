use crate::error::LoadResult;
use crate::types::Dataset;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

/// Matches the ten minute lifetime the hosted dashboard used.
pub const DEFAULT_TTL_SECS: i64 = 600;

struct Entry {
    data: Arc<Dataset>,
    acquired_at: DateTime<Utc>,
}

/// Normalized datasets keyed by source location. Entries older than `ttl`
/// are reloaded in full on the next request.
pub struct DatasetCache {
    ttl: Duration,
    entries: HashMap<String, Entry>,
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        DatasetCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn is_fresh(&self, source: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .get(source)
            .map(|e| now - e.acquired_at <= self.ttl)
            .unwrap_or(false)
    }

    /// Returns the cached snapshot for `source`, calling `load` when there is
    /// none or it has gone stale. A failed load leaves the cache untouched.
    pub fn get_or_refresh<F>(
        &mut self,
        source: &str,
        now: DateTime<Utc>,
        load: F,
    ) -> LoadResult<Arc<Dataset>>
    where
        F: FnOnce(&str) -> LoadResult<Dataset>,
    {
        if self.is_fresh(source, now) {
            if let Some(e) = self.entries.get(source) {
                debug!("cache hit for {}", source);
                return Ok(Arc::clone(&e.data));
            }
        }
        info!("loading {} (cache miss or stale)", source);
        let data = Arc::new(load(source)?);
        self.entries.insert(
            source.to_string(),
            Entry {
                data: Arc::clone(&data),
                acquired_at: now,
            },
        );
        Ok(data)
    }

    pub fn invalidate(&mut self, source: &str) {
        self.entries.remove(source);
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        DatasetCache::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}
