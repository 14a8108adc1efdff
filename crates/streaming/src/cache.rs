use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::ids::ChapterId;

use crate::geojson::FeatureCollection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    BudgetExceeded { requested: usize, max: usize },
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::BudgetExceeded { requested, max } => {
                write!(
                    f,
                    "chapter data too large for budget: requested={requested} max={max}"
                )
            }
        }
    }
}

impl std::error::Error for CacheError {}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Arc<FeatureCollection>,
    bytes: usize,
    last_used_tick: u64,
}

/// In-memory chapter data cache with a byte budget.
///
/// - Entries are keyed in a `BTreeMap` for stable traversal order.
/// - Eviction is LRU by `last_used_tick`, with a tie-break by key ordering.
/// - The cache is pinned to a story version; changing the pin drops everything.
#[derive(Debug)]
pub struct ChapterDataCache {
    max_bytes: usize,
    used_bytes: usize,
    tick: u64,
    version: Option<String>,
    entries: BTreeMap<ChapterId, CacheEntry>,
}

impl ChapterDataCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            tick: 0,
            version: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Pins the cache to `version`. Returns the chapters that were dropped.
    pub fn pin_version(&mut self, version: impl Into<String>) -> Vec<ChapterId> {
        let version = version.into();
        if self.version.as_deref() == Some(version.as_str()) {
            return Vec::new();
        }
        self.version = Some(version);
        self.used_bytes = 0;
        std::mem::take(&mut self.entries).into_keys().collect()
    }

    pub fn get(&mut self, id: &str) -> Option<Arc<FeatureCollection>> {
        self.tick += 1;
        let entry = self.entries.get_mut(id)?;
        entry.last_used_tick = self.tick;
        Some(entry.data.clone())
    }

    /// Stores `data` (weighing `bytes`), evicting least-recently-used entries
    /// until the budget holds. Returns the evicted chapters.
    pub fn insert(
        &mut self,
        id: ChapterId,
        data: Arc<FeatureCollection>,
        bytes: usize,
    ) -> Result<Vec<ChapterId>, CacheError> {
        if bytes > self.max_bytes {
            return Err(CacheError::BudgetExceeded {
                requested: bytes,
                max: self.max_bytes,
            });
        }

        self.tick += 1;
        if let Some(old) = self.entries.remove(&id) {
            self.used_bytes = self.used_bytes.saturating_sub(old.bytes);
        }
        self.entries.insert(
            id.clone(),
            CacheEntry {
                data,
                bytes,
                last_used_tick: self.tick,
            },
        );
        self.used_bytes += bytes;

        let mut evicted = Vec::new();
        while self.used_bytes > self.max_bytes {
            let candidate = self
                .entries
                .iter()
                .filter(|(k, _)| **k != id)
                .min_by(|(ka, ea), (kb, eb)| {
                    ea.last_used_tick
                        .cmp(&eb.last_used_tick)
                        .then_with(|| ka.cmp(kb))
                })
                .map(|(k, _)| k.clone());
            // The new entry fits the budget on its own, so something else is always evictable.
            let Some(key) = candidate else {
                break;
            };
            if let Some(e) = self.entries.remove(&key) {
                self.used_bytes = self.used_bytes.saturating_sub(e.bytes);
            }
            evicted.push(key);
        }
        Ok(evicted)
    }
}
