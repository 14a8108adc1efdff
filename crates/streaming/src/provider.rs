use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use catalog::StoryCatalog;
use foundation::ids::ChapterId;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::ChapterDataCache;
use crate::geojson::FeatureCollection;
use crate::source::{DataSource, DataSourceError};

/// Default cache budget: enough for a long story's tracks and zones.
pub const DEFAULT_CACHE_BYTES: usize = 64 * 1024 * 1024;

/// Bounded retries with exponential backoff and a per-attempt timeout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the `attempt`-th failure (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Cache-or-fetch access to chapter data.
///
/// [`ChapterDataProvider::get_chapter_data`] never fails: once retries are
/// exhausted it hands back an empty feature collection so rendering code
/// always receives a data set. Failures are not cached.
pub struct ChapterDataProvider {
    source: Arc<dyn DataSource>,
    retry: RetryPolicy,
    paths: BTreeMap<ChapterId, String>,
    cache: Mutex<ChapterDataCache>,
}

impl ChapterDataProvider {
    pub fn new(source: Arc<dyn DataSource>, retry: RetryPolicy, cache_bytes: usize) -> Self {
        Self {
            source,
            retry,
            paths: BTreeMap::new(),
            cache: Mutex::new(ChapterDataCache::new(cache_bytes)),
        }
    }

    /// Provider for every chapter of `catalog` that declares a data source,
    /// with the cache pinned to the story's fingerprint.
    pub fn for_story(
        catalog: &StoryCatalog,
        source: Arc<dyn DataSource>,
        retry: RetryPolicy,
        cache_bytes: usize,
    ) -> Self {
        let mut provider = Self::new(source, retry, cache_bytes);
        for chapter in catalog.chapters() {
            if let Some(path) = &chapter.data_source {
                provider.paths.insert(chapter.id.clone(), path.clone());
            }
        }
        provider.cache.lock().pin_version(catalog.fingerprint());
        provider
    }

    pub fn with_path(mut self, chapter: impl Into<ChapterId>, path: impl Into<String>) -> Self {
        self.paths.insert(chapter.into(), path.into());
        self
    }

    /// Chapters that have a data file.
    pub fn chapters(&self) -> impl Iterator<Item = &ChapterId> {
        self.paths.keys()
    }

    pub fn cached_chapters(&self) -> usize {
        self.cache.lock().len()
    }

    pub async fn get_chapter_data(&self, chapter: &str) -> Arc<FeatureCollection> {
        if let Some(hit) = self.cache.lock().get(chapter) {
            return hit;
        }

        let Some(path) = self.paths.get(chapter) else {
            debug!("chapter {chapter} has no data source");
            return Arc::new(FeatureCollection::empty());
        };

        match self.fetch_with_retries(path).await {
            Ok((data, bytes)) => {
                let data = Arc::new(data);
                let stored = self
                    .cache
                    .lock()
                    .insert(ChapterId::new(chapter), data.clone(), bytes);
                if let Err(err) = stored {
                    warn!("not caching data for {chapter}: {err}");
                }
                data
            }
            Err(err) => {
                warn!(
                    "chapter data for {chapter} unavailable after {} attempts: {err}",
                    self.retry.max_attempts
                );
                Arc::new(FeatureCollection::empty())
            }
        }
    }

    /// Fetches data for every chapter with a data file, in chapter id order.
    pub async fn prefetch_all(&self) -> Vec<(ChapterId, Arc<FeatureCollection>)> {
        let mut out = Vec::with_capacity(self.paths.len());
        for chapter in self.paths.keys() {
            let data = self.get_chapter_data(chapter.as_str()).await;
            out.push((chapter.clone(), data));
        }
        out
    }

    async fn fetch_with_retries(
        &self,
        path: &str,
    ) -> Result<(FeatureCollection, usize), DataSourceError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_err = DataSourceError::new("no attempt made");

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.retry.attempt_timeout, self.source.fetch(path)).await {
                Ok(Ok(bytes)) => {
                    let len = bytes.len();
                    // A malformed file will not get better on retry.
                    return FeatureCollection::from_slice(&bytes).map(|fc| (fc, len));
                }
                Ok(Err(err)) => last_err = err,
                Err(_) => {
                    last_err = DataSourceError::new(format!(
                        "timed out after {:?}",
                        self.retry.attempt_timeout
                    ))
                }
            }

            debug!(
                "fetch {path} from {} failed (attempt {attempt}/{attempts}): {last_err}",
                self.source.describe()
            );
            if attempt < attempts {
                tokio::time::sleep(self.retry.backoff_after(attempt)).await;
            }
        }

        Err(last_err)
    }
}
