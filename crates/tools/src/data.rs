use std::path::PathBuf;
use std::sync::Arc;

use catalog::StoryCatalog;
use foundation::ids::ChapterId;
use streaming::{
    ChapterDataProvider, DEFAULT_CACHE_BYTES, DataSource, FeatureCollection, FilesystemSource,
    HttpSource, RetryPolicy,
};
use tracing::info;

/// Where chapter data files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Root(PathBuf),
    Url(String),
}

impl DataLocation {
    /// A local root wins over a URL; flags win over environment values.
    pub fn resolve(
        root: Option<PathBuf>,
        url: Option<String>,
        env_root: Option<String>,
        env_url: Option<String>,
    ) -> Option<Self> {
        root.map(DataLocation::Root)
            .or(url.map(DataLocation::Url))
            .or(env_root.map(|r| DataLocation::Root(PathBuf::from(r))))
            .or(env_url.map(DataLocation::Url))
    }

    pub fn source(&self) -> Arc<dyn DataSource> {
        match self {
            DataLocation::Root(root) => Arc::new(FilesystemSource::new(root)),
            DataLocation::Url(url) => Arc::new(HttpSource::new(url.clone())),
        }
    }
}

/// Fetches every chapter's data file once. Chapters whose file cannot be
/// loaded come back empty.
pub async fn load_chapter_data(
    catalog: &StoryCatalog,
    source: Arc<dyn DataSource>,
    retry: RetryPolicy,
) -> Vec<(ChapterId, Arc<FeatureCollection>)> {
    let described = source.describe();
    let provider = ChapterDataProvider::for_story(catalog, source, retry, DEFAULT_CACHE_BYTES);
    let data = provider.prefetch_all().await;
    info!(
        "prefetched {} chapter data sets from {described} ({} cached)",
        data.len(),
        provider.cached_chapters()
    );
    data
}
