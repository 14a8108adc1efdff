//! Where chapter data files come from.
//!
//! - Filesystem (paths relative to a data root)
//! - Remote HTTP (paths relative to a base URL)

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Error type for data source operations.
#[derive(Debug)]
pub struct DataSourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DataSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl DataSourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A place chapter data files can be read from.
///
/// Methods return boxed futures so sources can be used as trait objects.
pub trait DataSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Reads the raw bytes stored under `path`.
    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, DataSourceError>>;
}

/// Reads chapter data relative to a local directory.
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for FilesystemSource {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, DataSourceError>> {
        let full = self.root.join(path.trim_start_matches('/'));
        Box::pin(async move {
            tokio::fs::read(&full)
                .await
                .map_err(|e| DataSourceError::with_source(format!("read {full:?}"), e))
        })
    }
}

/// Fetches chapter data relative to a base URL.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, DataSourceError>> {
        let url = self.url_for(path);
        Box::pin(async move {
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| DataSourceError::with_source("HTTP request failed", e))?;

            if !resp.status().is_success() {
                return Err(DataSourceError::new(format!(
                    "HTTP error: {} for {url}",
                    resp.status()
                )));
            }

            resp.bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| DataSourceError::with_source("HTTP body read failed", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSource, FilesystemSource, HttpSource};

    #[test]
    fn http_urls_join_cleanly() {
        let src = HttpSource::new("https://example.org/data/");
        assert_eq!(
            src.url_for("/ch2/track.geojson"),
            "https://example.org/data/ch2/track.geojson"
        );
    }

    #[tokio::test]
    async fn filesystem_source_reads_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("jan.geojson"), b"{}").expect("write");

        let src = FilesystemSource::new(dir.path());
        let bytes = src.fetch("/jan.geojson").await.expect("read");
        assert_eq!(bytes, b"{}");
        assert!(src.fetch("missing.geojson").await.is_err());
    }
}
