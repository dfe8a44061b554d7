//! Source byte retrieval. The worker treats every failure here as an
//! analysis failure for the job being processed.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("access denied to {0}")]
    AccessDenied(String),

    #[error("source not found: {0}")]
    NotFound(String),

    #[error("fetch failed for {locator}: {reason}")]
    Other { locator: String, reason: String },
}

/// Resolves a source locator to the bytes to analyze.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Bytes, FetchError>;
}

/// Fetches http(s) locators.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: reqwest::Client,
}

impl Default for HttpSourceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSourceFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, locator: &str) -> Result<Bytes, FetchError> {
        let response =
            self.client
                .get(locator)
                .send()
                .await
                .map_err(|err| FetchError::Other {
                    locator: locator.to_string(),
                    reason: err.to_string(),
                })?;

        match response.status() {
            status if status.is_success() => {
                response.bytes().await.map_err(|err| FetchError::Other {
                    locator: locator.to_string(),
                    reason: err.to_string(),
                })
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(FetchError::AccessDenied(locator.to_string()))
            }
            reqwest::StatusCode::NOT_FOUND => Err(FetchError::NotFound(locator.to_string())),
            status => Err(FetchError::Other {
                locator: locator.to_string(),
                reason: format!("unexpected status {status}"),
            }),
        }
    }
}

/// Reads local paths, optionally resolved against a root directory.
/// Accepts both bare paths and `file://` locators.
#[derive(Debug, Clone, Default)]
pub struct FileSourceFetcher {
    root: Option<PathBuf>,
}

impl FileSourceFetcher {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

#[async_trait]
impl SourceFetcher for FileSourceFetcher {
    async fn fetch(&self, locator: &str) -> Result<Bytes, FetchError> {
        let path = self.resolve(locator);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(locator.to_string()))
            }
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(FetchError::AccessDenied(locator.to_string()))
            }
            Err(err) => Err(FetchError::Other {
                locator: locator.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_fetcher_reads_local_bytes() {
        let dir = std::env::temp_dir().join(format!("probex-fetch-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("sample.bin");
        tokio::fs::write(&path, b"payload").await.unwrap();

        let fetcher = FileSourceFetcher::new(None);
        let bytes = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(&bytes[..], b"payload");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn file_fetcher_missing_path_is_not_found() {
        let fetcher = FileSourceFetcher::new(None);
        let err = fetcher.fetch("/nonexistent/probex/file.bin").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn file_locator_prefix_is_stripped() {
        let fetcher = FileSourceFetcher::new(None);
        assert_eq!(
            fetcher.resolve("file:///media/in.mxf"),
            PathBuf::from("/media/in.mxf")
        );
        assert_eq!(fetcher.resolve("/media/in.mxf"), PathBuf::from("/media/in.mxf"));
    }

    #[test]
    fn rooted_resolution_joins_under_root() {
        let fetcher = FileSourceFetcher::new(Some(PathBuf::from("/srv/media")));
        assert_eq!(
            fetcher.resolve("file:///incoming/in.mxf"),
            PathBuf::from("/srv/media/incoming/in.mxf")
        );
    }
}
