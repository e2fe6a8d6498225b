//! Payload fetcher: http(s) via reqwest, everything else from disk

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use private_metadata::{FetchCollaborator, FetchFailed};

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

pub struct UriFetcher {
    http: reqwest::Client,
}

impl UriFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { http })
    }

    async fn fetch_http(&self, uri: &str) -> Result<Vec<u8>, FetchFailed> {
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchFailed::new(uri, e))?;

        let bytes = response.bytes().await.map_err(|e| FetchFailed::new(uri, e))?;
        Ok(bytes.to_vec())
    }
}

enum Location {
    Http,
    File(PathBuf),
}

fn classify(uri: &str) -> Location {
    if uri.starts_with("https://") || uri.starts_with("http://") {
        Location::Http
    } else if let Some(path) = uri.strip_prefix("file://") {
        Location::File(PathBuf::from(path))
    } else {
        Location::File(PathBuf::from(uri))
    }
}

#[async_trait]
impl FetchCollaborator for UriFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchFailed> {
        debug!(uri, "fetching encrypted payload");
        match classify(uri) {
            Location::Http => self.fetch_http(uri).await,
            Location::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| FetchFailed::new(uri, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classify() {
        assert!(matches!(classify("https://arweave.net/abc"), Location::Http));
        assert!(matches!(classify("http://localhost:8080/x"), Location::Http));
        match classify("file:///tmp/a.enc") {
            Location::File(path) => assert_eq!(path, PathBuf::from("/tmp/a.enc")),
            Location::Http => panic!("file uri classified as http"),
        }
        assert!(matches!(classify("assets/a.enc"), Location::File(_)));
    }

    #[tokio::test]
    async fn test_fetch_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.enc");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let fetcher = UriFetcher::new().unwrap();
        let uri = format!("file://{}", path.display());
        assert_eq!(fetcher.fetch(&uri).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(fetcher.fetch(&path.display().to_string()).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_failure() {
        let dir = tempdir().unwrap();
        let uri = dir.path().join("missing.enc").display().to_string();

        let err = UriFetcher::new().unwrap().fetch(&uri).await.unwrap_err();
        assert_eq!(err.target, uri);
    }
}
