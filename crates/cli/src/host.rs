//! Host operations backed by the local filesystem and HTTP.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use convertease_core::{FileSelector, HostError, ResultDownloader, SelectedFile};

/// Serves paths given on the command line, at most `max` per pick.
///
/// Once every path has been handed out the picker reports a dismissal.
pub struct PathFileSelector {
    remaining: Mutex<VecDeque<PathBuf>>,
}

impl PathFileSelector {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            remaining: Mutex::new(paths.into()),
        }
    }

    pub async fn is_exhausted(&self) -> bool {
        self.remaining.lock().await.is_empty()
    }
}

#[async_trait]
impl FileSelector for PathFileSelector {
    async fn choose_files(
        &self,
        allowed_extensions: &[String],
        max: usize,
    ) -> Result<Vec<SelectedFile>, HostError> {
        let mut remaining = self.remaining.lock().await;
        if remaining.is_empty() {
            return Err(HostError::Cancelled);
        }

        debug!(allowed = ?allowed_extensions, max, "Picking files");
        let take = max.min(remaining.len());
        let mut files = Vec::with_capacity(take);
        for path in remaining.drain(..take) {
            let metadata = tokio::fs::metadata(&path).await?;
            if !metadata.is_file() {
                return Err(HostError::Failed(format!(
                    "{} is not a regular file",
                    path.display()
                )));
            }
            files.push(SelectedFile::from_path(&path, metadata.len()));
        }
        Ok(files)
    }
}

/// Last path segment of a URL, without query or fragment.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Downloads results into a directory.
pub struct HttpDownloader {
    client: reqwest::Client,
    dir: PathBuf,
}

impl HttpDownloader {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            dir: dir.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ResultDownloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<PathBuf, HostError> {
        let name = file_name_from_url(url)
            .ok_or_else(|| HostError::Failed(format!("no file name in {url}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HostError::Failed(format!("download failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::Failed(format!(
                "download failed with status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HostError::Failed(format!("failed to read download: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, &bytes).await?;

        info!(url = %url, path = %path.display(), size = bytes.len(), "Saved result");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://convertease.site/public/a.docx"),
            Some("a.docx")
        );
        assert_eq!(
            file_name_from_url("https://convertease.site/public/a.mp3?token=1#x"),
            Some("a.mp3")
        );
        assert_eq!(file_name_from_url("https://convertease.site/public/"), None);
    }

    #[tokio::test]
    async fn test_selector_pages_paths() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"data").unwrap();
            paths.push(path);
        }
        let selector = PathFileSelector::new(paths);

        let first = selector.choose_files(&[], 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "a.pdf");
        assert_eq!(first[0].size, 4);

        let second = selector.choose_files(&[], 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(selector.is_exhausted().await);
        assert!(matches!(
            selector.choose_files(&[], 2).await,
            Err(HostError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_selector_missing_file() {
        let selector = PathFileSelector::new(vec![PathBuf::from("/nonexistent/a.pdf")]);
        let result = selector.choose_files(&[], 9).await;
        assert!(matches!(result, Err(HostError::Io(_))));
    }

    #[tokio::test]
    async fn test_downloader_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/out.docx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"converted".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader =
            HttpDownloader::new(dir.path().join("results"), Duration::from_secs(5)).unwrap();

        let path = downloader
            .download(&format!("{}/public/out.docx", server.uri()))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("results").join("out.docx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"converted");
    }

    #[tokio::test]
    async fn test_downloader_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/gone.mp3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = HttpDownloader::new(dir.path(), Duration::from_secs(5)).unwrap();
        let result = downloader
            .download(&format!("{}/public/gone.mp3", server.uri()))
            .await;
        assert!(matches!(result, Err(HostError::Failed(_))));
    }
}
