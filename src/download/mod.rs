//! Source retrieval
//!
//! Fetches a document over HTTP(S) into a request workspace. The local name
//! comes from the last URL path segment, sanitized. No content-type check is
//! made; whatever arrives is handed to the PDF layer as-is.

use std::path::{Path, PathBuf};

use crate::storage::{sanitize_filename, StorageError, FALLBACK_FILENAME};

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Error downloading file from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A source saved to disk
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub path: PathBuf,
    /// Sanitized name derived from the URL
    pub filename: String,
}

/// HTTP file fetcher
#[derive(Clone, Default)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Download `url` into `dir`, storing it as `<role>_<filename>`
    pub async fn fetch(&self, url: &str, dir: &Path, role: &str) -> Result<DownloadedFile, DownloadError> {
        let fetch_error = |reason: String| DownloadError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| fetch_error(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let filename = filename_from_url(url);
        let path = dir.join(format!("{}_{}", role, filename));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!("Downloaded {} ({} bytes) to {}", url, bytes.len(), path.display());

        Ok(DownloadedFile { path, filename })
    }
}

/// Sanitized last path segment of `url`, ignoring query and fragment
pub fn filename_from_url(url: &str) -> String {
    let segment = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url.rsplit('/').next().unwrap_or_default().to_string(),
    };

    sanitize_filename(&segment).unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
