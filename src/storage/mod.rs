//! Local disk storage
//!
//! Two directories: uploads (downloaded sources) and results (annotated
//! outputs). Every request works inside its own upload subdirectory named by
//! a fresh UUID, and result files carry the same UUID in their name, so
//! concurrent requests for identically named sources never collide.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::StorageConfig;

/// Name used when sanitizing leaves nothing behind
pub const FALLBACK_FILENAME: &str = "document.pdf";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Upload and result directories
#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    result_dir: PathBuf,
    keep_uploads: bool,
}

impl Storage {
    /// Create both directories if absent
    pub fn init(config: &StorageConfig) -> Result<Self, StorageError> {
        for dir in [&config.upload_dir, &config.result_dir] {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
        }

        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            result_dir: config.result_dir.clone(),
            keep_uploads: config.keep_uploads,
        })
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Open a fresh per-request upload directory
    pub async fn begin_request(&self) -> Result<RequestWorkspace, StorageError> {
        let id = Uuid::new_v4();
        let dir = self.upload_dir.join(id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;

        Ok(RequestWorkspace {
            id,
            dir,
            remove_pending: !self.keep_uploads,
        })
    }

    /// Where a result with this name lives
    pub fn result_path(&self, filename: &str) -> PathBuf {
        self.result_dir.join(filename)
    }

    /// Locate an existing result file by client-supplied name
    ///
    /// Names that would change under sanitization (path separators, dot
    /// segments, unusual characters) are never resolved.
    pub async fn find_result(&self, filename: &str) -> Option<PathBuf> {
        if sanitize_filename(filename).as_deref() != Some(filename) {
            return None;
        }
        let path = self.result_dir.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            _ => None,
        }
    }
}

/// Upload directory owned by one request
///
/// Removed by [`RequestWorkspace::close`], or in the background when dropped
/// without being closed (e.g. the request future was cancelled).
#[derive(Debug)]
pub struct RequestWorkspace {
    id: Uuid,
    dir: PathBuf,
    /// False once removed, or from the start when uploads are kept
    remove_pending: bool,
}

impl RequestWorkspace {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the directory and everything downloaded into it
    pub async fn close(mut self) {
        if !self.remove_pending {
            return;
        }
        self.remove_pending = false;
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            tracing::warn!("Failed to remove upload directory {}: {}", self.dir.display(), e);
        }
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        if !self.remove_pending {
            return;
        }
        let dir = std::mem::take(&mut self.dir);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_workspace_dir(&dir));
            }
            Err(_) => remove_workspace_dir(&dir),
        }
    }
}

fn remove_workspace_dir(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        tracing::warn!("Failed to remove upload directory {}: {}", dir.display(), e);
    }
}

/// Reduce an arbitrary name to a safe single path component
///
/// Non-ASCII characters are dropped, path separators become spaces,
/// whitespace runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed and leading/trailing `.`/`_` are trimmed. Returns `None` when
/// nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(root: &Path, keep_uploads: bool) -> Storage {
        Storage::init(&StorageConfig {
            upload_dir: root.join("uploads"),
            result_dir: root.join("results"),
            keep_uploads,
        })
        .unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My cool movie.mov").as_deref(), Some("My_cool_movie.mov"));
        assert_eq!(sanitize_filename("../../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(sanitize_filename("paper (final).pdf").as_deref(), Some("paper_final.pdf"));
        assert_eq!(sanitize_filename("résumé.pdf").as_deref(), Some("rsum.pdf"));
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn test_init_creates_directories() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false);

        assert!(root.path().join("uploads").is_dir());
        assert!(storage.result_dir().is_dir());
    }

    #[tokio::test]
    async fn test_workspaces_are_isolated_and_cleaned_up() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false);

        let first = storage.begin_request().await.unwrap();
        let second = storage.begin_request().await.unwrap();
        assert_ne!(first.id(), second.id());
        assert_ne!(first.dir(), second.dir());

        let dir = first.dir().to_path_buf();
        std::fs::write(dir.join("student_paper.pdf"), b"%PDF").unwrap();
        first.close().await;

        assert!(!dir.exists());
        assert!(second.dir().exists());
    }

    #[tokio::test]
    async fn test_dropped_workspace_is_removed_in_background() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false);

        let workspace = storage.begin_request().await.unwrap();
        let dir = workspace.dir().to_path_buf();
        std::fs::write(dir.join("student_paper.pdf"), b"%PDF").unwrap();
        drop(workspace);

        for _ in 0..200 {
            if !dir.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_dropped_workspace_outside_runtime_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let workspace = runtime.block_on(storage.begin_request()).unwrap();
        let dir = workspace.dir().to_path_buf();
        drop(runtime);
        drop(workspace);

        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_keep_uploads() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), true);

        let workspace = storage.begin_request().await.unwrap();
        let dir = workspace.dir().to_path_buf();
        workspace.close().await;

        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_find_result_rejects_traversal() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false);
        std::fs::write(storage.result_path("checked_a.pdf"), b"%PDF").unwrap();
        std::fs::write(root.path().join("secret.txt"), b"secret").unwrap();
        std::fs::create_dir(storage.result_path("checked_dir.pdf")).unwrap();

        assert!(storage.find_result("checked_a.pdf").await.is_some());
        assert!(storage.find_result("missing.pdf").await.is_none());
        assert!(storage.find_result("../secret.txt").await.is_none());
        assert!(storage.find_result("checked_dir.pdf").await.is_none());
    }
}
