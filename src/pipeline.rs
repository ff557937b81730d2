//! Check pipeline
//!
//! download both sources → extract text from each → annotate the student
//! copy → result file. Runs sequentially within a request; any failure aborts
//! the request without leaving a partial result behind.

use serde::Serialize;

use crate::download::{DownloadError, Downloader};
use crate::ocr::{ExtractError, TextExtractor};
use crate::pdf::{annotate_pdf, AnnotationSummary, DocumentError};
use crate::storage::{RequestWorkspace, Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Completed check
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// Name of the annotated file inside the result directory
    pub output_filename: String,
    pub summary: AnnotationSummary,
}

#[derive(Clone)]
pub struct CheckPipeline {
    storage: Storage,
    downloader: Downloader,
    extractor: TextExtractor,
}

impl CheckPipeline {
    pub fn new(storage: Storage, downloader: Downloader, extractor: TextExtractor) -> Self {
        Self {
            storage,
            downloader,
            extractor,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Grade the student PDF at `student_url` against `markscheme_url`
    pub async fn run(&self, student_url: &str, markscheme_url: &str) -> Result<CheckOutcome, CheckError> {
        let workspace = self.storage.begin_request().await?;
        tracing::info!("Check {} started for {}", workspace.id(), student_url);

        let result = self.run_in(&workspace, student_url, markscheme_url).await;
        workspace.close().await;
        result
    }

    async fn run_in(
        &self,
        workspace: &RequestWorkspace,
        student_url: &str,
        markscheme_url: &str,
    ) -> Result<CheckOutcome, CheckError> {

        let student = self
            .downloader
            .fetch(student_url, workspace.dir(), "student")
            .await?;
        let markscheme = self
            .downloader
            .fetch(markscheme_url, workspace.dir(), "markscheme")
            .await?;

        let student_text = self.extractor.extract(&student.path).await?;
        let markscheme_text = self.extractor.extract(&markscheme.path).await?;
        tracing::debug!(
            "Check {}: {} student pages, {} markscheme entries",
            workspace.id(),
            student_text.len(),
            markscheme_text.len()
        );

        let output_filename = format!("checked_{}_{}", workspace.id(), student.filename);
        let source = student.path.clone();
        let target = self.storage.result_path(&output_filename);
        let summary = tokio::task::spawn_blocking(move || {
            annotate_pdf(&source, &student_text.pages, &markscheme_text.pages, &target)
        })
        .await
        .map_err(|e| DocumentError::Join(e.to_string()))??;

        tracing::info!(
            "Check {} completed: {} marks on {} of {} pages -> {}",
            workspace.id(),
            summary.marks_written,
            summary.pages_annotated,
            summary.page_count,
            output_filename
        );

        Ok(CheckOutcome {
            output_filename,
            summary,
        })
    }
}
