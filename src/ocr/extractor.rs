//! Text extraction
//!
//! Renders a PDF's pages and OCRs them one after another, producing one
//! string per page in page order.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::provider::OcrProviderTrait;
use super::types::{OcrError, OcrPageFailure};
use crate::pdf::{DocumentError, PageRasterizer};

/// OCR output for a whole document; `pages[i]` is the text of page `i`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("OCR failed on page {page}: {source}")]
    Ocr {
        page: usize,
        #[source]
        source: OcrError,
    },
}

/// Rasterizer + OCR provider pair
#[derive(Clone)]
pub struct TextExtractor {
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrProviderTrait>,
    on_page_failure: OcrPageFailure,
}

impl TextExtractor {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        ocr: Arc<dyn OcrProviderTrait>,
        on_page_failure: OcrPageFailure,
    ) -> Self {
        Self {
            rasterizer,
            ocr,
            on_page_failure,
        }
    }

    pub fn ocr(&self) -> &Arc<dyn OcrProviderTrait> {
        &self.ocr
    }

    /// Extract per-page text from the PDF at `path`
    pub async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let owned_path = path.to_path_buf();

        // MuPDF is CPU-bound and blocking
        let images = tokio::task::spawn_blocking(move || rasterizer.rasterize(&owned_path))
            .await
            .map_err(|e| DocumentError::Join(e.to_string()))??;

        let mut pages = Vec::with_capacity(images.len());
        for image in images {
            match self.ocr.recognize(&image.png).await {
                Ok(result) => {
                    tracing::debug!(
                        "OCR page {} of {}: {} chars",
                        image.index,
                        path.display(),
                        result.text.len()
                    );
                    pages.push(result.text);
                }
                Err(e) => match self.on_page_failure {
                    OcrPageFailure::Empty => {
                        tracing::warn!(
                            "OCR failed on page {} of {}: {}, treating page as empty",
                            image.index,
                            path.display(),
                            e
                        );
                        pages.push(String::new());
                    }
                    OcrPageFailure::Fail => {
                        return Err(ExtractError::Ocr {
                            page: image.index,
                            source: e,
                        });
                    }
                },
            }
        }

        Ok(ExtractedText { pages })
    }
}
