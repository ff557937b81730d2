//! OCR Types

use serde::{Deserialize, Serialize};

/// OCR backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract CLI (local)
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

impl Default for OcrProvider {
    fn default() -> Self {
        Self::Tesseract
    }
}

/// What to do when a single page fails OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrPageFailure {
    /// Record the page as empty text and keep going
    Empty,
    /// Fail the whole extraction
    Fail,
}

impl Default for OcrPageFailure {
    fn default() -> Self {
        Self::Empty
    }
}

/// Text recognized from one image
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    pub text: String,
    pub provider: OcrProvider,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),
}
