//! PDF error types

use thiserror::Error;

/// Errors raised while reading, rendering or rewriting a PDF
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document could not be opened or parsed
    #[error("Failed to read document {path}: {reason}")]
    Read { path: String, reason: String },

    /// A page could not be rendered to an image
    #[error("Failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    /// Rendered pixels could not be encoded
    #[error("Image error: {0}")]
    Image(String),

    /// The page tree or content streams could not be edited
    #[error("Failed to annotate document: {0}")]
    Annotate(String),

    /// The annotated document could not be written
    #[error("Failed to write annotated document to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Blocking worker panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}

impl DocumentError {
    /// True when the failure is about the output location rather than the input
    pub fn is_persistence(&self) -> bool {
        matches!(self, DocumentError::Persist { .. })
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::Annotate(err.to_string())
    }
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
