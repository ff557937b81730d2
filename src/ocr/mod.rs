//! OCR Module
//!
//! Turns PDF pages into text. Pages are rasterized with MuPDF and handed to
//! an OCR backend:
//! - Tesseract (local CLI, default)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use markcheck_server::ocr::{build_provider, TextExtractor, OcrPageFailure};
//! use markcheck_server::pdf::MupdfRasterizer;
//!
//! let extractor = TextExtractor::new(
//!     Arc::new(MupdfRasterizer::new()),
//!     build_provider(&config.ocr),
//!     OcrPageFailure::Empty,
//! );
//! let text = extractor.extract(Path::new("uploads/student.pdf")).await?;
//! ```

mod extractor;
mod provider;
mod types;

pub use extractor::{ExtractError, ExtractedText, TextExtractor};
pub use provider::{build_provider, OcrProviderTrait, OllamaProvider, TesseractProvider};
pub use types::{OcrError, OcrPageFailure, OcrProvider, OcrResult};
