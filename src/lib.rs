//! Markcheck Server Library
//!
//! Grades a student PDF against a markscheme PDF: both are OCRed page by
//! page, every markscheme entry is looked for in every student page, and a
//! red ✔/✖ is stamped onto the student copy for each entry.
//!
//! # Modules
//!
//! - `grading`: comparison rule and glyph layout
//! - `ocr`: page OCR backends and per-document text extraction
//! - `pdf`: MuPDF rasterization and lopdf glyph stamping
//! - `pipeline`: download → extract → annotate orchestration
//! - `routes`: HTTP surface

pub mod config;
pub mod download;
pub mod error;
pub mod grading;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;
