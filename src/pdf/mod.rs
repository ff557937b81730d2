//! PDF handling
//!
//! - `render`: MuPDF page rasterization feeding OCR
//! - `annotate`: lopdf-based glyph stamping onto the student document

mod annotate;
mod error;
mod render;

pub use annotate::{annotate_pdf, AnnotationSummary};
pub use error::{DocumentError, DocumentResult};
pub use render::{MupdfRasterizer, PageImage, PageRasterizer, RENDER_DPI};
