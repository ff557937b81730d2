//! Page rasterization
//!
//! Renders every page of a PDF to a PNG image for OCR. Rendering runs at a
//! fixed resolution; callers cannot pick a DPI.

use std::io::Cursor;
use std::path::Path;

use mupdf::{Colorspace, Document, Matrix};

use super::error::{DocumentError, DocumentResult};

/// Resolution pages are rendered at before OCR
pub const RENDER_DPI: f32 = 200.0;

/// PDF user space unit is 1/72 inch
const POINTS_PER_INCH: f32 = 72.0;

/// A rendered page
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based page index
    pub index: usize,
    /// PNG-encoded pixels
    pub png: Vec<u8>,
}

/// Turns a PDF file into one image per page, in page order
///
/// Implementations are blocking and are expected to be driven from
/// `tokio::task::spawn_blocking`.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, path: &Path) -> DocumentResult<Vec<PageImage>>;
}

/// MuPDF-backed rasterizer
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfRasterizer;

impl MupdfRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for MupdfRasterizer {
    fn rasterize(&self, path: &Path) -> DocumentResult<Vec<PageImage>> {
        let path_str = path.to_string_lossy();
        let read_error = |reason: String| DocumentError::Read {
            path: path_str.to_string(),
            reason,
        };

        let doc = Document::open(&*path_str).map_err(|e| read_error(e.to_string()))?;
        let page_count = doc.page_count().map_err(|e| read_error(e.to_string()))?;

        let scale = RENDER_DPI / POINTS_PER_INCH;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        let mut pages = Vec::with_capacity(page_count.max(0) as usize);
        for index in 0..page_count {
            let render_error = |reason: String| DocumentError::Render {
                page: index as usize,
                reason,
            };

            let page = doc
                .load_page(index)
                .map_err(|e| render_error(e.to_string()))?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, true)
                .map_err(|e| render_error(e.to_string()))?;

            pages.push(PageImage {
                index: index as usize,
                png: encode_png(&pixmap)?,
            });
        }

        tracing::debug!("Rendered {} pages from {}", pages.len(), path_str);
        Ok(pages)
    }
}

/// Encode a MuPDF pixmap as PNG
fn encode_png(pixmap: &mupdf::Pixmap) -> DocumentResult<Vec<u8>> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in 0..(width as usize * height as usize) {
        let offset = pixel * n;
        if n >= 3 {
            rgb.push(samples.get(offset).copied().unwrap_or(255));
            rgb.push(samples.get(offset + 1).copied().unwrap_or(255));
            rgb.push(samples.get(offset + 2).copied().unwrap_or(255));
        } else {
            // Gray
            let v = samples.get(offset).copied().unwrap_or(255);
            rgb.extend_from_slice(&[v, v, v]);
        }
    }

    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| DocumentError::Image("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| DocumentError::Image(e.to_string()))?;

    Ok(output)
}
