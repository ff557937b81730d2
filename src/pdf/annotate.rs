//! Glyph stamping
//!
//! Re-opens the student PDF, appends a content stream per page that draws
//! the planned pass/fail glyphs, and writes the result atomically.
//!
//! Marks are positioned in top-left coordinates (see `grading::marks`) and
//! converted against each page's visible area: the CropBox when present,
//! the MediaBox otherwise. Existing page content is wrapped
//! in `q`/`Q` so its graphics state cannot leak into the stamped glyphs.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::Serialize;

use super::error::{DocumentError, DocumentResult};
use crate::grading::{plan_marks, AnnotationMark, MARK_COLOR, MARK_FONT_SIZE};

/// Resource name the glyph font is registered under on each page
const GLYPH_FONT: &str = "MkZaDb";

/// Guards against cyclic page trees
const MAX_TREE_DEPTH: usize = 32;

/// US Letter, used when a page carries no usable box anywhere in its tree
const FALLBACK_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Outcome of stamping a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationSummary {
    /// Pages in the student document
    pub page_count: usize,
    /// Pages that received at least one glyph
    pub pages_annotated: usize,
    /// Glyphs written
    pub marks_written: usize,
    /// Glyphs dropped because their page is beyond the document
    pub marks_skipped: usize,
}

/// Grade `student_pages` against `markscheme_entries` and stamp the result
/// onto a copy of `source`, written to `output`.
///
/// Only pages with extracted text are annotated; any remaining pages are
/// copied untouched.
pub fn annotate_pdf(
    source: &Path,
    student_pages: &[String],
    markscheme_entries: &[String],
    output: &Path,
) -> DocumentResult<AnnotationSummary> {
    let marks = plan_marks(student_pages, markscheme_entries);
    stamp_marks(source, &marks, output)
}

/// Stamp already planned marks onto a copy of `source`
fn stamp_marks(
    source: &Path,
    marks: &[AnnotationMark],
    output: &Path,
) -> DocumentResult<AnnotationSummary> {
    let mut doc = Document::load(source).map_err(|e| DocumentError::Read {
        path: source.display().to_string(),
        reason: e.to_string(),
    })?;

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut summary = AnnotationSummary {
        page_count: pages.len(),
        ..Default::default()
    };

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "ZapfDingbats",
    });

    for (index, page_id) in pages.iter().copied().enumerate() {
        let page_marks: Vec<&AnnotationMark> = marks.iter().filter(|m| m.page == index).collect();
        if page_marks.is_empty() {
            continue;
        }

        let page_box = visible_box(&doc, page_id);
        register_font(&mut doc, page_id, font_id)?;
        let content = glyph_content(&page_marks, page_box)?;
        wrap_and_append_content(&mut doc, page_id, content)?;

        summary.pages_annotated += 1;
        summary.marks_written += page_marks.len();
    }

    summary.marks_skipped = marks.iter().filter(|m| m.page >= pages.len()).count();
    if summary.marks_skipped > 0 {
        tracing::debug!(
            "Skipped {} marks beyond the {}-page student document",
            summary.marks_skipped,
            pages.len()
        );
    }

    persist(&mut doc, output)?;
    Ok(summary)
}

/// Build the content stream drawing `marks` on a page whose visible area is
/// `page_box`
fn glyph_content(marks: &[&AnnotationMark], page_box: [f32; 4]) -> DocumentResult<Vec<u8>> {
    let [left, _, _, top] = page_box;
    let [r, g, b] = MARK_COLOR;

    let mut operations = Vec::with_capacity(marks.len() * 6);
    for mark in marks {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(GLYPH_FONT.as_bytes().to_vec()), Object::Real(MARK_FONT_SIZE)],
        ));
        operations.push(Operation::new(
            "rg",
            vec![Object::Real(r), Object::Real(g), Object::Real(b)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(left + mark.x), Object::Real(top - mark.y)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                vec![mark.glyph.dingbat_code()],
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    Ok(Content { operations }.encode()?)
}

/// Add the glyph font to the page's resources, materializing inherited or
/// shared resources into an inline dictionary on the page itself
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> DocumentResult<()> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };
    fonts.set(GLYPH_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Surround existing content with `q`/`Q` and append `content` after it
fn wrap_and_append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> DocumentResult<()> {
    let mut streams: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| DocumentError::Annotate(format!("Page {:?}: {}", page_id, e)))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut stamped = b"Q\n".to_vec();
    stamped.extend_from_slice(&content);
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamped));

    streams.insert(0, Object::Reference(save_id));
    streams.push(Object::Reference(stamp_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(streams));
    Ok(())
}

/// Write the document next to `output` and rename it into place
fn persist(doc: &mut Document, output: &Path) -> DocumentResult<()> {
    let persist_error = |source: std::io::Error| DocumentError::Persist {
        path: output.display().to_string(),
        source,
    };

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .map_err(persist_error)?;

    doc.save_to(tmp.as_file_mut())
        .map_err(|e| persist_error(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

    tmp.persist(output).map_err(|e| persist_error(e.error))?;
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> DocumentResult<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| DocumentError::Annotate(format!("Page {:?}: {}", page_id, e)))
}

/// Look up a page attribute, following `Parent` links for inherited values
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value).clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// The page area a viewer shows: CropBox, else MediaBox, else US Letter
fn visible_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    page_box(doc, page_id, b"CropBox")
        .or_else(|| page_box(doc, page_id, b"MediaBox"))
        .unwrap_or(FALLBACK_PAGE_BOX)
}

/// A normalized `[llx, lly, urx, ury]` rectangle stored under `key`
fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let values: Vec<f32> = match inherited(doc, page_id, key)? {
        Object::Array(items) => items
            .iter()
            .map(|item| number(resolve(doc, item)))
            .collect::<Option<_>>()?,
        _ => return None,
    };

    match values.as_slice() {
        [x0, y0, x1, y1] if x0 != x1 && y0 != y1 => {
            Some([x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)])
        }
        _ => None,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
