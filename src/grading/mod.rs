//! Grading
//!
//! Compares extracted student text against markscheme text and lays out the
//! pass/fail glyphs that the PDF annotator stamps onto each student page.

mod comparator;
mod marks;

pub use comparator::answer_matches;
pub use marks::{
    plan_marks, AnnotationMark, Glyph, MARK_COLOR, MARK_FONT_SIZE, MARK_STEP, MARK_TOP, MARK_X,
};
