//! Glyph layout
//!
//! Turns the two extracted text sequences into the list of marks to stamp.
//! Positions use top-left page coordinates with y growing downward.

use serde::Serialize;

use super::comparator::answer_matches;

/// Horizontal position of every glyph
pub const MARK_X: f32 = 50.0;
/// Vertical position of the first glyph on a page
pub const MARK_TOP: f32 = 50.0;
/// Vertical distance between successive glyphs on the same page
pub const MARK_STEP: f32 = 25.0;
/// Glyph font size in points
pub const MARK_FONT_SIZE: f32 = 20.0;
/// Glyph fill colour (RGB, 0-1)
pub const MARK_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Pass/fail symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Glyph {
    Pass,
    Fail,
}

impl Glyph {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Glyph::Pass
        } else {
            Glyph::Fail
        }
    }

    /// The Unicode symbol this glyph stands for
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Pass => "✔",
            Glyph::Fail => "✖",
        }
    }

    /// Character code of the symbol in the standard ZapfDingbats font
    pub fn dingbat_code(self) -> u8 {
        match self {
            Glyph::Pass => b'4',
            Glyph::Fail => b'6',
        }
    }
}

/// A single glyph to stamp onto a student page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnotationMark {
    /// 0-based student page index
    pub page: usize,
    /// Index of the markscheme entry this mark grades
    pub entry: usize,
    pub glyph: Glyph,
    pub x: f32,
    pub y: f32,
}

/// Lay out one mark per markscheme entry on every student page that has
/// extracted text, in page order then markscheme order.
pub fn plan_marks(student_pages: &[String], markscheme_entries: &[String]) -> Vec<AnnotationMark> {
    let mut marks = Vec::with_capacity(student_pages.len() * markscheme_entries.len());

    for (page, text) in student_pages.iter().enumerate() {
        let mut y = MARK_TOP;
        for (entry, answer) in markscheme_entries.iter().enumerate() {
            marks.push(AnnotationMark {
                page,
                entry,
                glyph: Glyph::from_match(answer_matches(answer, text)),
                x: MARK_X,
                y,
            });
            y += MARK_STEP;
        }
    }

    marks
}
