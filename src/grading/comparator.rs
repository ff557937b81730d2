//! Answer comparison
//!
//! A markscheme entry counts as answered when its trimmed, lower-cased text
//! appears anywhere in the lower-cased student page text. There is no
//! tokenization or fuzzy tolerance: short entries over-match and OCR noise
//! under-matches, and grading outcomes depend on keeping it that way.

/// Decide whether `markscheme_entry` is present in `student_text`.
///
/// An entry that is empty after trimming always matches.
pub fn answer_matches(markscheme_entry: &str, student_text: &str) -> bool {
    let needle = markscheme_entry.trim().to_lowercase();
    student_text.to_lowercase().contains(&needle)
}
