// File: src/model/text.rs
//! Input cleanup and the folded, offset-aligned mirror the matchers run on.
//!
//! Every matcher searches `WorkingText::normalized()`, but titles and places
//! are read back out of `WorkingText::original()`. Folding maps each input
//! character to exactly one output character, so the two strings always have
//! the same number of characters. Byte lengths can still differ ("é" is two
//! bytes, "e" is one), which is why spans are translated through an explicit
//! boundary table instead of being reused as-is.
use unicode_normalization::char::{decompose_canonical, is_combining_mark};

/// Half-open `[start, end)` byte range into the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl From<regex::Match<'_>> for Span {
    fn from(m: regex::Match<'_>) -> Self {
        Self::new(m.start(), m.end())
    }
}

#[derive(Debug, Clone)]
pub struct WorkingText {
    original: String,
    normalized: String,
    /// (normalized byte offset, original byte offset) for every character
    /// boundary, including the end of both strings.
    boundaries: Vec<(usize, usize)>,
}

impl WorkingText {
    pub fn new(raw: &str) -> Self {
        let original = clean_sentence(raw);
        let mut normalized = String::with_capacity(original.len());
        let mut boundaries = Vec::with_capacity(original.len() + 1);

        for (orig_idx, c) in original.char_indices() {
            boundaries.push((normalized.len(), orig_idx));
            normalized.push(fold_char(c));
        }
        boundaries.push((normalized.len(), original.len()));

        Self {
            original,
            normalized,
            boundaries,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Translates a normalized byte offset to the matching original offset.
    /// Offsets that fall inside a character snap back to its start.
    pub fn to_original(&self, normalized_offset: usize) -> usize {
        let idx = self
            .boundaries
            .partition_point(|(n, _)| *n <= normalized_offset);
        if idx == 0 {
            0
        } else {
            self.boundaries[idx - 1].1
        }
    }

    pub fn original_slice(&self, span: Span) -> &str {
        let start = self.to_original(span.start);
        let end = self.to_original(span.end);
        &self.original[start..end]
    }

    pub fn normalized_slice(&self, span: Span) -> &str {
        &self.normalized[span.start..span.end]
    }

    /// Normalized text with the given spans blanked out by spaces.
    /// Byte length is unchanged so offsets found in the copy stay valid.
    pub fn masked(&self, spans: &[Span]) -> String {
        let mut bytes = self.normalized.clone().into_bytes();
        for span in spans {
            for b in &mut bytes[span.start..span.end] {
                *b = b' ';
            }
        }
        // Spans come from matches on `normalized`, so they start and end on
        // char boundaries and the whole range is replaced.
        String::from_utf8(bytes).unwrap_or_else(|_| self.normalized.clone())
    }
}

/// Drops `!`, `?` and ellipses, collapses whitespace and trims.
pub fn clean_sentence(raw: &str) -> String {
    let mut without_marks = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '!' | '?' | '…' => without_marks.push(' '),
            '.' if chars.peek() == Some(&'.') => {
                while chars.peek() == Some(&'.') {
                    chars.next();
                }
                without_marks.push(' ');
            }
            _ => without_marks.push(c),
        }
    }
    without_marks.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cases and strips diacritics from a single character, always
/// returning exactly one character.
pub fn fold_char(c: char) -> char {
    let base = match c {
        'đ' | 'Đ' => 'd',
        'ł' | 'Ł' => 'l',
        'ø' | 'Ø' => 'o',
        '’' | '‘' | 'ʼ' => '\'',
        '“' | '”' => '"',
        _ => {
            let mut first = None;
            decompose_canonical(c, |d| {
                if first.is_none() && !is_combining_mark(d) {
                    first = Some(d);
                }
            });
            first.unwrap_or(c)
        }
    };

    let mut lower = base.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        // Multi-char lowercase forms would break alignment.
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_sentence_strips_marks() {
        assert_eq!(clean_sentence("  Call   mom!! now?? "), "Call mom now");
        assert_eq!(clean_sentence("Wait… what... ok."), "Wait what ok.");
        assert_eq!(clean_sentence("Dr. Smith"), "Dr. Smith");
    }

    #[test]
    fn test_fold_is_char_aligned() {
        let text = WorkingText::new("Họp ở Café Đà Lạt");
        assert_eq!(text.normalized(), "hop o cafe da lat");
        assert_eq!(
            text.original().chars().count(),
            text.normalized().chars().count()
        );
    }

    #[test]
    fn test_span_translation_across_multibyte_chars() {
        let text = WorkingText::new("Café at Ümlaut Straße");
        let norm = text.normalized();
        let start = norm.find("umlaut").unwrap();
        let span = Span::new(start, start + "umlaut".len());
        assert_eq!(text.original_slice(span), "Ümlaut");
    }

    #[test]
    fn test_masked_preserves_length() {
        let text = WorkingText::new("Lunch at café tomorrow");
        let norm = text.normalized();
        let start = norm.find("cafe").unwrap();
        let masked = text.masked(&[Span::new(start, start + 4)]);
        assert_eq!(masked.len(), norm.len());
        assert_eq!(masked, format!("lunch at {} tomorrow", " ".repeat(4)));
    }

    #[test]
    fn test_curly_apostrophe_folds() {
        let text = WorkingText::new("Let’s go");
        assert_eq!(text.normalized(), "let's go");
    }
}
