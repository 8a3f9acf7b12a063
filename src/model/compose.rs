// File: src/model/compose.rs
//! Rebuilds the title from whatever text no matcher consumed.
use crate::model::text::{Span, WorkingText};
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_CONNECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:at|in|on|located|to)\s+").expect("leading connective"));
static TRAILING_CONNECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:at|in|on|located|to)$").expect("trailing connective"));

fn is_edge_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':')
}

/// Joins the gaps between consumed spans, in original order.
///
/// Spans are sorted by start; overlapping or nested spans fold into the
/// running end offset, so they never produce fragments.
pub fn compose_leftover(text: &WorkingText, spans: &[Span]) -> String {
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|s| s.start);

    let original = text.original();
    let mut fragments = Vec::new();
    let mut last = 0;

    for span in sorted {
        let start = text.to_original(span.start);
        let end = text.to_original(span.end);
        if start > last {
            push_fragment(&mut fragments, &original[last..start]);
        }
        last = last.max(end);
    }
    if last < original.len() {
        push_fragment(&mut fragments, &original[last..]);
    }

    fragments.join(" ")
}

fn push_fragment<'a>(fragments: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim_matches(is_edge_noise);
    if !trimmed.is_empty() {
        fragments.push(trimmed);
    }
}

/// Final title cleanup. `None` means nothing meaningful was left.
pub fn assemble_title(leftover: &str) -> Option<String> {
    let mut title = leftover
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    loop {
        let before = title.len();
        title = title.trim_matches(is_edge_noise).to_string();
        title = LEADING_CONNECTIVE.replace(&title, "").into_owned();
        title = TRAILING_CONNECTIVE.replace(&title, "").into_owned();
        if title.len() == before {
            break;
        }
    }

    let title = title.trim_matches(is_edge_noise);
    if title.is_empty() || is_lone_connective(title) {
        None
    } else {
        Some(title.to_string())
    }
}

fn is_lone_connective(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "at" | "in" | "on" | "located" | "to"
    )
}
