// File: src/model/time.rs
//! Time phrase extraction and canonicalization.
//!
//! The cascade is an ordered list of patterns. The first pattern that matches
//! anywhere in the text wins, even if a later pattern would have matched a
//! longer phrase. The order is load-bearing: compound and combined phrases
//! must get first refusal before their bare sub-parts are tried.
use crate::model::text::Span;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const WEEKDAY: &str = r"(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)";
const DAY_PART: &str = r"(?:morning|noon|afternoon|evening)";
const RELATIVE_DAY: &str = r"(?:today|tomorrow|(?:the\s+)?day\s+after\s+tomorrow)";
// Leading "at"/"on" is part of the span so it leaves the title with the time.
const CONNECTIVE: &str = r"(?:\b(?:at|on)\s+)?";
// 10:30, 10h30, 10h5, 3:15 pm, 3pm
const CLOCK: &str = r"(?:\d{1,2}(?::|h)\d{1,2}(?:\s*(?:am|pm))?|\d{1,2}\s*(?:am|pm))";
// 10, 10:30, 10h, 10am, 10 o'clock
const HOUR: &str = r"\d{1,2}(?:(?::|h)\d{1,2})?(?:\s*(?:am|pm|h|o'?clock))?";
// Like HOUR, but a bare number does not count: "4 tomorrow" is a count.
const MARKED_HOUR: &str = r"\d{1,2}(?:(?::|h)\d{1,2}(?:\s*(?:am|pm))?|\s*(?:am|pm|h|o'?clock))";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePatternKind {
    HoursMinutes,
    ClockWeekday,
    HourDayPartRelative,
    Clock,
    DayPartRelative,
    Weekend,
    Weekday,
    HourOnly,
    RelativeDay,
}

struct TimePattern {
    kind: TimePatternKind,
    regex: Regex,
}

static TIME_PATTERNS: Lazy<Vec<TimePattern>> = Lazy::new(|| {
    let defs: Vec<(TimePatternKind, String)> = vec![
        (
            TimePatternKind::HoursMinutes,
            format!(r"{CONNECTIVE}\b\d{{1,2}}\s+hours?\s+\d{{1,2}}\s+minutes?\b"),
        ),
        (
            TimePatternKind::ClockWeekday,
            format!(
                r"{CONNECTIVE}\b(?:{CLOCK}\s+(?:on\s+)?(?:(?:this|next)\s+)?{WEEKDAY}|(?:(?:this|next)\s+)?{WEEKDAY}\s+(?:at\s+)?{CLOCK})\b"
            ),
        ),
        (
            TimePatternKind::HourDayPartRelative,
            format!(
                r"{CONNECTIVE}\b(?:{HOUR}\s+(?:in\s+the\s+)?{DAY_PART}\s+{RELATIVE_DAY}|{HOUR}\s+{RELATIVE_DAY}\s+(?:in\s+the\s+)?{DAY_PART}|{MARKED_HOUR}\s+{RELATIVE_DAY}|{RELATIVE_DAY}\s+{DAY_PART}\s+(?:at\s+)?{HOUR}|{RELATIVE_DAY}\s+(?:at\s+)?{MARKED_HOUR})\b"
            ),
        ),
        (
            TimePatternKind::Clock,
            format!(r"{CONNECTIVE}\b\d{{1,2}}(?::|h\s?)\d{{1,2}}\b(?:\s*(?:am|pm)\b)?"),
        ),
        (
            TimePatternKind::DayPartRelative,
            format!(
                r"{CONNECTIVE}\b(?:{DAY_PART}\s+{RELATIVE_DAY}|{RELATIVE_DAY}\s+(?:in\s+the\s+)?{DAY_PART}|this\s+{DAY_PART}|tonight)\b"
            ),
        ),
        (
            TimePatternKind::Weekend,
            format!(r"{CONNECTIVE}\b(?:(?:this|next)\s+)?(?:the\s+)?weekend\b"),
        ),
        (
            TimePatternKind::Weekday,
            format!(r"{CONNECTIVE}\b(?:(?:this|next)\s+)?{WEEKDAY}\b"),
        ),
        (
            TimePatternKind::HourOnly,
            // The trailing \b keeps "10h" from being read out of "10h30".
            format!(r"{CONNECTIVE}\b\d{{1,2}}\s*(?:am|pm|h|o'?clock|hours?)\b"),
        ),
        (
            TimePatternKind::RelativeDay,
            format!(r"{CONNECTIVE}\b{RELATIVE_DAY}\b"),
        ),
    ];

    defs.into_iter()
        .map(|(kind, src)| TimePattern {
            kind,
            regex: Regex::new(&src).expect("time pattern"),
        })
        .collect()
});

static LEADING_CONNECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:at|on)\s+").expect("leading connective"));

/// A time phrase located by the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    pub kind: TimePatternKind,
    pub span: Span,
    /// Matched normalized text with any leading "at"/"on" removed.
    pub phrase: String,
}

/// Runs the cascade over `haystack` (the normalized text, possibly with
/// already-claimed spans blanked out).
pub fn find_time_phrase(haystack: &str) -> Option<TimeMatch> {
    for pattern in TIME_PATTERNS.iter() {
        if let Some(m) = pattern.regex.find(haystack) {
            let phrase = LEADING_CONNECTIVE
                .replace(m.as_str(), "")
                .trim()
                .to_string();
            return Some(TimeMatch {
                kind: pattern.kind,
                span: m.into(),
                phrase,
            });
        }
    }
    None
}

struct Rewrite {
    regex: Regex,
    replace: fn(&Captures) -> String,
}

fn rewrite(pattern: &str, replace: fn(&Captures) -> String) -> Rewrite {
    Rewrite {
        regex: Regex::new(pattern).expect("rewrite pattern"),
        replace,
    }
}

static REWRITES: Lazy<Vec<Rewrite>> = Lazy::new(|| {
    vec![
        rewrite(r"\b(\d{1,2})\s+hours?\s+(\d{1,2})\s+minutes?\b", |c| {
            format!("{}:{}", &c[1], &c[2])
        }),
        rewrite(r"\b(\d{1,2})h\s?(\d{1,2})\b", |c| {
            format!("{}:{}", &c[1], &c[2])
        }),
        rewrite(r"\b(\d{1,2})h\b", |c| format!("{}:00", &c[1])),
        rewrite(r"\b(\d{1,2})\s*(?:hours?|o'?clock)\b", |c| {
            format!("{}:00", &c[1])
        }),
        rewrite(r"\b(\d{1,2}:\d{1,2})\s*(am|pm)\b", |c| {
            format!("{} {}", &c[1], c[2].to_uppercase())
        }),
        rewrite(r"\b(\d{1,2})\s*(am|pm)\b", |c| {
            format!("{}:00 {}", &c[1], c[2].to_uppercase())
        }),
        rewrite(r"\b(?:(?:this|next)\s+)?(?:the\s+)?weekend\b", |_| {
            "saturday".to_string()
        }),
        rewrite(r"\btonight\b", |_| "PM today".to_string()),
        rewrite(r"\bthis\s+(morning|noon|afternoon|evening)\b", |c| {
            format!("{} today", &c[1])
        }),
        rewrite(r"\b(?:in\s+the\s+)?morning\b", |_| "AM".to_string()),
        rewrite(r"\b(?:in\s+the\s+)?(?:noon|afternoon|evening)\b", |_| {
            "PM".to_string()
        }),
    ]
});

/// Rewrites a matched phrase into the canonical form the date resolver reads:
/// clock times as `H:MM`, day-parts as `AM`/`PM`, weekends as `saturday`.
pub fn canonicalize(phrase: &str) -> String {
    let mut s = phrase.to_string();
    for rule in REWRITES.iter() {
        s = rule.regex.replace_all(&s, rule.replace).into_owned();
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
