// File: src/model/matcher.rs
//! Trigger, reminder and location matchers.
//!
//! Each matcher scans the normalized text and reports spans to remove from
//! the title together with whatever payload it recognized. The caller decides
//! which payload wins; every span is removed regardless.
use crate::model::text::{Span, WorkingText};
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MatchKind {
    Trigger,
    Reminder,
    Location,
    Time,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Minutes(u32),
    Place(String),
    Time(Option<DateTime<FixedOffset>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub kind: MatchKind,
    pub span: Span,
    pub payload: Payload,
}

impl Match {
    pub fn new(kind: MatchKind, span: Span, payload: Payload) -> Self {
        Self {
            kind,
            span,
            payload,
        }
    }
}

static TRIGGER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:please\s+)?(?:remind me to|remind me|don't forget to|let's schedule|let's|schedule|i will|i'll|i need to|i have to|i want to)|please)(?:\s+|$)",
    )
    .expect("trigger pattern")
});

static REMINDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:remind|notify)(?:\s+me)?\s+(?:before\s+(\d+)\s*(minutes?|mins?|m|hours?|hrs?|h)|(\d+)\s*(minutes?|mins?|m|hours?|hrs?|h)\s+before)\b",
    )
    .expect("reminder pattern")
});

static LOCATION_CONNECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s(?:at|in)\s+").expect("location connective"));

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";
const DAY_PARTS: &str = "morning|noon|afternoon|evening";

// Text right after "at"/"in" that reads as a time, not a place.
static TIME_LEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:\d|(?:the\s+)?(?:today|tonight|tomorrow|weekend|this|next|day\s+after|{DAY_PARTS}|{WEEKDAYS})\b)"
    ))
    .expect("time-leading pattern")
});

// Where a place ends when no comma comes first. "on" only ends it when a
// day follows, so "Hotel on Main street" stays one place.
static PLACE_TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r",|\s(?:the\s+)?day\s+after\s+tomorrow\b|\s(?:at|remind|notify|today|tonight|tomorrow|this|next|weekend|{WEEKDAYS}|{DAY_PARTS})\b|\son\s+(?:(?:this|next|the)\s+)?(?:(?:today|tomorrow|weekend|{WEEKDAYS})\b|\d)|\s\d{{1,2}}(?::|h)\d{{1,2}}\b|\s\d{{1,2}}\s*(?:am|pm)\b"
    ))
    .expect("place terminator")
});

/// Sentence-initial boilerplate ("remind me to", "let's schedule", ...).
pub fn match_trigger(text: &WorkingText) -> Option<Match> {
    TRIGGER_PATTERN.find(text.normalized()).map(|m| {
        log::debug!("trigger phrase '{}'", m.as_str().trim_end());
        Match::new(MatchKind::Trigger, m.into(), Payload::None)
    })
}

/// Every "remind before N unit" phrase, left to right.
pub fn match_reminders(text: &WorkingText) -> Vec<Match> {
    let mut matches = Vec::new();
    for caps in REMINDER_PATTERN.captures_iter(text.normalized()) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let amount = caps.get(1).or_else(|| caps.get(3));
        let unit = caps.get(2).or_else(|| caps.get(4));
        let (Some(amount), Some(unit)) = (amount, unit) else {
            continue;
        };
        // An amount too large for u32 minutes carries no value, but the
        // phrase still leaves the title.
        let payload = match to_minutes(amount.as_str(), unit.as_str()) {
            Some(minutes) => {
                log::debug!("reminder phrase '{}' -> {} min", whole.as_str(), minutes);
                Payload::Minutes(minutes)
            }
            None => {
                log::debug!("reminder phrase '{}' out of range", whole.as_str());
                Payload::None
            }
        };
        matches.push(Match::new(MatchKind::Reminder, whole.into(), payload));
    }
    matches
}

fn to_minutes(amount: &str, unit: &str) -> Option<u32> {
    let value = amount.parse::<u32>().ok()?;
    if unit.starts_with('h') {
        value.checked_mul(60)
    } else {
        Some(value)
    }
}

/// Every "at/in <place>" candidate that does not read as a time.
/// Candidates never overlap; scanning resumes where the previous place ended.
pub fn match_locations(text: &WorkingText) -> Vec<Match> {
    let norm = text.normalized();
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(conn) = LOCATION_CONNECTIVE.find_at(norm, pos) {
        let rest = &norm[conn.end()..];
        if TIME_LEADING.is_match(rest) {
            // Resume right after the leading whitespace of this connective.
            pos = conn.start() + 1;
            continue;
        }

        let place_len = PLACE_TERMINATOR
            .find(rest)
            .map(|t| t.start())
            .unwrap_or(rest.len());
        let place_span = Span::new(conn.end(), conn.end() + place_len);
        let place = trim_place(text.original_slice(place_span));

        if place.is_empty() {
            pos = conn.start() + 1;
            continue;
        }

        log::debug!("location candidate '{}'", place);
        matches.push(Match::new(
            MatchKind::Location,
            Span::new(conn.start(), place_span.end),
            Payload::Place(place.to_string()),
        ));
        pos = place_span.end;
    }
    matches
}

fn trim_place(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
}

/// The longest place among the candidates; the first one wins a tie.
pub fn longest_place(matches: &[Match]) -> Option<String> {
    let mut best: Option<&str> = None;
    for m in matches {
        if let Payload::Place(place) = &m.payload
            && best.is_none_or(|b| place.chars().count() > b.chars().count())
        {
            best = Some(place);
        }
    }
    best.map(str::to_string)
}

/// The reminder lead time: the last phrase read left to right wins.
pub fn last_reminder_minutes(matches: &[Match]) -> Option<u32> {
    matches.iter().rev().find_map(|m| match m.payload {
        Payload::Minutes(mins) => Some(mins),
        _ => None,
    })
}
