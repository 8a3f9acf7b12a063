// File: src/model/event.rs
use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

/// Untimed-duration events always span one hour.
pub const DEFAULT_EVENT_LENGTH_MINUTES: i64 = 60;

/// Structured result of parsing one sentence.
///
/// Serializes as `{title, start_time, end_time, location, reminder_minutes}`
/// with ISO-8601 timestamps or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub title: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub location: Option<String>,
    #[serde(default)]
    pub reminder_minutes: u32,
}

impl ParsedEvent {
    /// Sets the start and derives the fixed one-hour end.
    pub fn set_start(&mut self, start: DateTime<FixedOffset>) {
        self.start_time = Some(start);
        self.end_time = Some(start + Duration::minutes(DEFAULT_EVENT_LENGTH_MINUTES));
    }

    pub fn is_timed(&self) -> bool {
        self.start_time.is_some()
    }

    /// The title, or the one failure the parser surfaces: nothing was left
    /// over to name the event.
    pub fn require_title(&self) -> Result<&str, ParseError> {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(ParseError::EmptyTitle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyTitle,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::EmptyTitle => write!(
                f,
                "Nothing left to use as a title once the time, place and reminder were removed"
            ),
        }
    }
}

impl std::error::Error for ParseError {}
