// File: src/model/parser.rs
use crate::model::compose::{assemble_title, compose_leftover};
use crate::model::event::ParsedEvent;
use crate::model::matcher::{
    Match, MatchKind, Payload, last_reminder_minutes, longest_place, match_locations,
    match_reminders, match_trigger,
};
use crate::model::resolve::{CanonicalResolver, DateResolver, fallback_resolve};
use crate::model::text::{Span, WorkingText};
use crate::model::time::{canonicalize, find_time_phrase};
use chrono::DateTime;
use chrono_tz::Tz;

/// Runs the extraction pipeline over one sentence.
///
/// Parsing never fails: anything that cannot be recognized is left in the
/// title or as a null field. Use [`ParsedEvent::require_title`] to reject
/// input that ends up without a title.
pub struct EventParser {
    resolver: Box<dyn DateResolver>,
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventParser {
    pub fn new() -> Self {
        Self::with_resolver(Box::new(CanonicalResolver))
    }

    pub fn with_resolver(resolver: Box<dyn DateResolver>) -> Self {
        Self { resolver }
    }

    pub fn parse(&self, input: &str, now: &DateTime<Tz>) -> ParsedEvent {
        let text = WorkingText::new(input);
        let mut event = ParsedEvent::default();
        let mut matches: Vec<Match> = Vec::new();

        if let Some(trigger) = match_trigger(&text) {
            matches.push(trigger);
        }

        let reminders = match_reminders(&text);
        if let Some(minutes) = last_reminder_minutes(&reminders) {
            event.reminder_minutes = minutes;
        }
        matches.extend(reminders);

        let locations = match_locations(&text);
        event.location = longest_place(&locations);
        matches.extend(locations);

        // Earlier stages get first refusal: the time cascade only sees text
        // nobody has claimed yet.
        let claimed: Vec<Span> = matches.iter().map(|m| m.span).collect();
        let haystack = text.masked(&claimed);

        if let Some(found) = find_time_phrase(&haystack) {
            let canonical = canonicalize(&found.phrase);
            log::debug!(
                "time phrase '{}' ({:?}) -> '{}'",
                text.original_slice(found.span).trim(),
                found.kind,
                canonical
            );

            let resolved = self
                .resolver
                .resolve(&canonical, now)
                .or_else(|| fallback_resolve(&found.phrase, &canonical, now))
                .map(|dt| dt.fixed_offset());

            match resolved {
                Some(start) => event.set_start(start),
                None => log::debug!("time phrase '{}' could not be resolved", found.phrase),
            }
            matches.push(Match::new(
                MatchKind::Time,
                found.span,
                Payload::Time(resolved),
            ));
        }

        let spans: Vec<Span> = matches.iter().map(|m| m.span).collect();
        let leftover = compose_leftover(&text, &spans);
        event.title = assemble_title(&leftover);

        log::debug!(
            "parsed '{}' with {} span(s) -> title {:?}",
            text.original(),
            matches.len(),
            event.title
        );
        event
    }
}

/// Parses with the default resolver.
pub fn parse_event(input: &str, now: &DateTime<Tz>) -> ParsedEvent {
    EventParser::new().parse(input, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn reference() -> DateTime<Tz> {
        chrono_tz::UTC.with_ymd_and_hms(2025, 11, 12, 9, 0, 0).unwrap()
    }

    struct NeverResolves;

    impl DateResolver for NeverResolves {
        fn resolve(&self, _: &str, _: &DateTime<Tz>) -> Option<DateTime<Tz>> {
            None
        }
    }

    #[test]
    fn test_trigger_and_time_leave_title() {
        let ev = parse_event("Remind me to call mom tomorrow at 5pm", &reference());
        assert_eq!(ev.title.as_deref(), Some("call mom"));
        let start = ev.start_time.unwrap();
        assert_eq!((start.day(), start.hour()), (13, 17));
    }

    #[test]
    fn test_fallback_used_when_resolver_gives_up() {
        let parser = EventParser::with_resolver(Box::new(NeverResolves));
        let ev = parser.parse("Gym tomorrow evening", &reference());
        let start = ev.start_time.unwrap();
        assert_eq!((start.day(), start.hour(), start.minute()), (13, 19, 0));
        assert_eq!(ev.title.as_deref(), Some("Gym"));
    }

    #[test]
    fn test_unresolvable_time_still_removed() {
        // Neither resolver accepts hour 25, but the phrase is still consumed.
        let ev = parse_event("Sync at 25:00", &reference());
        assert!(ev.start_time.is_none());
        assert!(ev.end_time.is_none());
        assert_eq!(ev.title.as_deref(), Some("Sync"));
    }

    #[test]
    fn test_reminder_hours_not_read_as_clock() {
        let ev = parse_event("Standup, remind before 2 hours", &reference());
        assert_eq!(ev.reminder_minutes, 120);
        assert!(ev.start_time.is_none());
        assert_eq!(ev.title.as_deref(), Some("Standup"));
    }
}
