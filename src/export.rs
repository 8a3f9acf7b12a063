// File: src/export.rs
// JSON and iCalendar exports of the event store.
use crate::storage::LocalStorage;
use crate::store::Entry;
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use icalendar::{Calendar, Component, Event};
use std::path::Path;
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Json,
    Ics,
}

impl ExportFormat {
    pub fn render(&self, entries: &[Entry]) -> Result<String> {
        match self {
            ExportFormat::Json => to_json(entries),
            ExportFormat::Ics => Ok(to_ics(entries)),
        }
    }
}

/// Every entry, pretty-printed. Non-ASCII text is written as-is.
pub fn to_json(entries: &[Entry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

fn format_utc(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

fn entry_to_vevent(entry: &Entry) -> Option<Event> {
    let start = entry.event.start_time?;

    let mut event = Event::new();
    event.uid(&format!("jotter-{}@jotter", entry.id));
    event.summary(entry.title());
    event.timestamp(Utc::now());
    event.add_property("DTSTART", format_utc(&start));

    match entry.event.end_time {
        Some(end) if end >= start => {
            event.add_property("DTEND", format_utc(&end));
        }
        Some(_) => log::warn!("event {}: end before start, DTEND dropped", entry.id),
        None => {}
    }

    if let Some(loc) = &entry.event.location {
        event.add_property("LOCATION", loc);
    }
    if entry.event.reminder_minutes > 0 {
        event.description(&format!(
            "Remind {} minutes before.",
            entry.event.reminder_minutes
        ));
    }
    Some(event.done())
}

/// A VCALENDAR with one VEVENT per timed entry. Untimed entries are skipped.
pub fn to_ics(entries: &[Entry]) -> String {
    let mut calendar = Calendar::new();
    for entry in entries {
        match entry_to_vevent(entry) {
            Some(ev) => {
                calendar.push(ev);
            }
            None => log::debug!("event {} has no start time, not exported", entry.id),
        }
    }
    calendar.done().to_string()
}

/// Renders and writes atomically to `path`.
pub fn export_to_path(format: ExportFormat, entries: &[Entry], path: &Path) -> Result<()> {
    let contents = format.render(entries)?;
    LocalStorage::atomic_write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write export '{}': {}", path.display(), e))?;
    log::info!("exported {} event(s) as {} to {}", entries.len(), format, path.display());
    Ok(())
}
