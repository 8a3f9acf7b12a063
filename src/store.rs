// File: src/store.rs
use crate::context::AppContext;
use crate::model::ParsedEvent;
use crate::storage::LocalStorage;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    #[serde(flatten)]
    pub event: ParsedEvent,
    /// Set once the reminder for the current field values has fired.
    #[serde(default)]
    pub notified: bool,
}

impl Entry {
    pub fn title(&self) -> &str {
        self.event.title.as_deref().unwrap_or_default()
    }
}

/// Filters for [`EventStore::search`]. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub location: Option<String>,
    /// Inclusive lower bound on the start time.
    pub from: Option<String>,
    /// Inclusive upper bound on the start time.
    pub to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower,
    Upper,
}

/// Parses a search bound. A bare date covers the whole day: it means
/// 00:00:00 as a lower bound and 23:59:59 as an upper bound.
fn parse_bound(raw: &str, bound: Bound) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            Bound::Lower => NaiveTime::MIN,
            Bound::Upper => NaiveTime::from_hms_opt(23, 59, 59)
                .ok_or_else(|| anyhow::anyhow!("invalid end-of-day time"))?,
        };
        return Ok(date.and_time(time));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    Err(anyhow::anyhow!(
        "Invalid date '{}'. Use YYYY-MM-DD, 'YYYY-MM-DD HH:MM[:SS]' or RFC 3339",
        raw
    ))
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// File-backed event store. Every mutation is a locked
/// read-modify-write of `events.json`, so separate processes (the CLI and a
/// running `watch`) can share the file.
#[derive(Debug, Clone)]
pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    pub fn open(ctx: &dyn AppContext) -> Result<Self> {
        Ok(Self::at(ctx.get_events_path()?))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Persists a new entry and returns its id. Refuses an event without a
    /// usable title.
    pub fn create(&self, event: ParsedEvent) -> Result<u64> {
        event.require_title()?;
        let id = LocalStorage::modify_events(&self.path, |data| {
            let id = data.next_id.max(1);
            data.next_id = id + 1;
            data.entries.push(Entry {
                id,
                event,
                notified: false,
            });
            Ok(id)
        })?;
        log::info!("created event {}", id);
        Ok(id)
    }

    /// Replaces every field of an entry. The notified flag is reset so the
    /// reminder fires again for the new values. Returns false if `id` is
    /// unknown.
    pub fn update(&self, id: u64, event: ParsedEvent) -> Result<bool> {
        event.require_title()?;
        let found = LocalStorage::modify_events(&self.path, |data| {
            Ok(match data.entries.iter_mut().find(|e| e.id == id) {
                Some(entry) => {
                    entry.event = event;
                    entry.notified = false;
                    true
                }
                None => false,
            })
        })?;
        if found {
            log::info!("updated event {}", id);
        }
        Ok(found)
    }

    pub fn delete(&self, id: u64) -> Result<bool> {
        let removed = LocalStorage::modify_events(&self.path, |data| {
            let before = data.entries.len();
            data.entries.retain(|e| e.id != id);
            Ok(data.entries.len() != before)
        })?;
        if removed {
            log::info!("deleted event {}", id);
        }
        Ok(removed)
    }

    pub fn get(&self, id: u64) -> Result<Option<Entry>> {
        let data = LocalStorage::load_events(&self.path)?;
        Ok(data.entries.into_iter().find(|e| e.id == id))
    }

    /// Sets the notified flag, but only if the entry still holds `seen`, the
    /// values the reminder was computed from. Returns whether the flag was
    /// set.
    pub fn mark_notified(&self, id: u64, seen: &ParsedEvent) -> Result<bool> {
        let marked = LocalStorage::modify_events(&self.path, |data| {
            Ok(match data.entries.iter_mut().find(|e| e.id == id) {
                Some(entry) if entry.event == *seen => {
                    entry.notified = true;
                    true
                }
                _ => false,
            })
        })?;
        if !marked {
            log::debug!("event {} changed or vanished, not marked notified", id);
        }
        Ok(marked)
    }

    /// All entries by start time. Untimed entries come first, ties by id.
    pub fn list(&self) -> Result<Vec<Entry>> {
        let mut entries = LocalStorage::load_events(&self.path)?.entries;
        entries.sort_by(|a, b| {
            a.event
                .start_time
                .cmp(&b.event.start_time)
                .then(a.id.cmp(&b.id))
        });
        Ok(entries)
    }

    /// Entries matching every filter in `query`, in [`list`](Self::list)
    /// order. Untimed entries never match a date range.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Entry>> {
        let from = query
            .from
            .as_deref()
            .map(|s| parse_bound(s, Bound::Lower))
            .transpose()?;
        let to = query
            .to
            .as_deref()
            .map(|s| parse_bound(s, Bound::Upper))
            .transpose()?;

        let results = self
            .list()?
            .into_iter()
            .filter(|e| {
                query
                    .title
                    .as_deref()
                    .is_none_or(|t| contains_ci(e.event.title.as_deref(), t))
            })
            .filter(|e| {
                query
                    .location
                    .as_deref()
                    .is_none_or(|l| contains_ci(e.event.location.as_deref(), l))
            })
            .filter(|e| {
                if from.is_none() && to.is_none() {
                    return true;
                }
                let Some(start) = e.event.start_time else {
                    return false;
                };
                let local = start.naive_local();
                from.is_none_or(|f| local >= f) && to.is_none_or(|t| local <= t)
            })
            .collect();
        Ok(results)
    }
}
