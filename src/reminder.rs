// File: ./src/reminder.rs
use crate::clock::Clock;
use crate::store::{Entry, EventStore};
use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset};
use chrono_tz::Tz;
use notify_rust::Notification;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Sent to the presentation layer when a reminder is due.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderNotice {
    pub id: u64,
    pub title: String,
    pub start_time: DateTime<FixedOffset>,
    pub location: Option<String>,
    pub reminder_minutes: u32,
}

impl ReminderNotice {
    fn from_entry(entry: &Entry, start_time: DateTime<FixedOffset>) -> Self {
        Self {
            id: entry.id,
            title: entry.title().to_string(),
            start_time,
            location: entry.event.location.clone(),
            reminder_minutes: entry.event.reminder_minutes,
        }
    }

    pub fn body(&self) -> String {
        let when = self.start_time.format("%H:%M");
        match &self.location {
            Some(loc) => format!("Starts at {} ({})", when, loc),
            None => format!("Starts at {}", when),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReminderSettings {
    pub interval: std::time::Duration,
    pub channel_capacity: usize,
    pub desktop_notifications: bool,
}

/// Entries whose reminder threshold (`start - reminder_minutes`) has been
/// reached and that have not been notified yet.
pub fn due_reminders(entries: &[Entry], now: &DateTime<Tz>) -> Vec<ReminderNotice> {
    let now = now.fixed_offset();
    entries
        .iter()
        .filter(|e| !e.notified && e.event.reminder_minutes > 0)
        .filter_map(|e| {
            let start = e.event.start_time?;
            let threshold = start - Duration::minutes(i64::from(e.event.reminder_minutes));
            (threshold <= now).then(|| ReminderNotice::from_entry(e, start))
        })
        .collect()
}

enum ScanOutcome {
    Continue,
    ReceiverGone,
}

async fn scan_once(
    store: &EventStore,
    clock: &dyn Clock,
    tx: &mpsc::Sender<ReminderNotice>,
    desktop: bool,
) -> Result<ScanOutcome> {
    let entries = store.list()?;
    for notice in due_reminders(&entries, &clock.now()) {
        log::info!(
            "reminder due for event {} '{}' ({} min before)",
            notice.id,
            notice.title,
            notice.reminder_minutes
        );

        if desktop {
            let summary = notice.title.clone();
            let body = notice.body();
            std::thread::spawn(move || {
                if let Err(e) = Notification::new()
                    .summary(&summary)
                    .body(&body)
                    .appname("Jotter")
                    .show()
                {
                    log::warn!("desktop notification failed: {}", e);
                }
            });
        }

        let id = notice.id;
        if tx.send(notice).await.is_err() {
            return Ok(ScanOutcome::ReceiverGone);
        }
        // The send may have waited; only mark the values we reminded about.
        if let Some(seen) = entries.iter().find(|e| e.id == id) {
            store.mark_notified(id, &seen.event)?;
        }
    }
    Ok(ScanOutcome::Continue)
}

/// Spawns the polling loop. The first scan runs immediately, then once per
/// `settings.interval`.
///
/// The loop ends when `stop` flips to `true` (or its sender is dropped), or
/// when the returned receiver is dropped.
pub fn spawn_reminder_loop(
    store: EventStore,
    clock: Arc<dyn Clock>,
    settings: ReminderSettings,
    mut stop: watch::Receiver<bool>,
) -> (mpsc::Receiver<ReminderNotice>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(settings.channel_capacity.max(1));

    let handle = tokio::spawn(async move {
        loop {
            if *stop.borrow() || tx.is_closed() {
                break;
            }

            match scan_once(&store, clock.as_ref(), &tx, settings.desktop_notifications).await {
                Ok(ScanOutcome::Continue) => {}
                Ok(ScanOutcome::ReceiverGone) => break,
                Err(e) => log::warn!("reminder scan failed: {:#}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(settings.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        log::debug!("reminder loop stopped");
    });

    (rx, handle)
}
