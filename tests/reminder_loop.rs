// File: tests/reminder_loop.rs
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use jotter::clock::FixedClock;
use jotter::context::TestContext;
use jotter::model::parse_event;
use jotter::reminder::{ReminderSettings, due_reminders, spawn_reminder_loop};
use jotter::store::EventStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn at(h: u32, m: u32) -> DateTime<Tz> {
    chrono_tz::Asia::Ho_Chi_Minh
        .with_ymd_and_hms(2025, 11, 12, h, m, 0)
        .unwrap()
}

fn settings() -> ReminderSettings {
    ReminderSettings {
        interval: Duration::from_secs(3600),
        channel_capacity: 4,
        desktop_notifications: false,
    }
}

/// Store with "Lunch" at 12:00 today, reminder 15 minutes before, plus an
/// untimed entry and one without a reminder.
fn seeded() -> (TestContext, EventStore, u64) {
    let ctx = TestContext::new();
    let store = EventStore::open(&ctx).unwrap();
    let lunch = store
        .create(parse_event("Lunch at 12:00, remind before 15 minutes", &at(9, 0)))
        .unwrap();
    store
        .create(parse_event("Buy milk, remind before 5 minutes", &at(9, 0)))
        .unwrap();
    store
        .create(parse_event("Nap at 11:00", &at(9, 0)))
        .unwrap();
    (ctx, store, lunch)
}

#[test]
fn test_threshold_is_inclusive() {
    let (_ctx, store, lunch) = seeded();
    let entries = store.list().unwrap();

    assert!(due_reminders(&entries, &at(11, 44)).is_empty());

    let due = due_reminders(&entries, &at(11, 45));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, lunch);
    assert_eq!(due[0].title, "Lunch");
    assert_eq!(due[0].reminder_minutes, 15);
}

#[test]
fn test_notified_entries_are_not_due() {
    let (_ctx, store, lunch) = seeded();
    let seen = store.get(lunch).unwrap().unwrap().event;
    store.mark_notified(lunch, &seen).unwrap();
    assert!(due_reminders(&store.list().unwrap(), &at(13, 0)).is_empty());
}

#[tokio::test]
async fn test_loop_sends_then_marks_notified() {
    let (_ctx, store, lunch) = seeded();
    let (stop_tx, stop_rx) = watch::channel(false);
    let clock = Arc::new(FixedClock(at(11, 50)));

    let (mut rx, handle) = spawn_reminder_loop(store.clone(), clock, settings(), stop_rx);

    let notice = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("first scan should run immediately")
        .expect("channel open");
    assert_eq!(notice.id, lunch);

    stop_tx.send(true).unwrap();
    handle.await.unwrap();

    assert!(store.get(lunch).unwrap().unwrap().notified);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_loop_stops_when_receiver_dropped() {
    let (_ctx, store, _) = seeded();
    let (_stop_tx, stop_rx) = watch::channel(false);
    let clock = Arc::new(FixedClock(at(9, 0)));

    let (rx, handle) = spawn_reminder_loop(store, clock, settings(), stop_rx);
    drop(rx);

    // Paused time auto-advances through the poll interval.
    tokio::time::timeout(Duration::from_secs(7200), handle)
        .await
        .expect("loop should exit once nobody listens")
        .unwrap();
}

#[tokio::test]
async fn test_loop_stops_when_stop_sender_dropped() {
    let (_ctx, store, _) = seeded();
    let (stop_tx, stop_rx) = watch::channel(false);
    let clock = Arc::new(FixedClock(at(9, 0)));

    let (_rx, handle) = spawn_reminder_loop(store, clock, settings(), stop_rx);
    drop(stop_tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should exit")
        .unwrap();
}
