// File: tests/store_behavior.rs
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use jotter::context::TestContext;
use jotter::model::parse_event;
use jotter::store::{EventStore, SearchQuery};

fn reference() -> DateTime<Tz> {
    chrono_tz::Asia::Ho_Chi_Minh
        .with_ymd_and_hms(2025, 11, 12, 9, 0, 0)
        .unwrap()
}

fn setup() -> (TestContext, EventStore) {
    let ctx = TestContext::new();
    let store = EventStore::open(&ctx).unwrap();
    (ctx, store)
}

#[test]
fn test_round_trip_keeps_fields() {
    let (_ctx, store) = setup();
    let event = parse_event(
        "Team sync at Café Đà Lạt 10:30 Thursday, remind before 15 minutes",
        &reference(),
    );
    let id = store.create(event.clone()).unwrap();

    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.event, event);
    assert!(!loaded.notified);
}

#[test]
fn test_create_refuses_missing_title() {
    let (_ctx, store) = setup();
    let nameless = parse_event("remind me before 2 hours", &reference());
    assert!(store.create(nameless).is_err());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_ids_are_never_reused() {
    let (_ctx, store) = setup();
    let a = store.create(parse_event("First", &reference())).unwrap();
    let b = store.create(parse_event("Second", &reference())).unwrap();
    assert!(store.delete(b).unwrap());
    let c = store.create(parse_event("Third", &reference())).unwrap();
    assert!(a < b && b < c);
    assert!(!store.delete(b).unwrap());
}

#[test]
fn test_update_resets_notified() {
    let (_ctx, store) = setup();
    let id = store
        .create(parse_event("Standup 9:30 Friday, remind before 5 minutes", &reference()))
        .unwrap();
    let seen = store.get(id).unwrap().unwrap().event;
    assert!(store.mark_notified(id, &seen).unwrap());
    assert!(store.get(id).unwrap().unwrap().notified);

    let changed = parse_event("Standup 10:00 Friday, remind before 5 minutes", &reference());
    assert!(store.update(id, changed.clone()).unwrap());
    let entry = store.get(id).unwrap().unwrap();
    assert!(!entry.notified);
    assert_eq!(entry.event, changed);

    assert!(!store.update(999, changed).unwrap());
}

#[test]
fn test_mark_notified_ignores_stale_snapshot() {
    let (_ctx, store) = setup();
    let id = store
        .create(parse_event("Standup 9:30 Friday, remind before 5 minutes", &reference()))
        .unwrap();

    // A reminder is computed from this snapshot, then the entry is edited
    // before the flag gets written.
    let snapshot = store.list().unwrap().remove(0).event;
    let moved = parse_event("Standup 11:00 Friday, remind before 5 minutes", &reference());
    assert!(store.update(id, moved.clone()).unwrap());

    assert!(!store.mark_notified(id, &snapshot).unwrap());
    assert!(!store.get(id).unwrap().unwrap().notified);

    // The current values can still be marked.
    assert!(store.mark_notified(id, &moved).unwrap());
    assert!(store.get(id).unwrap().unwrap().notified);
    assert!(!store.mark_notified(999, &moved).unwrap());
}

#[test]
fn test_list_orders_by_start_with_untimed_first() {
    let (_ctx, store) = setup();
    let later = store.create(parse_event("Later 10:30 Friday", &reference())).unwrap();
    let untimed = store.create(parse_event("Someday buy a kayak", &reference())).unwrap();
    let sooner = store.create(parse_event("Sooner 10:30 Thursday", &reference())).unwrap();

    let ids: Vec<u64> = store.list().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![untimed, sooner, later]);
}

#[test]
fn test_search_filters() {
    let (_ctx, store) = setup();
    let sync = store
        .create(parse_event("Team sync at the office 10:30 Thursday", &reference()))
        .unwrap();
    let dinner = store
        .create(parse_event("Dinner at Luigi's tomorrow at 7pm", &reference()))
        .unwrap();
    let untimed = store
        .create(parse_event("Pick up package at the supermarket", &reference()))
        .unwrap();

    let ids = |q: SearchQuery| -> Vec<u64> {
        store.search(&q).unwrap().iter().map(|e| e.id).collect()
    };

    assert_eq!(
        ids(SearchQuery {
            title: Some("SYNC".into()),
            ..Default::default()
        }),
        vec![sync]
    );
    assert_eq!(
        ids(SearchQuery {
            location: Some("market".into()),
            ..Default::default()
        }),
        vec![untimed]
    );

    // A bare date covers the whole day; untimed entries never match a range.
    assert_eq!(
        ids(SearchQuery {
            from: Some("2025-11-13".into()),
            to: Some("2025-11-13".into()),
            ..Default::default()
        }),
        vec![sync, dinner]
    );
    assert_eq!(
        ids(SearchQuery {
            from: Some("2025-11-13 12:00".into()),
            ..Default::default()
        }),
        vec![dinner]
    );
    assert_eq!(
        ids(SearchQuery {
            to: Some("2025-11-13T10:30:00".into()),
            ..Default::default()
        }),
        vec![sync]
    );

    let bad = SearchQuery {
        from: Some("next tuesday".into()),
        ..Default::default()
    };
    assert!(store.search(&bad).is_err());
}

#[test]
fn test_file_survives_reopen() {
    let ctx = TestContext::new();
    let id = {
        let store = EventStore::open(&ctx).unwrap();
        store.create(parse_event("Lunch at 12:00", &reference())).unwrap()
    };
    let reopened = EventStore::open(&ctx).unwrap();
    let entry = reopened.get(id).unwrap().unwrap();
    assert_eq!(entry.title(), "Lunch");
    assert_eq!(entry.event, parse_event("Lunch at 12:00", &reference()));
}
