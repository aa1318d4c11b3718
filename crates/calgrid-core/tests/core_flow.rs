use std::cell::RefCell;
use std::rc::Rc;

use calgrid_core::calendar::{Calendar, CalendarOptions, EventChange};
use calgrid_core::event::CalendarEvent;
use calgrid_core::navigation::ViewMode;
use calgrid_core::storage::{FileStore, KeyValueStore};
use chrono::NaiveDate;
use tempfile::tempdir;

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).expect("valid date")
}

#[test]
fn file_backed_calendar_survives_reopen() {
    let temp = tempdir().expect("tempdir");
    let options = CalendarOptions {
        initial_date: Some(day(2, 1)),
        storage_key: "events_test".to_string(),
        ..CalendarOptions::default()
    };

    let seen = Rc::new(RefCell::new(Vec::new()));
    let id = {
        let store = FileStore::open(temp.path()).expect("open store");
        let mut calendar = Calendar::open(store, options.clone());
        let sink = Rc::clone(&seen);
        calendar.subscribe(move |change: &EventChange| sink.borrow_mut().push(change.clone()));

        let mut form = calendar.draft_at(day(2, 29).and_hms_opt(0, 0, 0).expect("time"));
        form.title = "Leap day".to_string();
        form.end = form.start.clone();
        let change = calendar.submit(&form).expect("submit");
        let EventChange::Added(event) = change else {
            panic!("expected add");
        };
        event.id
    };
    assert_eq!(seen.borrow().len(), 1);

    let store = FileStore::open(temp.path()).expect("reopen store");
    assert!(store.get("events_test").expect("read").is_some());

    let mut calendar = Calendar::open(store, options);
    let event = calendar.store().get(&id).expect("rehydrated").clone();
    assert_eq!(event.title, "Leap day");
    assert_eq!(event.start, day(2, 29).and_hms_opt(9, 0, 0).expect("time"));
    assert_eq!(event.end, day(2, 29).and_hms_opt(10, 0, 0).expect("time"));

    let month = calendar.month_view_at(day(2, 29));
    assert_eq!(month.cells[0].date, day(1, 28));
    assert_eq!(month.cells[41].date, day(3, 9));
    let leap_cell = month
        .cells
        .iter()
        .find(|cell| cell.date == day(2, 29))
        .expect("leap cell");
    assert!(leap_cell.is_today);
    assert_eq!(leap_cell.events.len(), 1);

    calendar.set_view(ViewMode::Week);
    calendar.navigation_mut().set_anchor(day(2, 29));
    let week = calendar.week_view();
    assert_eq!(week.week_start, day(2, 25));
    let placed = &week.columns[4].events[0];
    assert_eq!(placed.geometry.top, 432.0);
    assert_eq!(placed.geometry.height, 48.0);

    assert!(calendar.delete(&id));
    assert!(calendar.events().is_empty());
}

#[test]
fn corrupt_storage_falls_back_to_seed_events() {
    let temp = tempdir().expect("tempdir");
    let mut store = FileStore::open(temp.path()).expect("open store");
    store.set("calendar_events_v1", "not json at all").expect("seed garbage");

    let start = day(3, 10).and_hms_opt(9, 0, 0).expect("time");
    let seed = vec![CalendarEvent::new("Seeded", start, start + chrono::Duration::minutes(15))];
    let calendar = Calendar::open(
        store,
        CalendarOptions {
            initial_events: seed.clone(),
            initial_date: Some(day(3, 10)),
            ..CalendarOptions::default()
        },
    );
    assert_eq!(calendar.events(), seed.as_slice());

    let week = calendar.week_view();
    let placed = &week.columns[0].events[0];
    assert_eq!(placed.geometry.top, 432.0);
    assert_eq!(placed.geometry.height, 18.0);
}
