use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::event::CalendarEvent;

/// Calendar-day identity, time of day dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DayKey {
    pub fn of<D: Datelike>(value: &D) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
        }
    }
}

/// Events grouped by the day their start falls on, each bucket in the
/// original list order.
#[derive(Debug, Default, Clone)]
pub struct EventBuckets<'a> {
    buckets: HashMap<DayKey, Vec<&'a CalendarEvent>>,
}

impl<'a> EventBuckets<'a> {
    pub fn get(&self, day: &impl Datelike) -> &[&'a CalendarEvent] {
        self.buckets
            .get(&DayKey::of(day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn day_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// One bucket per grid day, aligned with `grid`.
    pub fn for_grid(&self, grid: &[NaiveDate]) -> Vec<Vec<&'a CalendarEvent>> {
        grid.iter().map(|day| self.get(day).to_vec()).collect()
    }
}

pub fn bucket_by_day<'a, I>(events: I) -> EventBuckets<'a>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    let mut buckets: HashMap<DayKey, Vec<&'a CalendarEvent>> = HashMap::new();
    for event in events {
        buckets.entry(DayKey::of(&event.start)).or_default().push(event);
    }
    EventBuckets { buckets }
}
