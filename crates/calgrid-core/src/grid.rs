use chrono::{Datelike, NaiveDate};

use crate::bucket::EventBuckets;
use crate::datetime::{WEEK_DAYS, add_days, calendar_grid, is_same_day, start_of_week};
use crate::event::CalendarEvent;

/// Events shown inline in a month cell before collapsing into "+N more".
pub const MONTH_CELL_VISIBLE_EVENTS: usize = 3;

pub fn month_grid(anchor: NaiveDate) -> Vec<NaiveDate> {
    calendar_grid(&anchor)
}

/// Seven consecutive days from `week_start`.
pub fn week_grid(week_start: NaiveDate) -> Vec<NaiveDate> {
    (0..WEEK_DAYS).map(|offset| add_days(week_start, offset)).collect()
}

/// Week containing `anchor`, Sunday first.
pub fn week_grid_for(anchor: NaiveDate) -> Vec<NaiveDate> {
    week_grid(start_of_week(anchor))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthCell<'a> {
    pub date: NaiveDate,
    pub events: Vec<&'a CalendarEvent>,
    pub is_today: bool,
    pub is_other_month: bool,
}

impl<'a> MonthCell<'a> {
    pub fn visible_events(&self) -> &[&'a CalendarEvent] {
        let shown = self.events.len().min(MONTH_CELL_VISIBLE_EVENTS);
        &self.events[..shown]
    }

    pub fn overflow(&self) -> usize {
        self.events.len().saturating_sub(MONTH_CELL_VISIBLE_EVENTS)
    }
}

/// The 42 cells of the month view for `anchor`'s month. `today` is passed
/// in; `datetime::is_today` is the clock-reading form of the same check.
pub fn month_cells<'a>(
    anchor: NaiveDate,
    buckets: &EventBuckets<'a>,
    today: NaiveDate,
) -> Vec<MonthCell<'a>> {
    month_grid(anchor)
        .into_iter()
        .map(|date| MonthCell {
            date,
            events: buckets.get(&date).to_vec(),
            is_today: is_same_day(&date, &today),
            is_other_month: date.month() != anchor.month(),
        })
        .collect()
}
