//! Week view geometry: event boxes inside a 24-hour column and the inverse
//! mapping from a pointer position back to a wall-clock time.
//!
//! Overlapping events are not packed into columns. Each event of a day is
//! inset a little further from the left by its index, so heavy overlap can
//! hide events behind each other.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::bucket::EventBuckets;
use crate::event::CalendarEvent;

pub const DEFAULT_HOUR_HEIGHT: f64 = 48.0;
/// Floor that keeps short events visible and clickable.
pub const MIN_EVENT_HEIGHT: f64 = 18.0;
pub const STAGGER_BASE_PERCENT: f64 = 6.0;
pub const STAGGER_STEP_PERCENT: f64 = 6.0;
pub const RIGHT_INSET_PERCENT: f64 = 6.0;
/// Pointer-derived times snap to this many minutes.
pub const SLOT_SNAP_MINUTES: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventBox {
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEvent<'a> {
    pub event: &'a CalendarEvent,
    pub geometry: EventBox,
    pub left_percent: f64,
    pub right_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayColumn<'a> {
    pub date: NaiveDate,
    pub events: Vec<PlacedEvent<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekLayout {
    hour_height: f64,
}

impl Default for WeekLayout {
    fn default() -> Self {
        Self {
            hour_height: DEFAULT_HOUR_HEIGHT,
        }
    }
}

impl WeekLayout {
    /// Non-positive or non-finite heights fall back to the default.
    pub fn new(hour_height: f64) -> Self {
        if hour_height.is_finite() && hour_height > 0.0 {
            Self { hour_height }
        } else {
            Self::default()
        }
    }

    pub fn hour_height(&self) -> f64 {
        self.hour_height
    }

    pub fn total_height(&self) -> f64 {
        self.hour_height * 24.0
    }

    /// Only the wall-clock time of start and end is used. An end earlier
    /// in the day than the start collapses to the minimum height.
    pub fn layout(&self, event: &CalendarEvent) -> EventBox {
        let start_minutes = minutes_of_day(&event.start);
        let end_minutes = minutes_of_day(&event.end);
        let top = (start_minutes / 60.0) * self.hour_height;
        let raw = ((end_minutes - start_minutes) / 60.0) * self.hour_height;
        EventBox {
            top,
            height: raw.max(MIN_EVENT_HEIGHT),
        }
    }

    pub fn stagger_left_percent(index: usize) -> f64 {
        STAGGER_BASE_PERCENT + index as f64 * STAGGER_STEP_PERCENT
    }

    /// Maps a pointer `click_y` (same coordinate space as `column_top`) to
    /// a time on `day`, snapped to five minutes. A minute that rounds up to
    /// 60 carries into the next hour.
    pub fn inverse_layout(
        &self,
        day: NaiveDate,
        click_y: f64,
        column_top: f64,
        scroll_top: f64,
    ) -> NaiveDateTime {
        let total = self.total_height();
        let y_within = (click_y - column_top + scroll_top).clamp(0.0, (total - 1.0).max(0.0));
        let minutes = (y_within / total) * 24.0 * 60.0;
        let hour = (minutes / 60.0).floor() as i64;
        let minute = (((minutes % 60.0) / SLOT_SNAP_MINUTES).round() * SLOT_SNAP_MINUTES) as i64;

        day.and_time(NaiveTime::MIN) + Duration::minutes(hour * 60 + minute)
    }

    pub fn place_day<'a>(&self, date: NaiveDate, events: &[&'a CalendarEvent]) -> DayColumn<'a> {
        let events = events
            .iter()
            .enumerate()
            .map(|(index, event)| PlacedEvent {
                event: *event,
                geometry: self.layout(event),
                left_percent: Self::stagger_left_percent(index),
                right_percent: RIGHT_INSET_PERCENT,
            })
            .collect();
        DayColumn { date, events }
    }

    pub fn place_week<'a>(&self, week: &[NaiveDate], buckets: &EventBuckets<'a>) -> Vec<DayColumn<'a>> {
        week.iter()
            .map(|day| self.place_day(*day, buckets.get(day)))
            .collect()
    }
}

fn minutes_of_day(dt: &NaiveDateTime) -> f64 {
    f64::from(dt.hour() * 60 + dt.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::bucket_by_day;
    use crate::grid::week_grid_for;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .expect("valid date")
            .and_hms_opt(h, m, 0)
            .expect("valid time")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
    }

    #[test]
    fn short_event_gets_minimum_height() {
        let layout = WeekLayout::new(48.0);
        let event = CalendarEvent::new("quick", at(10, 9, 0), at(10, 9, 15));
        let geometry = layout.layout(&event);
        assert_eq!(geometry.top, 432.0);
        assert_eq!(geometry.height, 18.0);
    }

    #[test]
    fn height_scales_with_duration() {
        let layout = WeekLayout::new(48.0);
        let event = CalendarEvent::new("block", at(10, 13, 30), at(10, 15, 0));
        let geometry = layout.layout(&event);
        assert_eq!(geometry.top, 648.0);
        assert_eq!(geometry.height, 72.0);
    }

    #[test]
    fn event_ending_after_midnight_collapses_to_floor() {
        let layout = WeekLayout::default();
        let event = CalendarEvent::new("late", at(10, 23, 0), at(11, 1, 0));
        assert_eq!(layout.layout(&event).height, MIN_EVENT_HEIGHT);
    }

    #[test]
    fn inverse_layout_snaps_to_five_minutes() {
        let layout = WeekLayout::new(48.0);
        assert_eq!(layout.total_height(), 1152.0);
        let time = layout.inverse_layout(day(10), 300.0, 0.0, 0.0);
        assert_eq!(time, at(10, 6, 15));
    }

    #[test]
    fn inverse_layout_accounts_for_scroll_and_offset() {
        let layout = WeekLayout::new(48.0);
        let time = layout.inverse_layout(day(10), 236.0, 100.0, 440.0);
        assert_eq!(time, at(10, 12, 0));
    }

    #[test]
    fn inverse_layout_clamps_above_column() {
        let layout = WeekLayout::new(48.0);
        assert_eq!(layout.inverse_layout(day(10), -50.0, 0.0, 0.0), at(10, 0, 0));
    }

    #[test]
    fn inverse_layout_handles_columns_shorter_than_a_pixel() {
        let layout = WeekLayout::new(0.02);
        assert!(layout.total_height() < 1.0);
        assert_eq!(layout.inverse_layout(day(10), 0.1, 0.0, 0.0), at(10, 0, 0));
        assert_eq!(layout.inverse_layout(day(10), 500.0, 0.0, 0.0), at(10, 0, 0));
    }

    #[test]
    fn inverse_layout_carries_rounded_minutes() {
        let layout = WeekLayout::new(48.0);
        // 47.9px is 59.875 minutes, which snaps to 60.
        let time = layout.inverse_layout(day(10), 47.9, 0.0, 0.0);
        assert_eq!(time, at(10, 1, 0));
    }

    #[test]
    fn inverse_layout_recovers_layout_top() {
        let layout = WeekLayout::new(48.0);
        let event = CalendarEvent::new("sync", at(12, 14, 35), at(12, 15, 0));
        let top = layout.layout(&event).top;
        assert_eq!(layout.inverse_layout(day(12), top, 0.0, 0.0), event.start);
    }

    #[test]
    fn invalid_hour_height_uses_default() {
        assert_eq!(WeekLayout::new(0.0).hour_height(), DEFAULT_HOUR_HEIGHT);
        assert_eq!(WeekLayout::new(f64::NAN).hour_height(), DEFAULT_HOUR_HEIGHT);
    }

    #[test]
    fn overlapping_events_cascade_by_index() {
        let events = vec![
            CalendarEvent::new("a", at(12, 9, 0), at(12, 11, 0)),
            CalendarEvent::new("b", at(12, 9, 30), at(12, 10, 0)),
            CalendarEvent::new("c", at(12, 10, 0), at(12, 12, 0)),
        ];
        let buckets = bucket_by_day(&events);
        let week = week_grid_for(day(12));
        let columns = WeekLayout::default().place_week(&week, &buckets);

        assert_eq!(columns.len(), 7);
        let tuesday = &columns[2];
        assert_eq!(tuesday.date, day(12));
        let lefts: Vec<f64> = tuesday.events.iter().map(|p| p.left_percent).collect();
        assert_eq!(lefts, [6.0, 12.0, 18.0]);
        assert!(tuesday.events.iter().all(|p| p.right_percent == 6.0));
        assert!(columns[0].events.is_empty());
    }
}
