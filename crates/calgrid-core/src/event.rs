use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::local_datetime_serde;

pub const UNTITLED: &str = "Untitled";
pub const DEFAULT_EVENT_COLOR: &str = "#0ea5e9";
pub const PRESET_COLORS: [&str; 7] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#fb7185",
];
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Start hour used when a draft is opened on a bare date.
pub const DEFAULT_DRAFT_HOUR: u32 = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "startDate", with = "local_datetime_serde")]
    pub start: NaiveDateTime,

    #[serde(rename = "endDate", with = "local_datetime_serde")]
    pub end: NaiveDateTime,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_color() -> String {
    DEFAULT_EVENT_COLOR.to_string()
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: new_event_id(),
            title: title.into(),
            description: None,
            start,
            end,
            color: default_color(),
            category: None,
        }
    }

    /// Blank event for the create form, anchored on `at`. A bare date
    /// (midnight) starts at the default draft hour.
    pub fn draft_at(at: NaiveDateTime) -> Self {
        let has_time = at.hour() != 0 || at.minute() != 0 || at.second() != 0;
        let start = if has_time {
            at
        } else {
            at.date()
                .and_hms_opt(DEFAULT_DRAFT_HOUR, 0, 0)
                .unwrap_or(at)
        };
        Self::new(String::new(), start, start + Duration::hours(1))
    }

    /// Applies save-time rules: placeholder title, trimmed and capped text,
    /// and an end strictly after the start.
    pub fn normalized(mut self) -> Self {
        let title = truncate_chars(self.title.trim(), TITLE_MAX_CHARS);
        self.title = if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };

        self.description = self
            .description
            .as_deref()
            .map(|text| truncate_chars(text.trim(), DESCRIPTION_MAX_CHARS))
            .filter(|text| !text.is_empty());

        if self.end <= self.start {
            self.end = self.start + Duration::hours(1);
        }

        if self.color.trim().is_empty() {
            self.color = default_color();
        }

        self
    }

    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
    }
}

/// Partial field update. `None` leaves the field untouched; for the optional
/// fields `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub color: Option<String>,
    pub category: Option<Option<String>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Patch that overwrites every field with the values of `event`.
    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            title: Some(event.title.clone()),
            description: Some(event.description.clone()),
            start: Some(event.start),
            end: Some(event.end),
            color: Some(event.color.clone()),
            category: Some(event.category.clone()),
        }
    }
}

pub fn new_event_id() -> String {
    format!("evt-{}", Uuid::new_v4().simple())
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .expect("valid date")
            .and_hms_opt(h, m, 0)
            .expect("valid time")
    }

    #[test]
    fn end_equal_to_start_is_pushed_one_hour() {
        let event = CalendarEvent::new("Standup", at(9, 0), at(9, 0)).normalized();
        assert_eq!(event.end, at(10, 0));
    }

    #[test]
    fn end_before_start_is_pushed_one_hour() {
        let event = CalendarEvent::new("Standup", at(9, 0), at(8, 0)).normalized();
        assert_eq!(event.end, at(10, 0));
    }

    #[test]
    fn blank_title_becomes_placeholder() {
        let event = CalendarEvent::new("   ", at(9, 0), at(10, 0)).normalized();
        assert_eq!(event.title, UNTITLED);
    }

    #[test]
    fn text_fields_are_trimmed_and_capped() {
        let mut event = CalendarEvent::new(format!("  {}  ", "x".repeat(150)), at(9, 0), at(10, 0));
        event.description = Some("   ".to_string());
        let event = event.normalized();
        assert_eq!(event.title.chars().count(), TITLE_MAX_CHARS);
        assert_eq!(event.description, None);
    }

    #[test]
    fn draft_on_bare_date_starts_at_nine() {
        let draft = CalendarEvent::draft_at(at(0, 0));
        assert_eq!(draft.start, at(9, 0));
        assert_eq!(draft.end, at(10, 0));
        assert!(draft.title.is_empty());
        assert!(draft.id.starts_with("evt-"));
    }

    #[test]
    fn draft_keeps_explicit_time() {
        let draft = CalendarEvent::draft_at(at(6, 15));
        assert_eq!(draft.start, at(6, 15));
        assert_eq!(draft.end, at(7, 15));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let original = CalendarEvent::new("Review", at(13, 0), at(14, 0));
        let mut patched = original.clone();
        patched.apply(&EventPatch::default());
        assert_eq!(patched, original);
        assert!(EventPatch::default().is_empty());
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let mut event = CalendarEvent::new("Review", at(13, 0), at(14, 0));
        event.category = Some("work".to_string());
        event.apply(&EventPatch {
            category: Some(None),
            title: Some("Retro".to_string()),
            ..EventPatch::default()
        });
        assert_eq!(event.category, None);
        assert_eq!(event.title, "Retro");
    }

    #[test]
    fn serializes_with_camel_case_date_fields() {
        let event = CalendarEvent::new("Lunch", at(12, 0), at(13, 0));
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["startDate"], "2024-03-10T12:00:00");
        assert_eq!(value["endDate"], "2024-03-10T13:00:00");
        let back: CalendarEvent = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, event);
    }
}
