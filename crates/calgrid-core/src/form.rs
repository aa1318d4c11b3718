use anyhow::Context;
use chrono::{Duration, NaiveDateTime};

use crate::datetime::{parse_datetime_local, to_datetime_local};
use crate::event::{CalendarEvent, PRESET_COLORS, new_event_id};

/// Editable state of the create/edit form. Date-times are held in their
/// `YYYY-MM-DDTHH:mm` field representation until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventForm {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub color: String,
    pub category: Option<String>,
}

impl EventForm {
    /// Empty form starting now and lasting one hour.
    pub fn blank(now: NaiveDateTime) -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            start: to_datetime_local(&now),
            end: to_datetime_local(&(now + Duration::hours(1))),
            color: PRESET_COLORS[0].to_string(),
            category: None,
        }
    }

    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            id: Some(event.id.clone()),
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            start: to_datetime_local(&event.start),
            end: to_datetime_local(&event.end),
            color: event.color.clone(),
            category: event.category.clone(),
        }
    }

    /// Builds the event to save. Keeps the id of the event being edited, or
    /// mints a new one.
    pub fn submit(&self) -> anyhow::Result<CalendarEvent> {
        let start = parse_datetime_local(&self.start).context("invalid start")?;
        let end = parse_datetime_local(&self.end).context("invalid end")?;

        let event = CalendarEvent {
            id: self.id.clone().unwrap_or_else(new_event_id),
            title: self.title.clone(),
            description: Some(self.description.clone()),
            start,
            end,
            color: self.color.clone(),
            category: self.category.clone(),
        };

        Ok(event.normalized())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::event::UNTITLED;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .expect("valid date")
            .and_hms_opt(h, m, 0)
            .expect("valid time")
    }

    #[test]
    fn blank_form_spans_one_hour_with_first_preset() {
        let form = EventForm::blank(at(9, 30));
        assert_eq!(form.start, "2024-03-10T09:30");
        assert_eq!(form.end, "2024-03-10T10:30");
        assert_eq!(form.color, PRESET_COLORS[0]);
    }

    #[test]
    fn submit_keeps_edited_id() {
        let mut event = CalendarEvent::new("Gym", at(7, 0), at(8, 0));
        event.category = Some("health".to_string());
        let mut form = EventForm::from_event(&event);
        form.title = "Gym (legs)".to_string();

        let saved = form.submit().expect("submit");
        assert_eq!(saved.id, event.id);
        assert_eq!(saved.title, "Gym (legs)");
        assert_eq!(saved.category.as_deref(), Some("health"));
    }

    #[test]
    fn submit_normalizes_title_and_interval() {
        let mut form = EventForm::blank(at(9, 0));
        form.end = form.start.clone();
        form.description = "  ".to_string();

        let saved = form.submit().expect("submit");
        assert!(saved.id.starts_with("evt-"));
        assert_eq!(saved.title, UNTITLED);
        assert_eq!(saved.description, None);
        assert_eq!(saved.end, at(10, 0));
    }

    #[test]
    fn submit_rejects_unparsable_start() {
        let mut form = EventForm::blank(at(9, 0));
        form.start = "tomorrow".to_string();
        assert!(form.submit().is_err());
    }
}
