use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::bucket::bucket_by_day;
use crate::datetime;
use crate::event::{CalendarEvent, EventPatch};
use crate::form::EventForm;
use crate::grid::{MonthCell, month_cells, week_grid};
use crate::layout::{DayColumn, WeekLayout};
use crate::navigation::{CalendarNavigation, DayFocus, FocusKey, FocusOutcome, ViewMode};
use crate::storage::KeyValueStore;
use crate::store::{DEFAULT_STORAGE_KEY, EventStore};

/// Notification sent to the host after an effective mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventChange {
    Added(CalendarEvent),
    Updated { id: String, patch: EventPatch },
    Deleted { id: String },
}

pub trait EventListener {
    fn on_change(&mut self, change: &EventChange);
}

impl<F> EventListener for F
where
    F: FnMut(&EventChange),
{
    fn on_change(&mut self, change: &EventChange) {
        self(change)
    }
}

#[derive(Debug, Clone)]
pub struct CalendarOptions {
    pub initial_events: Vec<CalendarEvent>,
    pub initial_date: Option<NaiveDate>,
    pub initial_view: ViewMode,
    pub storage_key: String,
    pub hour_height: f64,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            initial_events: Vec::new(),
            initial_date: None,
            initial_view: ViewMode::Month,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            hour_height: crate::layout::DEFAULT_HOUR_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthView<'a> {
    pub title: String,
    pub anchor: NaiveDate,
    pub cells: Vec<MonthCell<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekView<'a> {
    pub title: String,
    pub week_start: NaiveDate,
    pub total_height: f64,
    pub columns: Vec<DayColumn<'a>>,
}

/// Event store, navigation state and week geometry behind one host-facing
/// surface. Listeners are called synchronously, in registration order, once
/// per effective add, update or delete.
pub struct Calendar<S> {
    store: EventStore<S>,
    navigation: CalendarNavigation,
    layout: WeekLayout,
    focus: DayFocus,
    listeners: Vec<Box<dyn EventListener>>,
}

impl<S: KeyValueStore> Calendar<S> {
    pub fn open(storage: S, options: CalendarOptions) -> Self {
        let store = EventStore::open(storage, &options.storage_key, options.initial_events);
        let anchor = options.initial_date.unwrap_or_else(datetime::today);
        info!(
            anchor = %anchor,
            view = options.initial_view.as_key(),
            events = store.events().len(),
            "opened calendar"
        );

        Self {
            store,
            navigation: CalendarNavigation::new(anchor, options.initial_view),
            layout: WeekLayout::new(options.hour_height),
            focus: DayFocus::default(),
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, change: EventChange) {
        debug!(?change, listeners = self.listeners.len(), "emitting change");
        for listener in &mut self.listeners {
            listener.on_change(&change);
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        self.store.events()
    }

    pub fn store(&self) -> &EventStore<S> {
        &self.store
    }

    pub fn navigation(&self) -> &CalendarNavigation {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut CalendarNavigation {
        &mut self.navigation
    }

    pub fn layout(&self) -> &WeekLayout {
        &self.layout
    }

    pub fn view(&self) -> ViewMode {
        self.navigation.view()
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.navigation.set_view(view);
    }

    pub fn prev(&mut self) {
        self.navigation.prev();
    }

    pub fn next(&mut self) {
        self.navigation.next();
    }

    pub fn today(&mut self) {
        self.navigation.today();
    }

    /// Create form for a grid day or a week slot.
    pub fn draft_at(&self, at: NaiveDateTime) -> EventForm {
        EventForm::from_event(&CalendarEvent::draft_at(at))
    }

    pub fn edit_form(&self, id: &str) -> Option<EventForm> {
        self.store.get(id).map(EventForm::from_event)
    }

    /// Inserts or, when the id is already known, overwrites every field.
    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    pub fn save(&mut self, event: CalendarEvent) -> EventChange {
        let event = event.normalized();
        let change = if self.store.contains(&event.id) {
            let patch = EventPatch::from_event(&event);
            self.store.update(&event.id, &patch);
            info!("updated event");
            EventChange::Updated {
                id: event.id.clone(),
                patch,
            }
        } else {
            self.store.add(event.clone());
            info!("added event");
            EventChange::Added(event)
        };
        self.emit(change.clone());
        change
    }

    pub fn submit(&mut self, form: &EventForm) -> anyhow::Result<EventChange> {
        let event = form.submit()?;
        Ok(self.save(event))
    }

    pub fn update(&mut self, id: &str, patch: EventPatch) -> bool {
        if !self.store.update(id, &patch) {
            return false;
        }
        self.emit(EventChange::Updated {
            id: id.to_string(),
            patch,
        });
        true
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> bool {
        if !self.store.delete(id) {
            return false;
        }
        info!("deleted event");
        self.emit(EventChange::Deleted { id: id.to_string() });
        true
    }

    /// Bulk import or reset; not reported to listeners.
    pub fn replace_all(&mut self, events: Vec<CalendarEvent>) {
        self.store.replace_all(events);
    }

    /// Enter on a focused day yields a create form for that day.
    pub fn handle_key(&mut self, key: FocusKey) -> Option<EventForm> {
        match self.focus.handle_key(key, self.navigation.anchor()) {
            FocusOutcome::Moved(_) => None,
            FocusOutcome::OpenCreate(day) => Some(self.draft_at(day.and_time(chrono::NaiveTime::MIN))),
        }
    }

    pub fn focused_day(&self) -> Option<NaiveDate> {
        self.focus.focused()
    }

    pub fn month_view(&self) -> MonthView<'_> {
        self.month_view_at(datetime::today())
    }

    pub fn month_view_at(&self, today: NaiveDate) -> MonthView<'_> {
        let anchor = self.navigation.anchor();
        let buckets = bucket_by_day(self.store.events());
        MonthView {
            title: self.navigation.title(),
            anchor,
            cells: month_cells(anchor, &buckets, today),
        }
    }

    pub fn week_view(&self) -> WeekView<'_> {
        let week_start = self.navigation.week_start();
        let week = week_grid(week_start);
        let buckets = bucket_by_day(self.store.events());
        let week_end = datetime::add_days(week_start, 6);
        WeekView {
            title: format!(
                "{} - {}",
                week_start.format("%b %d"),
                week_end.format("%b %d, %Y")
            ),
            week_start,
            total_height: self.layout.total_height(),
            columns: self.layout.place_week(&week, &buckets),
        }
    }

    pub fn slot_at(&self, day: NaiveDate, click_y: f64, column_top: f64, scroll_top: f64) -> NaiveDateTime {
        self.layout.inverse_layout(day, click_y, column_top, scroll_top)
    }
}
