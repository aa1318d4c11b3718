use anyhow::Context;
use tracing::{debug, info, warn};

use crate::event::{CalendarEvent, EventPatch};
use crate::storage::KeyValueStore;

pub const DEFAULT_STORAGE_KEY: &str = "calendar_events_v1";

/// Canonical, insertion-ordered event list. Every effective mutation writes
/// the whole list back to storage; write failures are logged and otherwise
/// ignored, the in-memory list stays authoritative.
#[derive(Debug)]
pub struct EventStore<S> {
    storage: S,
    key: String,
    events: Vec<CalendarEvent>,
}

impl<S: KeyValueStore> EventStore<S> {
    /// Rehydrates from `storage` under `key`, falling back to `initial` when
    /// nothing is stored or the stored payload does not parse.
    #[tracing::instrument(skip(storage, initial))]
    pub fn open(storage: S, key: &str, initial: Vec<CalendarEvent>) -> Self {
        let mut store = Self {
            storage,
            key: key.to_string(),
            events: Vec::new(),
        };

        match store.load() {
            Ok(Some(events)) => {
                info!(count = events.len(), "rehydrated events from storage");
                store.events = events;
            }
            Ok(None) => {
                debug!(count = initial.len(), "nothing stored; using initial events");
                store.events = initial;
                store.persist();
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "discarding unreadable stored events");
                store.events = initial;
                store.persist();
            }
        }

        store
    }

    fn load(&self) -> anyhow::Result<Option<Vec<CalendarEvent>>> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        let events = serde_json::from_str::<Vec<CalendarEvent>>(&raw)
            .with_context(|| format!("failed parsing stored events under {}", self.key))?;
        Ok(Some(events))
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.events)
            .context("failed serializing events")
            .and_then(|payload| self.storage.set(&self.key, &payload));

        match result {
            Ok(()) => debug!(key = %self.key, count = self.events.len(), "persisted events"),
            Err(err) => warn!(key = %self.key, error = %format!("{err:#}"), "failed to persist events"),
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn snapshot(&self) -> Vec<CalendarEvent> {
        self.events.clone()
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    pub fn add(&mut self, event: CalendarEvent) {
        self.events.push(event);
        self.persist();
    }

    /// Returns whether an event with `id` existed.
    #[tracing::instrument(skip(self, patch))]
    pub fn update(&mut self, id: &str, patch: &EventPatch) -> bool {
        let Some(event) = self.events.iter_mut().find(|event| event.id == id) else {
            debug!("update for unknown id ignored");
            return false;
        };
        event.apply(patch);
        self.persist();
        true
    }

    /// Returns whether an event with `id` was removed.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        if self.events.len() == before {
            debug!("delete for unknown id ignored");
            return false;
        }
        self.persist();
        true
    }

    #[tracing::instrument(skip(self, events), fields(count = events.len()))]
    pub fn replace_all(&mut self, events: Vec<CalendarEvent>) {
        self.events = events;
        self.persist();
    }
}
