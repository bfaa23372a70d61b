//! Last-seen version of every event, keyed by uid

use std::collections::HashMap;

use contracts::Event;

/// Informer-style local store
#[derive(Debug, Default)]
pub struct EventCache {
    entries: HashMap<String, Event>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event`, returning the version it replaces
    pub fn upsert(&mut self, event: Event) -> Option<Event> {
        self.entries.insert(event.uid().to_string(), event)
    }

    pub fn remove(&mut self, uid: &str) -> Option<Event> {
        self.entries.remove(uid)
    }

    /// Drop everything and load a fresh listing
    pub fn replace<'a>(&mut self, items: impl IntoIterator<Item = &'a Event>) {
        self.entries.clear();
        for event in items {
            self.entries.insert(event.uid().to_string(), event.clone());
        }
    }

    pub fn get(&self, uid: &str) -> Option<&Event> {
        self.entries.get(uid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
