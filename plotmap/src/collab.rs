//! Contracts for the collaborators the map core talks to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, ClipboardError, StoreError};
use crate::model::{GeometryRecord, Level, Notification, UnitRecord, UnitStatus};

/// Which rows the property table shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFilter {
    #[default]
    Active,
    All,
}

impl UnitFilter {
    pub fn admits(&self, status: UnitStatus) -> bool {
        match self {
            UnitFilter::Active => status.is_active(),
            UnitFilter::All => true,
        }
    }
}

pub trait UnitProvider {
    fn list_units(&self, filter: UnitFilter) -> Result<Vec<Option<UnitRecord>>, StoreError>;
}

impl UnitProvider for Vec<Option<UnitRecord>> {
    fn list_units(&self, filter: UnitFilter) -> Result<Vec<Option<UnitRecord>>, StoreError> {
        Ok(match filter {
            UnitFilter::All => self.clone(),
            UnitFilter::Active => self
                .iter()
                .filter(|u| u.as_ref().map_or(false, |u| filter.admits(u.status_or_default())))
                .cloned()
                .collect(),
        })
    }
}

/// Read side of geometry persistence: the outlines saved so far.
pub trait GeometrySource {
    fn load_geometry(&self) -> Result<Vec<GeometryRecord>, StoreError>;
}

/// Authoritative remote geometry persistence.
pub trait GeometryStore: GeometrySource {
    fn save_geometry(&mut self, batch: &[GeometryRecord]) -> Result<(), StoreError>;
}

/// Fire-and-forget user feedback.
pub trait Notifier {
    fn notify(&mut self, message: &str, level: Level);
}

impl Notifier for Vec<Notification> {
    fn notify(&mut self, message: &str, level: Level) {
        self.push(Notification {
            message: message.to_string(),
            level,
        });
    }
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// String key-value storage backing the recovery cache (browser `localStorage` or memory).
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&mut self, key: &str);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}
