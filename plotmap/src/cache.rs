//! Offline recovery cache.
//!
//! A best-effort local copy of the working polygons, written on every persist
//! so an editor's work survives a reload even if the remote save failed.
//! Layout: `polygon_{n}` (1-based) holds one JSON entry, `polygonsCount`
//! holds the count and `polygons_saved = "true"` marks a complete write.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collab::KvStore;
use crate::error::CacheError;
use crate::geometry::limits::{in_coord_bounds, MAX_POLYGONS, MAX_VERTICES_PER_POLYGON};
use crate::geometry::polygon::Polygon;
use crate::model::{Binding, GeometryRecord, UnitKey, Vertex};

pub const COUNT_KEY: &str = "polygonsCount";
pub const SAVED_KEY: &str = "polygons_saved";

pub fn entry_key(index: usize) -> String {
    format!("polygon_{}", index + 1)
}

/// A stored entry. Older snapshots hold bare vertex arrays without unit identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CachedPolygon {
    Keyed(GeometryRecord),
    Positional(Vec<Vertex>),
}

impl CachedPolygon {
    pub fn vertices(&self) -> &[Vertex] {
        match self {
            CachedPolygon::Keyed(r) => &r.vertices,
            CachedPolygon::Positional(v) => v,
        }
    }

    fn is_valid(&self) -> bool {
        let v = self.vertices();
        !v.is_empty()
            && v.len() <= MAX_VERTICES_PER_POLYGON
            && v.iter().all(|p| in_coord_bounds(p.x) && in_coord_bounds(p.y))
    }
}

/// What was read back: `entries[i]` is `polygon_{i+1}`, `None` where missing or malformed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub count: usize,
    pub entries: Vec<Option<CachedPolygon>>,
}

impl Snapshot {
    /// Overlay cached outlines onto freshly derived bindings.
    ///
    /// Keyed entries are matched by unit identity. Positional entries are only
    /// trusted when the stored count equals the binding count; otherwise they
    /// would pair outlines with the wrong units. Returns the number applied.
    pub fn apply_to(&self, bindings: &mut [Binding]) -> usize {
        let keyed: HashMap<UnitKey, &GeometryRecord> = self
            .entries
            .iter()
            .flatten()
            .filter_map(|e| match e {
                CachedPolygon::Keyed(r) => Some((r.key(), r)),
                CachedPolygon::Positional(_) => None,
            })
            .collect();
        let positional_ok = self.count == bindings.len();
        let has_positional = self
            .entries
            .iter()
            .flatten()
            .any(|e| matches!(e, CachedPolygon::Positional(_)));
        if has_positional && !positional_ok {
            log::warn!(
                "recovery cache holds {} polygons but {} units are bound; skipping unkeyed entries",
                self.count,
                bindings.len()
            );
        }

        let mut applied = 0;
        for (i, binding) in bindings.iter_mut().enumerate() {
            if binding.is_sentinel() {
                continue;
            }
            if let Some(rec) = keyed.get(&binding.key()) {
                binding.polygon = Polygon::new(rec.vertices.clone());
                applied += 1;
            } else if positional_ok {
                if let Some(Some(CachedPolygon::Positional(v))) = self.entries.get(i) {
                    binding.polygon = Polygon::new(v.clone());
                    applied += 1;
                }
            }
        }
        applied
    }
}

pub struct RecoveryCache<S: KvStore> {
    store: S,
}

impl<S: KvStore> RecoveryCache<S> {
    pub fn new(store: S) -> Self {
        RecoveryCache { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn has_marker(&self) -> bool {
        self.store.get(SAVED_KEY).as_deref() == Some("true")
    }

    pub fn write(&mut self, records: &[GeometryRecord]) -> Result<(), CacheError> {
        for (i, rec) in records.iter().enumerate() {
            // Sentinels have no outline to recover; their slot stays empty.
            if rec.vertices.is_empty() {
                self.store.remove(&entry_key(i));
                continue;
            }
            let json = serde_json::to_string(rec)?;
            self.store.set(&entry_key(i), &json)?;
        }
        self.store.set(COUNT_KEY, &records.len().to_string())?;
        self.store.set(SAVED_KEY, "true")?;
        log::debug!("recovery cache holds {} polygons", records.len());
        Ok(())
    }

    fn stored_count(&self) -> usize {
        match self.store.get(COUNT_KEY).and_then(|s| s.trim().parse::<usize>().ok()) {
            Some(n) => n.min(MAX_POLYGONS),
            None => {
                let mut n = 0;
                while n < MAX_POLYGONS && self.store.get(&entry_key(n)).is_some() {
                    n += 1;
                }
                n
            }
        }
    }

    pub fn read(&self) -> Option<Snapshot> {
        let count = self.stored_count();
        if count == 0 {
            return None;
        }
        let entries = (0..count)
            .map(|i| {
                let raw = self.store.get(&entry_key(i))?;
                match serde_json::from_str::<CachedPolygon>(&raw) {
                    Ok(entry) if entry.is_valid() => Some(entry),
                    Ok(entry) if entry.vertices().is_empty() => {
                        log::debug!("recovery entry {} has no outline", i + 1);
                        None
                    }
                    Ok(_) => {
                        log::error!("recovery entry {} has an invalid outline", i + 1);
                        None
                    }
                    Err(e) => {
                        log::error!("recovery entry {} could not be parsed: {}", i + 1, e);
                        None
                    }
                }
            })
            .collect();
        Some(Snapshot { count, entries })
    }

    /// Remove every entry, the count and the marker.
    pub fn clear(&mut self) {
        let count = self.stored_count();
        let mut i = 0;
        while i <= count || (i < MAX_POLYGONS && self.store.get(&entry_key(i)).is_some()) {
            self.store.remove(&entry_key(i));
            i += 1;
        }
        self.store.remove(COUNT_KEY);
        self.store.remove(SAVED_KEY);
    }
}
