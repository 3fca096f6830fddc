//! Edit-mode controller.
//!
//! Gates every mutation behind the edit-mode capability flag and owns the
//! commands of the developer panel: visibility toggles, clipboard export,
//! persist and restore.

use std::sync::Arc;

use crate::cache::RecoveryCache;
use crate::collab::{Clipboard, GeometryStore, KvStore, Notifier};
use crate::config::MapConfig;
use crate::error::{GeometryError, PersistError, StoreError};
use crate::json;
use crate::model::{Binding, GeometryRecord, Level, Vertex};
use crate::session::{DragState, EditSession};

pub const MSG_SAVED: &str = "Changes saved to the database";
pub const MSG_SAVE_FAILED: &str = "Could not save changes";
pub const MSG_RESTORED: &str = "Changes reverted and removed from storage";
pub const MSG_STORAGE_CLEARED: &str = "Stored polygon data cleared";
pub const MSG_MIN_VERTICES: &str = "Polygon must have at least 3 vertices";

/// A consistent copy of the working polygons, taken when a persist starts.
#[derive(Clone, Debug)]
pub struct PersistBatch {
    pub revision: u64,
    /// Entries for the remote store; sentinel units are left out.
    pub records: Vec<GeometryRecord>,
    snapshot: Arc<Vec<Binding>>,
}

impl PersistBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.snapshot
    }
}

fn to_record(b: &Binding) -> GeometryRecord {
    GeometryRecord {
        building_number: b.building_number.clone(),
        unit_number: b.unit_number.clone(),
        vertices: b.polygon.vertices().to_vec(),
    }
}

pub struct EditController {
    enabled: bool,
    persist_across_reload: bool,
    baseline: Vec<Binding>,
    session: EditSession,
    initialized: bool,
    seeded_from_cache: bool,
}

impl EditController {
    pub fn new(config: &MapConfig) -> Self {
        EditController {
            enabled: config.edit_mode,
            persist_across_reload: config.persist_changes,
            baseline: Vec::new(),
            session: EditSession::new(Vec::new()),
            initialized: false,
            seeded_from_cache: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn working(&self) -> &[Binding] {
        self.session.working()
    }

    pub fn baseline(&self) -> &[Binding] {
        &self.baseline
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.session.has_unsaved_edits()
    }

    pub fn seeded_from_cache(&self) -> bool {
        self.seeded_from_cache
    }

    /// Take in a freshly derived binding list.
    ///
    /// The first call may seed the working copy from the recovery cache. Later
    /// calls keep visibility and any active drag. Unsaved outlines are
    /// re-keyed onto the new list; otherwise the fresh outlines are taken.
    pub fn load_bindings<S: KvStore>(&mut self, bindings: Vec<Binding>, cache: &RecoveryCache<S>) {
        self.baseline = bindings.clone();
        if !self.initialized {
            self.initialized = true;
            let mut working = bindings;
            if self.persist_across_reload && cache.has_marker() {
                if let Some(snapshot) = cache.read() {
                    let applied = snapshot.apply_to(&mut working);
                    if applied > 0 {
                        log::info!("restored {} polygons from recovery cache", applied);
                        self.session.reset(working);
                        self.session.mark_edited();
                        self.seeded_from_cache = true;
                        return;
                    }
                }
            } else if !self.persist_across_reload {
                log::debug!("recovery cache ignored, persist_changes is off");
            }
            self.session.reset(working);
            return;
        }
        if self.session.has_unsaved_edits() {
            self.session.rekey(bindings);
        } else {
            self.session.refresh(bindings);
        }
    }

    fn guard(&self) -> Result<(), GeometryError> {
        if self.enabled {
            Ok(())
        } else {
            Err(GeometryError::EditDisabled)
        }
    }

    pub fn toggle_area_visibility(&mut self, index: usize) -> bool {
        self.enabled && self.session.toggle_visibility(index)
    }

    pub fn show_all_areas(&mut self) {
        if self.enabled {
            self.session.set_all_visible(true);
        }
    }

    pub fn hide_all_areas(&mut self) {
        if self.enabled {
            self.session.set_all_visible(false);
        }
    }

    /// Outside edit mode every polygon is shown.
    pub fn is_area_visible(&self, index: usize) -> bool {
        !self.enabled || self.session.is_visible(index)
    }

    pub fn insert_vertex(
        &mut self,
        polygon: usize,
        after: usize,
        notifier: &mut dyn Notifier,
    ) -> Result<(), GeometryError> {
        self.guard()?;
        match self.session.insert_vertex(polygon, after) {
            Ok(()) => {
                notifier.notify(&format!("Added vertex to polygon {}", polygon + 1), Level::Success);
                Ok(())
            }
            Err(e) => {
                log::warn!("insert rejected: {}", e);
                notifier.notify(&e.to_string(), Level::Error);
                Err(e)
            }
        }
    }

    pub fn remove_vertex(
        &mut self,
        polygon: usize,
        vertex: usize,
        notifier: &mut dyn Notifier,
    ) -> Result<(), GeometryError> {
        self.guard()?;
        match self.session.remove_vertex(polygon, vertex) {
            Ok(()) => Ok(()),
            Err(e @ GeometryError::TooFewVertices { .. }) => {
                notifier.notify(MSG_MIN_VERTICES, Level::Error);
                Err(e)
            }
            Err(e) => {
                log::warn!("remove rejected: {}", e);
                notifier.notify(&e.to_string(), Level::Error);
                Err(e)
            }
        }
    }

    pub fn drag(&self) -> DragState {
        self.session.drag()
    }

    pub fn begin_vertex_drag(&mut self, polygon: usize, vertex: usize, cursor: Vertex) -> Result<(), GeometryError> {
        self.guard()?;
        self.session.begin_vertex_drag(polygon, vertex, cursor)
    }

    pub fn begin_polygon_drag(&mut self, polygon: usize, cursor: Vertex) -> Result<(), GeometryError> {
        self.guard()?;
        self.session.begin_polygon_drag(polygon, cursor)
    }

    pub fn update_drag(&mut self, cursor: Vertex) -> bool {
        self.enabled && self.session.update_drag(cursor)
    }

    pub fn end_drag(&mut self) -> bool {
        self.session.end_drag()
    }

    /// Copy the working polygons as source text. Failure is logged, never fatal.
    pub fn copy_coordinates_to_clipboard(&self, clipboard: &mut dyn Clipboard) -> bool {
        let text = json::coordinates_source(self.session.working().iter().map(|b| &b.polygon));
        match clipboard.write_text(&text) {
            Ok(()) => {
                log::debug!("copied {} polygons to clipboard", self.session.len());
                true
            }
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }

    /// First half of a persist: snapshot the working copy and write the recovery cache.
    pub fn begin_persist<S: KvStore>(&self, cache: &mut RecoveryCache<S>) -> Result<PersistBatch, PersistError> {
        if !self.enabled {
            return Err(PersistError::EditDisabled);
        }
        let snapshot = self.session.snapshot();
        let all: Vec<GeometryRecord> = snapshot.iter().map(to_record).collect();
        if let Err(e) = cache.write(&all) {
            log::error!("recovery cache write failed: {}", e);
        }
        let records = snapshot
            .iter()
            .filter(|b| !b.is_sentinel())
            .map(to_record)
            .collect();
        Ok(PersistBatch {
            revision: self.session.revision(),
            records,
            snapshot,
        })
    }

    /// Second half of a persist. Edits are kept either way.
    pub fn finish_persist(
        &mut self,
        batch: &PersistBatch,
        outcome: Result<(), StoreError>,
        notifier: &mut dyn Notifier,
    ) -> bool {
        match outcome {
            Ok(()) => {
                if !self.session.mark_saved(batch.revision) {
                    log::debug!("working copy changed while saving; keeping unsaved flag");
                }
                log::info!("saved geometry for {} units", batch.len());
                notifier.notify(MSG_SAVED, Level::Success);
                true
            }
            Err(e) => {
                log::error!("{}", e);
                notifier.notify(MSG_SAVE_FAILED, Level::Error);
                false
            }
        }
    }

    pub fn persist_changes<S: KvStore>(
        &mut self,
        store: &mut dyn GeometryStore,
        cache: &mut RecoveryCache<S>,
        notifier: &mut dyn Notifier,
    ) -> bool {
        let batch = match self.begin_persist(cache) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("persist refused: {}", e);
                return false;
            }
        };
        let outcome = store.save_geometry(&batch.records);
        self.finish_persist(&batch, outcome, notifier)
    }

    /// Drop the working copy, go back to the last derived bindings and wipe the cache.
    pub fn restore_previous_version<S: KvStore>(
        &mut self,
        cache: &mut RecoveryCache<S>,
        notifier: &mut dyn Notifier,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        self.session.reset(self.baseline.clone());
        self.seeded_from_cache = false;
        cache.clear();
        notifier.notify(MSG_RESTORED, Level::Success);
        true
    }

    pub fn clear_stored_data<S: KvStore>(&mut self, cache: &mut RecoveryCache<S>, notifier: &mut dyn Notifier) {
        if !self.enabled {
            return;
        }
        cache.clear();
        notifier.notify(MSG_STORAGE_CLEARED, Level::Info);
    }
}
