//! The map editor: binds units to outlines and routes gestures to the
//! surface, the edit controller and the table bridge.

use crate::bridge::{CrossViewBridge, TableView};
use crate::cache::RecoveryCache;
use crate::collab::{Clipboard, GeometrySource, GeometryStore, KvStore, UnitFilter, UnitProvider};
use crate::config::MapConfig;
use crate::controller::{EditController, PersistBatch};
use crate::error::{ConfigError, GeometryError, PersistError, StoreError};
use crate::json;
use crate::model::{Binding, Level, Notification, UnitRecord, Vertex};
use crate::registry;
use crate::surface::{self, Device, Hit, MapSurface, Tooltip};
use crate::svg::{self, Frame};

pub const MSG_ALREADY_SOLD: &str = "This unit has already been sold";

pub struct MapEditor {
    config: MapConfig,
    units: Vec<Option<UnitRecord>>,
    controller: EditController,
    surface: MapSurface,
    table: TableView,
    bridge: CrossViewBridge,
    cache: RecoveryCache<Box<dyn KvStore>>,
    notices: Vec<Notification>,
}

impl MapEditor {
    pub fn new(config: MapConfig, recovery: Box<dyn KvStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(MapEditor {
            controller: EditController::new(&config),
            surface: MapSurface::new(Device::Pointer),
            table: TableView::new(&config),
            bridge: CrossViewBridge::new(&config),
            cache: RecoveryCache::new(recovery),
            units: Vec::new(),
            notices: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn units(&self) -> &[Option<UnitRecord>] {
        &self.units
    }

    pub fn bindings(&self) -> &[Binding] {
        self.controller.working()
    }

    pub fn controller(&self) -> &EditController {
        &self.controller
    }

    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MapSurface {
        &mut self.surface
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableView {
        &mut self.table
    }

    pub fn cache(&self) -> &RecoveryCache<Box<dyn KvStore>> {
        &self.cache
    }

    /// Take the pending user notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notices)
    }

    /// Fetch units and, when a store is given, their persisted outlines.
    ///
    /// A failed geometry load is not fatal: units keep any vertices they
    /// carry and the rest fall back to the table or placeholder.
    pub fn load(
        &mut self,
        provider: &dyn UnitProvider,
        store: Option<&dyn GeometrySource>,
    ) -> Result<usize, StoreError> {
        let mut units = provider.list_units(UnitFilter::All)?;
        if let Some(store) = store {
            match store.load_geometry() {
                Ok(records) => {
                    let matched = registry::apply_persisted_geometry(&mut units, &records);
                    log::info!("applied {} persisted outlines", matched);
                }
                Err(e) => log::warn!("{}", e),
            }
        }
        let n = units.len();
        self.set_units(units);
        Ok(n)
    }

    /// Replace the unit list and re-derive bindings.
    pub fn set_units(&mut self, units: Vec<Option<UnitRecord>>) {
        let bindings = registry::map_units_to_bindings(&units);
        self.controller.load_bindings(bindings, &self.cache);
        self.table.set_units(&units, self.table.filter());
        self.surface.retain_within(self.controller.working().len());
        self.units = units;
    }

    pub fn set_table_filter(&mut self, filter: UnitFilter) {
        self.table.set_units(&self.units, filter);
    }

    fn hit(&self, p: Vertex) -> Hit {
        surface::pick(
            self.controller.working(),
            p,
            self.controller.is_enabled(),
            |i| self.controller.is_area_visible(i),
            self.surface.hovered_vertex(),
            &self.config,
        )
    }

    /// Pointer moved to logical point `(x, y)`. Returns true if the frame changed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let p = Vertex::new(x, y);
        if !p.is_finite() {
            return false;
        }
        if self.controller.drag().is_active() {
            return self.controller.update_drag(p);
        }
        let hit = self.hit(p);
        if self.controller.is_enabled() {
            let hovered_vertex = match hit {
                Hit::Vertex { polygon, vertex } | Hit::Delete { polygon, vertex } => Some((polygon, vertex)),
                _ => self.held_vertex_group(p),
            };
            let changed = hovered_vertex != self.surface.hovered_vertex();
            self.surface.set_hovered_vertex(hovered_vertex);
            return changed;
        }
        let polygon = match hit {
            Hit::Polygon { polygon } => Some(polygon),
            _ => None,
        };
        let before = self.surface.hovered();
        self.surface.hover(polygon, p);
        before != self.surface.hovered() || polygon.is_some()
    }

    // The hovered vertex stays hovered while the pointer travels to its delete control.
    fn held_vertex_group(&self, p: Vertex) -> Option<(usize, usize)> {
        let (polygon, vertex) = self.surface.hovered_vertex()?;
        if !self.controller.is_area_visible(polygon) {
            return None;
        }
        let v = self.controller.working().get(polygon)?.polygon.vertex(vertex)?;
        surface::in_vertex_group(v, p, &self.config).then_some((polygon, vertex))
    }

    pub fn pointer_leave_map(&mut self) {
        self.surface.leave();
    }

    /// Press at `(x, y)`. In edit mode this may start a vertex or polygon drag.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        let p = Vertex::new(x, y);
        if !self.controller.is_enabled() || !p.is_finite() {
            return false;
        }
        let started = match self.hit(p) {
            Hit::Vertex { polygon, vertex } => self.controller.begin_vertex_drag(polygon, vertex, p),
            Hit::Centroid { polygon } => self.controller.begin_polygon_drag(polygon, p),
            _ => return false,
        };
        match started {
            Ok(()) => true,
            Err(e) => {
                log::debug!("drag not started: {}", e);
                false
            }
        }
    }

    pub fn pointer_up(&mut self) -> bool {
        self.controller.end_drag()
    }

    /// Touch start: begins a drag in edit mode, otherwise flashes the touched polygon.
    pub fn touch_start(&mut self, x: f64, y: f64, now: f64) -> bool {
        if self.controller.is_enabled() {
            return self.pointer_down(x, y);
        }
        match self.hit(Vertex::new(x, y)) {
            Hit::Polygon { polygon } => {
                self.surface.flash(polygon, now, &self.config);
                true
            }
            _ => false,
        }
    }

    fn edit_click(&mut self, hit: Hit) -> Result<bool, GeometryError> {
        match hit {
            Hit::Insert { polygon, after } => {
                self.controller.insert_vertex(polygon, after, &mut self.notices)?;
                Ok(true)
            }
            Hit::Delete { polygon, vertex } => {
                self.controller.remove_vertex(polygon, vertex, &mut self.notices)?;
                self.surface.set_hovered_vertex(None);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Desktop click at `(x, y)`.
    pub fn click(&mut self, x: f64, y: f64, now: f64) -> bool {
        let p = Vertex::new(x, y);
        if !p.is_finite() {
            return false;
        }
        let hit = self.hit(p);
        if self.controller.is_enabled() {
            return self.edit_click(hit).unwrap_or(false);
        }
        match hit {
            Hit::Polygon { polygon } => self.activate(polygon, now),
            _ => false,
        }
    }

    /// Status check, then clear the map and hand off to the table.
    fn activate(&mut self, polygon: usize, now: f64) -> bool {
        let Some(b) = self.controller.working().get(polygon) else {
            return false;
        };
        if !b.status.is_clickable() {
            self.notices.push(Notification {
                message: MSG_ALREADY_SOLD.to_string(),
                level: Level::Error,
            });
            return false;
        }
        self.surface.clear_all();
        self.bridge.activate(
            &b.building_number,
            &b.unit_number,
            b.status,
            now,
            &mut self.table,
            &mut self.notices,
        )
    }

    /// Touch tap at `(x, y)`: highlight and open the modal tooltip, or clear on empty space.
    pub fn tap(&mut self, x: f64, y: f64, now: f64) -> bool {
        let p = Vertex::new(x, y);
        if !p.is_finite() {
            return false;
        }
        let hit = self.hit(p);
        if self.controller.is_enabled() {
            return self.edit_click(hit).unwrap_or(false);
        }
        match hit {
            Hit::Polygon { polygon } => {
                let clickable = self
                    .controller
                    .working()
                    .get(polygon)
                    .map_or(false, |b| b.status.is_clickable());
                if !clickable {
                    self.notices.push(Notification {
                        message: MSG_ALREADY_SOLD.to_string(),
                        level: Level::Error,
                    });
                    return false;
                }
                self.surface.open_modal(polygon, now, &self.config);
                true
            }
            _ => {
                self.surface.clear_all();
                false
            }
        }
    }

    /// The open touch tooltip was tapped.
    pub fn tap_tooltip(&mut self, now: f64) -> bool {
        match self.surface.tooltip() {
            Some(Tooltip::Modal { polygon, .. }) => self.activate(polygon, now),
            _ => false,
        }
    }

    /// Expire deadlines. Returns true if anything visible changed.
    pub fn tick(&mut self, now: f64) -> bool {
        let a = self.surface.tick(now);
        let b = self.table.tick(now);
        a || b
    }

    /// Panel command: insert a vertex after `after` without hit-testing.
    pub fn insert_vertex(&mut self, polygon: usize, after: usize) -> Result<(), GeometryError> {
        self.controller.insert_vertex(polygon, after, &mut self.notices)
    }

    pub fn remove_vertex(&mut self, polygon: usize, vertex: usize) -> Result<(), GeometryError> {
        self.controller.remove_vertex(polygon, vertex, &mut self.notices)?;
        self.surface.set_hovered_vertex(None);
        Ok(())
    }

    pub fn toggle_area_visibility(&mut self, index: usize) -> bool {
        self.controller.toggle_area_visibility(index)
    }

    pub fn show_all_areas(&mut self) {
        self.controller.show_all_areas();
    }

    pub fn hide_all_areas(&mut self) {
        self.controller.hide_all_areas();
    }

    pub fn copy_coordinates_to_clipboard(&self, clipboard: &mut dyn Clipboard) -> bool {
        self.controller.copy_coordinates_to_clipboard(clipboard)
    }

    pub fn persist_changes(&mut self, store: &mut dyn GeometryStore) -> bool {
        self.controller
            .persist_changes(store, &mut self.cache, &mut self.notices)
    }

    pub fn begin_persist(&mut self) -> Result<PersistBatch, PersistError> {
        self.controller.begin_persist(&mut self.cache)
    }

    pub fn finish_persist(&mut self, batch: &PersistBatch, outcome: Result<(), StoreError>) -> bool {
        self.controller.finish_persist(batch, outcome, &mut self.notices)
    }

    /// Throw away edits and go back to a fresh derivation from the last units.
    pub fn restore_previous_version(&mut self) -> bool {
        let restored = self
            .controller
            .restore_previous_version(&mut self.cache, &mut self.notices);
        if restored {
            self.surface.clear_all();
        }
        restored
    }

    pub fn clear_stored_data(&mut self) {
        self.controller.clear_stored_data(&mut self.cache, &mut self.notices);
    }

    pub fn coordinates_source(&self) -> String {
        json::coordinates_source(self.controller.working().iter().map(|b| &b.polygon))
    }

    pub fn export_json(&self) -> String {
        json::export_polygons_json(self.controller.working().iter().map(|b| &b.polygon))
    }

    pub fn render_svg(&self, now: f64) -> String {
        let visible = |i: usize| self.controller.is_area_visible(i);
        let frame = Frame {
            bindings: self.controller.working(),
            visible: &visible,
            surface: &self.surface,
            drag: self.controller.drag(),
            edit_mode: self.controller.is_enabled(),
            now,
        };
        svg::render_overlay(&frame, &self.config)
    }
}
