use crate::host::{Fetched, JsClipboard, JsNotifier};
use crate::interop::{arr_f64, new_obj, set_kv, to_js};
use crate::PlotMap;
use js_sys::{Float64Array, Function};
use plotmap::json;
use plotmap::{Ident, MapConfig, Notifier, RowId, Tooltip, UnitFilter, Vertex, Viewport};
use serde::Serialize;
use crate::error;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Route `log` records to the browser console. Later calls only change the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let level = level.parse::<log::Level>().unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        log::set_max_level(level.to_level_filter());
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BindingView<'a> {
    building_number: &'a Ident,
    unit_number: &'a Ident,
    status: plotmap::UnitStatus,
    is_available: bool,
    source_unit_index: usize,
    vertices: &'a [Vertex],
    visible: bool,
}

fn ident_from_js(v: JsValue) -> Option<Ident> {
    if let Some(n) = v.as_f64() {
        return (n.is_finite() && n.fract() == 0.0).then(|| Ident::Number(n as i64));
    }
    v.as_string().map(Ident::Text)
}

impl PlotMap {
    pub(crate) fn logical(&self, x: f64, y: f64) -> Option<Vertex> {
        match self.inner.surface().viewport() {
            Some(vp) => vp.to_logical(x, y, self.inner.config()),
            None => Some(Vertex::new(x, y)).filter(Vertex::is_finite),
        }
    }
}

#[wasm_bindgen]
impl PlotMap {
    /// `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<PlotMap, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            MapConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<MapConfig>(config)
                .map_err(|e| error::invalid_json(e.to_string()))?
        };
        PlotMap::rs_new(config).map_err(|e| error::err("invalid_config", e.to_string(), None))
    }

    pub fn is_edit_mode(&self) -> bool {
        self.inner.controller().is_enabled()
    }
    pub fn has_unsaved_edits(&self) -> bool {
        self.inner.controller().has_unsaved_edits()
    }
    pub fn polygon_count(&self) -> u32 {
        self.rs_bindings().len() as u32
    }

    // Data
    pub fn set_units(&mut self, units: JsValue) -> bool {
        error::is_ok(&self.set_units_res(units, JsValue::UNDEFINED))
    }
    /// `geometry` is either `{ polygons: [...] }`, a bare array, or `undefined`.
    pub fn set_units_res(&mut self, units: JsValue, geometry: JsValue) -> JsValue {
        let units = match serde_wasm_bindgen::from_value::<serde_json::Value>(units)
            .map_err(|e| e.to_string())
            .and_then(|v| json::parse_units(v).map_err(|e| e.to_string()))
        {
            Ok(u) => u,
            Err(e) => return error::invalid_json(e),
        };
        let geometry = if geometry.is_undefined() || geometry.is_null() {
            Vec::new()
        } else {
            match serde_wasm_bindgen::from_value::<serde_json::Value>(geometry) {
                Ok(v) => match json::parse_geometry(v) {
                    Ok(g) => g,
                    Err(e) => return error::invalid_json(e.to_string()),
                },
                Err(e) => return error::invalid_json(e.to_string()),
            }
        };
        let source = Fetched { units, geometry };
        match self.inner.load(&source, Some(&source)) {
            Ok(n) => error::ok(JsValue::from_f64(n as f64)),
            Err(e) => error::invalid_json(e.to_string()),
        }
    }
    pub fn set_table_filter(&mut self, all: bool) {
        self.inner
            .set_table_filter(if all { UnitFilter::All } else { UnitFilter::Active });
    }
    pub fn bindings(&self) -> JsValue {
        let c = self.inner.controller();
        let views: Vec<BindingView> = self
            .rs_bindings()
            .iter()
            .enumerate()
            .map(|(i, b)| BindingView {
                building_number: &b.building_number,
                unit_number: &b.unit_number,
                status: b.status,
                is_available: b.is_available,
                source_unit_index: b.source_unit_index,
                vertices: b.polygon.vertices(),
                visible: c.is_area_visible(i),
            })
            .collect();
        to_js(&views)
    }
    /// Flat `[x0, y0, x1, y1, ...]` of one polygon.
    pub fn polygon_coords(&self, index: usize) -> Option<Float64Array> {
        let b = self.rs_bindings().get(index)?;
        let flat: Vec<f64> = b.polygon.vertices().iter().flat_map(|v| [v.x, v.y]).collect();
        Some(arr_f64(&flat))
    }

    // Viewport and gestures. Coordinates are CSS pixels once a viewport is set.
    pub fn set_viewport(&mut self, width: f64, height: f64) -> bool {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return false;
        }
        let config = self.inner.config().clone();
        self.inner
            .surface_mut()
            .set_viewport(Viewport::new(width, height), &config);
        true
    }
    pub fn is_touch(&self) -> bool {
        self.inner.surface().device() == plotmap::Device::Touch
    }
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        match self.logical(x, y) {
            Some(p) => self.inner.pointer_move(p.x, p.y),
            None => false,
        }
    }
    pub fn pointer_move_res(&mut self, x: f64, y: f64) -> JsValue {
        if !x.is_finite() {
            return error::non_finite("x");
        }
        if !y.is_finite() {
            return error::non_finite("y");
        }
        error::ok(JsValue::from_bool(self.pointer_move(x, y)))
    }
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        match self.logical(x, y) {
            Some(p) => self.inner.pointer_down(p.x, p.y),
            None => false,
        }
    }
    pub fn pointer_up(&mut self) -> bool {
        self.inner.pointer_up()
    }
    pub fn pointer_leave(&mut self) {
        self.inner.pointer_leave_map();
    }
    pub fn click(&mut self, x: f64, y: f64, now: f64) -> bool {
        match self.logical(x, y) {
            Some(p) => self.inner.click(p.x, p.y, now),
            None => false,
        }
    }
    pub fn touch_start(&mut self, x: f64, y: f64, now: f64) -> bool {
        match self.logical(x, y) {
            Some(p) => self.inner.touch_start(p.x, p.y, now),
            None => false,
        }
    }
    pub fn tap(&mut self, x: f64, y: f64, now: f64) -> bool {
        match self.logical(x, y) {
            Some(p) => self.inner.tap(p.x, p.y, now),
            None => false,
        }
    }
    pub fn tap_tooltip(&mut self, now: f64) -> bool {
        self.inner.tap_tooltip(now)
    }
    pub fn tick(&mut self, now: f64) -> bool {
        self.inner.tick(now)
    }
    pub fn tooltip(&self) -> JsValue {
        let o = new_obj();
        match self.inner.surface().tooltip() {
            Some(Tooltip::Follow { polygon, at }) => {
                set_kv(&o, "kind", &JsValue::from_str("follow"));
                set_kv(&o, "polygon", &JsValue::from_f64(polygon as f64));
                set_kv(&o, "x", &JsValue::from_f64(at.x));
                set_kv(&o, "y", &JsValue::from_f64(at.y));
            }
            Some(Tooltip::Modal { polygon, expires_at }) => {
                set_kv(&o, "kind", &JsValue::from_str("modal"));
                set_kv(&o, "polygon", &JsValue::from_f64(polygon as f64));
                set_kv(&o, "expiresAt", &JsValue::from_f64(expires_at));
            }
            None => return JsValue::NULL,
        }
        o.into()
    }

    // Table bridge
    /// DOM id of the row to scroll into view, handed out once per highlight.
    pub fn take_scroll_target(&mut self) -> Option<String> {
        self.inner
            .table_mut()
            .take_scroll_target()
            .map(|r| r.element_id().to_string())
    }
    pub fn row_style(&self, building: JsValue, unit: JsValue, now: f64) -> JsValue {
        let (Some(b), Some(u)) = (ident_from_js(building), ident_from_js(unit)) else {
            return JsValue::NULL;
        };
        match self.inner.table().style_at(&RowId::new(&b, &u), now) {
            Some(s) => {
                let o = new_obj();
                set_kv(&o, "backgroundColor", &JsValue::from_str(&s.background));
                set_kv(&o, "color", &JsValue::from_str(s.color));
                set_kv(&o, "fontWeight", &JsValue::from_str(s.font_weight));
                set_kv(&o, "boxShadow", &JsValue::from_str(s.box_shadow));
                o.into()
            }
            None => JsValue::NULL,
        }
    }

    // Edit commands
    pub fn insert_vertex_res(&mut self, polygon: usize, after: usize) -> JsValue {
        match self.inner.insert_vertex(polygon, after) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::geometry(&e),
        }
    }
    pub fn remove_vertex_res(&mut self, polygon: usize, vertex: usize) -> JsValue {
        match self.inner.remove_vertex(polygon, vertex) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::geometry(&e),
        }
    }
    pub fn toggle_area_visibility(&mut self, index: usize) -> bool {
        self.inner.toggle_area_visibility(index)
    }
    pub fn show_all_areas(&mut self) {
        self.inner.show_all_areas();
    }
    pub fn hide_all_areas(&mut self) {
        self.inner.hide_all_areas();
    }
    /// `writer` receives the text, e.g. `t => navigator.clipboard.writeText(t)`.
    pub fn copy_coordinates(&self, writer: &Function) -> bool {
        self.inner.copy_coordinates_to_clipboard(&mut JsClipboard(writer))
    }
    pub fn coordinates_source(&self) -> String {
        self.inner.coordinates_source()
    }
    pub fn export_json(&self) -> String {
        self.inner.export_json()
    }

    /// Snapshot the working copy and write the recovery cache. The returned
    /// `{ polygons }` body goes to the server; report back via `finish_persist`.
    pub fn begin_persist_res(&mut self) -> JsValue {
        match self.inner.begin_persist() {
            Ok(batch) => {
                let body = json::batch_to_json(&batch.records);
                self.pending = Some(batch);
                error::ok(to_js(&body))
            }
            Err(plotmap::PersistError::EditDisabled) => error::edit_disabled(),
            Err(e) => error::persist_failed(e.to_string()),
        }
    }
    pub fn finish_persist(&mut self, ok: bool, message: Option<String>) -> bool {
        let Some(batch) = self.pending.take() else {
            log::warn!("finish_persist without a pending batch");
            return false;
        };
        let outcome = if ok {
            Ok(())
        } else {
            Err(plotmap::StoreError::Save(message.unwrap_or_default()))
        };
        self.inner.finish_persist(&batch, outcome)
    }
    pub fn restore_previous_version(&mut self) -> bool {
        self.pending = None;
        self.inner.restore_previous_version()
    }
    pub fn clear_stored_data(&mut self) {
        self.inner.clear_stored_data();
    }

    // Output
    pub fn render_svg(&self, now: f64) -> String {
        self.inner.render_svg(now)
    }
    pub fn drain_notifications(&mut self) -> JsValue {
        to_js(&self.inner.drain_notifications())
    }
    /// Deliver pending notifications as `f(message, level)`.
    pub fn flush_notifications(&mut self, f: &Function) -> u32 {
        let notes = self.inner.drain_notifications();
        let mut sink = JsNotifier(f);
        for n in &notes {
            sink.notify(&n.message, n.level);
        }
        notes.len() as u32
    }
}
