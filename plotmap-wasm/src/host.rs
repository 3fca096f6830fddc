//! Browser-side collaborators: localStorage and JS callbacks.

use js_sys::Function;
use plotmap::{
    CacheError, Clipboard, ClipboardError, GeometryRecord, GeometrySource, KvStore, MemoryKv,
    Notifier, StoreError, UnitFilter, UnitProvider, UnitRecord,
};
use wasm_bindgen::JsValue;

/// `localStorage` when the page has one, memory otherwise (private mode, workers).
pub struct LocalStorageKv {
    storage: Option<web_sys::Storage>,
    fallback: MemoryKv,
}

impl LocalStorageKv {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable, recovery cache kept in memory");
        }
        LocalStorageKv { storage, fallback: MemoryKv::new() }
    }
}

impl KvStore for LocalStorageKv {
    fn get(&self, key: &str) -> Option<String> {
        match &self.storage {
            Some(s) => s.get_item(key).ok().flatten(),
            None => self.fallback.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        match &self.storage {
            Some(s) => s
                .set_item(key, value)
                .map_err(|e| CacheError::Storage(format!("{:?}", e))),
            None => self.fallback.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) {
        match &self.storage {
            Some(s) => {
                let _ = s.remove_item(key);
            }
            None => self.fallback.remove(key),
        }
    }
}

/// Calls `f(message, level)` for each notification.
pub struct JsNotifier<'a>(pub &'a Function);

impl Notifier for JsNotifier<'_> {
    fn notify(&mut self, message: &str, level: plotmap::Level) {
        let level = match level {
            plotmap::Level::Success => "success",
            plotmap::Level::Error => "error",
            plotmap::Level::Info => "info",
        };
        if let Err(e) = self.0.call2(&JsValue::NULL, &JsValue::from_str(message), &JsValue::from_str(level)) {
            log::error!("notification callback threw: {:?}", e);
        }
    }
}

/// Hands the text to a JS writer such as `t => navigator.clipboard.writeText(t)`.
pub struct JsClipboard<'a>(pub &'a Function);

impl Clipboard for JsClipboard<'_> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.0
            .call1(&JsValue::NULL, &JsValue::from_str(text))
            .map(|_| ())
            .map_err(|e| ClipboardError(format!("{:?}", e)))
    }
}

/// Units and outlines already fetched by the page.
pub struct Fetched {
    pub units: Vec<Option<UnitRecord>>,
    pub geometry: Vec<GeometryRecord>,
}

impl UnitProvider for Fetched {
    fn list_units(&self, filter: UnitFilter) -> Result<Vec<Option<UnitRecord>>, StoreError> {
        self.units.list_units(filter)
    }
}

impl GeometrySource for Fetched {
    fn load_geometry(&self) -> Result<Vec<GeometryRecord>, StoreError> {
        Ok(self.geometry.clone())
    }
}
