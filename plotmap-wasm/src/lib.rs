use wasm_bindgen::prelude::*;
mod api;
pub use api::{init_logging, set_panic_hook};
mod error;
mod host;
mod interop;

#[wasm_bindgen]
pub struct PlotMap {
    pub(crate) inner: plotmap::MapEditor,
    pub(crate) pending: Option<plotmap::PersistBatch>,
}

impl PlotMap {
    pub fn rs_new(config: plotmap::MapConfig) -> Result<PlotMap, plotmap::ConfigError> {
        let inner = plotmap::MapEditor::new(config, Box::new(host::LocalStorageKv::new()))?;
        Ok(PlotMap { inner, pending: None })
    }

    pub fn rs_bindings(&self) -> &[plotmap::Binding] {
        self.inner.bindings()
    }
}
