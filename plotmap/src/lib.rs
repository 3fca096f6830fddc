pub mod model;
pub mod error;
pub mod config;
pub mod geometry {
    pub mod limits;
    pub mod math;
    pub mod polygon;
}
pub mod registry;
pub mod collab;
pub mod cache;
pub mod session;
pub mod controller;
pub mod surface;
pub mod bridge;
pub mod editor;
pub mod json;
pub mod svg;

pub use bridge::{CrossViewBridge, HighlightRequest, RowId, RowStyle, RowTarget, TableView};
pub use cache::{CachedPolygon, RecoveryCache, Snapshot};
pub use collab::{
    Clipboard, GeometrySource, GeometryStore, KvStore, MemoryKv, Notifier, UnitFilter,
    UnitProvider,
};
pub use config::MapConfig;
pub use controller::{EditController, PersistBatch};
pub use editor::MapEditor;
pub use error::{
    CacheError, ClipboardError, ConfigError, GeometryError, IngestError, PersistError, StoreError,
};
pub use geometry::polygon::Polygon;
pub use model::{
    Binding, GeometryRecord, Ident, Level, Notification, UnitKey, UnitRecord, UnitStatus, Vertex,
};
pub use registry::{map_units_to_bindings, resolve_binding};
pub use session::{DragState, EditSession, PolygonDrag, VertexDrag};
pub use surface::{Device, Hit, MapSurface, Tooltip, Viewport, Visual};
