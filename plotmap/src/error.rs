use thiserror::Error;

/// Local geometry rejections. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("vertex index {index} out of range for polygon with {len} vertices")]
    InvalidIndex { index: usize, len: usize },
    #[error("polygon must keep at least 3 vertices (has {len})")]
    TooFewVertices { len: usize },
    #[error("coordinates must be finite")]
    NonFinite,
    #[error("no polygon at index {index}")]
    UnknownPolygon { index: usize },
    #[error("edit mode is disabled")]
    EditDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("geometry save failed: {0}")]
    Save(String),
    #[error("geometry load failed: {0}")]
    Load(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("recovery storage unavailable: {0}")]
    Storage(String),
    #[error("recovery entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("config field '{field}' must be finite and positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("config could not be parsed: {0}")]
    Parse(String),
}

/// Why a persist attempt did not complete.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("edit mode is disabled")]
    EditDisabled,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rejected geometry document from storage or JS.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("invalid geometry document: {0}")]
    Parse(String),
    #[error("{0} polygons exceeds limit")]
    TooManyPolygons(usize),
    #[error("polygon {index} has {len} vertices, exceeds limit")]
    TooManyVertices { index: usize, len: usize },
    #[error("polygon {index} has non-finite or out-of-range coordinates")]
    OutOfBounds { index: usize },
}
