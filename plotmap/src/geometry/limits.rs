// Canvas constants and ingestion caps for geometry coming from storage or JS

/// Logical canvas the overlay is authored in.
pub const CANVAS_WIDTH: f64 = 1200.0;
pub const CANVAS_HEIGHT: f64 = 600.0;

pub const MIN_POLYGON_VERTICES: usize = 3;

// Caps for untrusted input (JSON batches, recovery cache)
pub const MAX_POLYGONS: usize = 10_000;
pub const MAX_VERTICES_PER_POLYGON: usize = 4_096;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 = 10_000_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool {
    x.is_finite() && (COORD_MIN..=COORD_MAX).contains(&x)
}
