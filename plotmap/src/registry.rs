//! Unit-to-polygon binding registry.
//!
//! Resolution order for a unit's outline: persisted custom vertices, then the
//! static fallback table (plain key, then numeric-building key), then a
//! placeholder hexagon. The table is read-only reference data and is never
//! touched by edit sessions.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::geometry::polygon::Polygon;
use crate::model::{Binding, GeometryRecord, Ident, UnitKey, UnitRecord, UnitStatus, Vertex};

/// Hexagon outline relative to its top-left anchor.
const HEXAGON: [(f64, f64); 6] = [
    (0.0, 0.0),
    (25.0, -10.0),
    (50.0, 0.0),
    (50.0, 25.0),
    (25.0, 50.0),
    (0.0, 25.0),
];

/// Fallback anchors keyed by `{building}{unit}`.
const FALLBACK_ANCHORS: &[(&str, f64, f64)] = &[
    ("1A", 200.0, 150.0),
    ("1B", 200.0, 210.0),
    ("2A", 270.0, 150.0),
    ("2B", 270.0, 210.0),
    ("3A", 340.0, 150.0),
    ("3B", 340.0, 210.0),
    ("4A", 410.0, 150.0),
    ("4B", 410.0, 210.0),
    ("5A", 480.0, 150.0),
    ("5B", 480.0, 210.0),
    ("6A", 550.0, 150.0),
    ("6B", 550.0, 210.0),
    ("7A", 620.0, 150.0),
    ("7B", 620.0, 210.0),
    ("8A", 200.0, 300.0),
    ("8B", 200.0, 360.0),
    ("9A", 270.0, 300.0),
    ("9B", 270.0, 360.0),
    ("10A", 340.0, 300.0),
    ("10B", 340.0, 360.0),
    ("11A", 410.0, 300.0),
    ("11B", 410.0, 360.0),
    ("12A", 480.0, 300.0),
    ("12B", 480.0, 360.0),
    ("13A", 550.0, 300.0),
    ("13B", 550.0, 360.0),
];

const PLACEHOLDER_ANCHOR: (f64, f64) = (300.0, 300.0);

/// Centroid of the placeholder hexagon.
pub const PLACEHOLDER_CENTER: Vertex = Vertex::new(325.0, 315.0);

/// Where a resolved outline came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingSource {
    Custom,
    Table,
    Placeholder,
}

fn hexagon_at(x: f64, y: f64) -> Polygon {
    Polygon::new(
        HEXAGON
            .iter()
            .map(|&(dx, dy)| Vertex::new(x + dx, y + dy))
            .collect(),
    )
}

fn fallback_table() -> &'static HashMap<&'static str, Polygon> {
    static TABLE: OnceLock<HashMap<&'static str, Polygon>> = OnceLock::new();
    TABLE.get_or_init(|| {
        FALLBACK_ANCHORS
            .iter()
            .map(|&(key, x, y)| (key, hexagon_at(x, y)))
            .collect()
    })
}

pub fn placeholder() -> Polygon {
    hexagon_at(PLACEHOLDER_ANCHOR.0, PLACEHOLDER_ANCHOR.1)
}

/// Table lookup for an exact key such as `"1A"`.
pub fn fallback_shape(key: &str) -> Option<&'static Polygon> {
    fallback_table().get(key)
}

/// Resolve the outline for one unit, reporting which source won.
pub fn resolve_with_source(
    building: &Ident,
    unit: &Ident,
    custom: Option<&[Vertex]>,
) -> (Polygon, BindingSource) {
    if let Some(vertices) = custom.filter(|v| !v.is_empty()) {
        log::debug!("using persisted outline for {}{}", building, unit);
        return (Polygon::new(vertices.to_vec()), BindingSource::Custom);
    }

    let building = building.normalized(false);
    let unit = unit.normalized(true);
    let key = format!("{}{}", building, unit);
    if let Some(p) = fallback_shape(&key) {
        return (p.clone(), BindingSource::Table);
    }

    if let Some(n) = building.as_number() {
        let numeric_key = format!("{}{}", n, unit);
        if numeric_key != key {
            if let Some(p) = fallback_shape(&numeric_key) {
                log::debug!("outline for {} resolved via numeric key {}", key, numeric_key);
                return (p.clone(), BindingSource::Table);
            }
        }
    }

    log::warn!("no outline for unit {}, using placeholder", key);
    (placeholder(), BindingSource::Placeholder)
}

pub fn resolve_binding(building: &Ident, unit: &Ident, custom: Option<&[Vertex]>) -> Polygon {
    resolve_with_source(building, unit, custom).0
}

fn sentinel(index: usize) -> Binding {
    Binding {
        building_number: Ident::unknown(),
        unit_number: Ident::unknown(),
        polygon: Polygon::default(),
        source_unit_index: index,
        status: UnitStatus::Unavailable,
        is_available: false,
    }
}

pub fn bind_unit(unit: &UnitRecord, index: usize) -> Binding {
    Binding {
        building_number: unit.building_number.clone(),
        unit_number: unit.unit_number.clone(),
        polygon: resolve_binding(
            &unit.building_number,
            &unit.unit_number,
            unit.vertices.as_deref(),
        ),
        source_unit_index: index,
        status: unit.status_or_default(),
        is_available: unit.is_available.unwrap_or(true),
    }
}

/// One binding per record, in order. Missing records become sentinels.
pub fn map_units_to_bindings(units: &[Option<UnitRecord>]) -> Vec<Binding> {
    if units.is_empty() {
        log::warn!("no unit records to bind");
    }
    units
        .iter()
        .enumerate()
        .map(|(i, unit)| match unit {
            Some(u) => bind_unit(u, i),
            None => {
                log::warn!("unit record {} is missing, rendering sentinel", i);
                sentinel(i)
            }
        })
        .collect()
}

/// Attach loaded outlines to records by normalized key. Returns how many matched.
pub fn apply_persisted_geometry(
    units: &mut [Option<UnitRecord>],
    records: &[GeometryRecord],
) -> usize {
    let by_key: HashMap<UnitKey, &GeometryRecord> = records
        .iter()
        .filter(|r| !r.vertices.is_empty())
        .map(|r| (r.key(), r))
        .collect();
    let mut matched = 0;
    for unit in units.iter_mut().flatten() {
        if let Some(rec) = by_key.get(&unit.key()) {
            unit.vertices = Some(rec.vertices.clone());
            matched += 1;
        }
    }
    if matched < by_key.len() {
        log::warn!(
            "{} persisted outlines did not match any unit",
            by_key.len() - matched
        );
    }
    matched
}
