use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IngestError;
use crate::geometry::limits::{self, MAX_POLYGONS, MAX_VERTICES_PER_POLYGON};
use crate::geometry::polygon::Polygon;
use crate::model::{GeometryRecord, UnitRecord};

/// Source-like listing of polygons, as copied to the clipboard.
///
/// Coordinates are rounded to integers. The first polygon is exported as
/// `polygonVertices`, the n-th as `polygonVertices{n}`.
pub fn coordinates_source<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> String {
    polygons
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let suffix = if i > 0 { (i + 1).to_string() } else { String::new() };
            let body = serde_json::to_string_pretty(&rounded_points(p))
                .unwrap_or_else(|_| "[]".to_string());
            format!(
                "// Polygon {}\nexport const polygonVertices{}: Vertex[] = {};",
                i + 1,
                suffix,
                body
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Serialize)]
struct IntPoint {
    x: i64,
    y: i64,
}

fn rounded_points(p: &Polygon) -> Vec<IntPoint> {
    p.rounded()
        .vertices()
        .iter()
        .map(|v| IntPoint { x: v.x as i64, y: v.y as i64 })
        .collect()
}

/// Pretty JSON array of vertex arrays, suitable for a `polygon_data.json` download.
pub fn export_polygons_json<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> String {
    let all: Vec<&Polygon> = polygons.into_iter().collect();
    serde_json::to_string_pretty(&all).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a unit list, tolerating `null` or malformed entries.
///
/// Only a non-array document is an error; bad elements come back as `None`
/// so the rest of the list still renders.
pub fn parse_units(v: Value) -> Result<Vec<Option<UnitRecord>>, serde_json::Error> {
    let items: Vec<Value> = serde_json::from_value(v)?;
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if item.is_null() {
                return None;
            }
            match serde_json::from_value::<UnitRecord>(item) {
                Ok(u) => Some(u),
                Err(e) => {
                    log::warn!("unit record {} is malformed: {}", i, e);
                    None
                }
            }
        })
        .collect())
}

pub fn parse_units_str(s: &str) -> Result<Vec<Option<UnitRecord>>, serde_json::Error> {
    parse_units(serde_json::from_str(s)?)
}

#[derive(Serialize, Deserialize)]
struct BatchDoc {
    polygons: Vec<GeometryRecord>,
}

/// Request body for a geometry save: `{ "polygons": [...] }`.
pub fn batch_to_json(records: &[GeometryRecord]) -> Value {
    serde_json::to_value(BatchDoc { polygons: records.to_vec() }).unwrap_or(Value::Null)
}

/// Parse loaded geometry, either `{ "polygons": [...] }` or a bare array.
pub fn parse_geometry(v: Value) -> Result<Vec<GeometryRecord>, IngestError> {
    let records: Vec<GeometryRecord> = if v.is_array() {
        serde_json::from_value(v)
    } else {
        serde_json::from_value::<BatchDoc>(v).map(|d| d.polygons)
    }
    .map_err(|e| IngestError::Parse(e.to_string()))?;
    if records.len() > MAX_POLYGONS {
        return Err(IngestError::TooManyPolygons(records.len()));
    }
    for (index, r) in records.iter().enumerate() {
        if r.vertices.len() > MAX_VERTICES_PER_POLYGON {
            return Err(IngestError::TooManyVertices { index, len: r.vertices.len() });
        }
        if !r
            .vertices
            .iter()
            .all(|p| limits::in_coord_bounds(p.x) && limits::in_coord_bounds(p.y))
        {
            return Err(IngestError::OutOfBounds { index });
        }
    }
    Ok(records)
}

pub fn parse_geometry_str(s: &str) -> Result<Vec<GeometryRecord>, IngestError> {
    let v: Value = serde_json::from_str(s).map_err(|e| IngestError::Parse(e.to_string()))?;
    parse_geometry(v)
}
