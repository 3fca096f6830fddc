use serde::{Deserialize, Serialize};

use super::limits::MIN_POLYGON_VERTICES;
use crate::error::GeometryError;
use crate::model::Vertex;

/// Ordered, implicitly closed vertex ring.
///
/// Operations never mutate in place; each edit yields a new polygon so a
/// snapshot taken earlier stays valid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Polygon { vertices }
    }

    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Polygon {
            vertices: points.iter().map(|&(x, y)| Vertex { x, y }).collect(),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        self.vertices.get(index).copied()
    }

    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(Vertex::is_finite)
    }

    /// Arithmetic mean of all vertices; `None` for an empty polygon.
    pub fn centroid(&self) -> Option<Vertex> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len() as f64;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), v| (sx + v.x, sy + v.y));
        Some(Vertex { x: sx / n, y: sy / n })
    }

    /// New polygon with a vertex halfway between `after` and its cyclic successor.
    pub fn insert_midpoint(&self, after: usize) -> Result<Polygon, GeometryError> {
        let n = self.vertices.len();
        if after >= n {
            return Err(GeometryError::InvalidIndex { index: after, len: n });
        }
        let mid = self.vertices[after].midpoint(&self.vertices[(after + 1) % n]);
        let mut vertices = Vec::with_capacity(n + 1);
        vertices.extend_from_slice(&self.vertices[..=after]);
        vertices.push(mid);
        vertices.extend_from_slice(&self.vertices[after + 1..]);
        Ok(Polygon { vertices })
    }

    pub fn remove_vertex(&self, index: usize) -> Result<Polygon, GeometryError> {
        let n = self.vertices.len();
        if index >= n {
            return Err(GeometryError::InvalidIndex { index, len: n });
        }
        if n <= MIN_POLYGON_VERTICES {
            return Err(GeometryError::TooFewVertices { len: n });
        }
        let mut vertices = self.vertices.clone();
        vertices.remove(index);
        Ok(Polygon { vertices })
    }

    /// New polygon with the vertex at `index` moved to `to`.
    pub fn with_vertex(&self, index: usize, to: Vertex) -> Result<Polygon, GeometryError> {
        if !to.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let n = self.vertices.len();
        if index >= n {
            return Err(GeometryError::InvalidIndex { index, len: n });
        }
        let mut vertices = self.vertices.clone();
        vertices[index] = to;
        Ok(Polygon { vertices })
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Polygon {
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { x: v.x + dx, y: v.y + dy })
                .collect(),
        }
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Polygon {
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { x: v.x * sx, y: v.y * sy })
                .collect(),
        }
    }

    /// Cyclic edges as `(start_index, start, end)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, Vertex, Vertex)> + '_ {
        let n = self.vertices.len();
        self.vertices
            .iter()
            .enumerate()
            .map(move |(i, a)| (i, *a, self.vertices[(i + 1) % n]))
    }

    /// Midpoint of every edge, indexed like the edge's start vertex.
    pub fn edge_midpoints(&self) -> Vec<Vertex> {
        self.edges().map(|(_, a, b)| a.midpoint(&b)).collect()
    }

    /// Even-odd containment test.
    pub fn contains(&self, p: Vertex) -> bool {
        if self.vertices.len() < MIN_POLYGON_VERTICES {
            return false;
        }
        let mut inside = false;
        for (_, a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.vertices.first()?;
        Some(self.vertices.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(x0, y0, x1, y1), v| (x0.min(v.x), y0.min(v.y), x1.max(v.x), y1.max(v.y)),
        ))
    }

    /// Copy with every coordinate rounded to the nearest integer.
    pub fn rounded(&self) -> Polygon {
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { x: v.x.round(), y: v.y.round() })
                .collect(),
        }
    }

    /// SVG `points` attribute value.
    pub fn points_attr(&self) -> String {
        self.vertices
            .iter()
            .map(|v| format!("{},{}", v.x, v.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<Vertex>> for Polygon {
    fn from(vertices: Vec<Vertex>) -> Self {
        Polygon { vertices }
    }
}
