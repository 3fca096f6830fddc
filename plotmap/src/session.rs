//! Edit session: the working copy of bound polygons and the active drag.
//!
//! Every committed change swaps in a new `Arc<Vec<Binding>>`, so a snapshot
//! handed to an in-flight persist is never touched by later drags.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GeometryError;
use crate::geometry::polygon::Polygon;
use crate::model::{Binding, UnitKey, Vertex};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexDrag {
    pub polygon_index: usize,
    pub vertex_index: usize,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Offset is measured from the cursor to the polygon centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolygonDrag {
    pub polygon_index: usize,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Vertex(VertexDrag),
    Polygon(PolygonDrag),
}

impl DragState {
    pub fn is_active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }

    pub fn polygon_index(&self) -> Option<usize> {
        match self {
            DragState::Idle => None,
            DragState::Vertex(d) => Some(d.polygon_index),
            DragState::Polygon(d) => Some(d.polygon_index),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EditSession {
    working: Arc<Vec<Binding>>,
    visibility: Vec<bool>,
    drag: DragState,
    has_unsaved_edits: bool,
    revision: u64,
}

impl EditSession {
    pub fn new(bindings: Vec<Binding>) -> Self {
        let n = bindings.len();
        EditSession {
            working: Arc::new(bindings),
            visibility: vec![true; n],
            drag: DragState::Idle,
            has_unsaved_edits: false,
            revision: 0,
        }
    }

    pub fn working(&self) -> &[Binding] {
        &self.working
    }

    /// Cheap consistent view of the working copy at this instant.
    pub fn snapshot(&self) -> Arc<Vec<Binding>> {
        Arc::clone(&self.working)
    }

    pub fn polygon(&self, index: usize) -> Option<&Polygon> {
        self.working.get(index).map(|b| &b.polygon)
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.has_unsaved_edits
    }

    /// Bumped on every committed change to the working copy.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_edited(&mut self) {
        self.has_unsaved_edits = true;
    }

    /// Clear the unsaved flag if nothing changed since `revision`.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if self.revision == revision && !self.drag.is_active() {
            self.has_unsaved_edits = false;
            true
        } else {
            false
        }
    }

    fn commit_polygon(&mut self, index: usize, polygon: Polygon) {
        let mut next = (*self.working).clone();
        next[index].polygon = polygon;
        self.working = Arc::new(next);
        self.revision += 1;
        self.has_unsaved_edits = true;
    }

    fn existing(&self, index: usize) -> Result<&Polygon, GeometryError> {
        self.polygon(index)
            .ok_or(GeometryError::UnknownPolygon { index })
    }

    pub fn insert_vertex(&mut self, polygon_index: usize, after: usize) -> Result<(), GeometryError> {
        let next = self.existing(polygon_index)?.insert_midpoint(after)?;
        self.commit_polygon(polygon_index, next);
        Ok(())
    }

    pub fn remove_vertex(&mut self, polygon_index: usize, vertex: usize) -> Result<(), GeometryError> {
        let next = self.existing(polygon_index)?.remove_vertex(vertex)?;
        self.commit_polygon(polygon_index, next);
        Ok(())
    }

    pub fn begin_vertex_drag(
        &mut self,
        polygon_index: usize,
        vertex_index: usize,
        cursor: Vertex,
    ) -> Result<(), GeometryError> {
        if !cursor.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let poly = self.existing(polygon_index)?;
        let v = poly.vertex(vertex_index).ok_or(GeometryError::InvalidIndex {
            index: vertex_index,
            len: poly.len(),
        })?;
        let (offset_x, offset_y) = cursor.offset_to(&v);
        self.drag = DragState::Vertex(VertexDrag {
            polygon_index,
            vertex_index,
            offset_x,
            offset_y,
        });
        Ok(())
    }

    pub fn begin_polygon_drag(&mut self, polygon_index: usize, cursor: Vertex) -> Result<(), GeometryError> {
        if !cursor.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let center = self
            .existing(polygon_index)?
            .centroid()
            .ok_or(GeometryError::TooFewVertices { len: 0 })?;
        let (offset_x, offset_y) = cursor.offset_to(&center);
        self.drag = DragState::Polygon(PolygonDrag {
            polygon_index,
            offset_x,
            offset_y,
        });
        Ok(())
    }

    /// Apply a cursor move to the active drag. Non-finite cursors are skipped.
    pub fn update_drag(&mut self, cursor: Vertex) -> bool {
        if !cursor.is_finite() {
            return false;
        }
        match self.drag {
            DragState::Idle => false,
            DragState::Vertex(d) => {
                let target = Vertex::new(cursor.x + d.offset_x, cursor.y + d.offset_y);
                let next = match self.polygon(d.polygon_index) {
                    Some(p) => p.with_vertex(d.vertex_index, target),
                    None => return false,
                };
                match next {
                    Ok(p) => {
                        self.commit_polygon(d.polygon_index, p);
                        true
                    }
                    Err(_) => false,
                }
            }
            DragState::Polygon(d) => {
                let Some(poly) = self.polygon(d.polygon_index) else {
                    return false;
                };
                let Some(center) = poly.centroid() else {
                    return false;
                };
                let dx = cursor.x + d.offset_x - center.x;
                let dy = cursor.y + d.offset_y - center.y;
                let next = poly.translated(dx, dy);
                if !next.is_finite() {
                    return false;
                }
                self.commit_polygon(d.polygon_index, next);
                true
            }
        }
    }

    /// Finish the active drag. Returns false if none was running.
    pub fn end_drag(&mut self) -> bool {
        if self.drag.is_active() {
            self.drag = DragState::Idle;
            self.has_unsaved_edits = true;
            true
        } else {
            false
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visibility.get(index).copied().unwrap_or(false)
    }

    pub fn visibility(&self) -> &[bool] {
        &self.visibility
    }

    pub fn toggle_visibility(&mut self, index: usize) -> bool {
        match self.visibility.get_mut(index) {
            Some(v) => {
                *v = !*v;
                true
            }
            None => false,
        }
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        self.visibility.iter_mut().for_each(|v| *v = visible);
    }

    /// Replace the working copy with `bindings` and drop all edit state.
    pub fn reset(&mut self, bindings: Vec<Binding>) {
        let n = bindings.len();
        self.working = Arc::new(bindings);
        self.visibility = vec![true; n];
        self.drag = DragState::Idle;
        self.has_unsaved_edits = false;
        self.revision += 1;
    }

    /// Adopt a new binding list while keeping edited outlines.
    ///
    /// Outlines carry over by unit identity; new units take their freshly
    /// resolved outline and removed units are dropped. Status and index
    /// always come from the new list. An active drag survives only when
    /// identities and order are unchanged.
    pub fn rekey(&mut self, bindings: Vec<Binding>) {
        self.adopt(bindings, true);
    }

    /// Adopt a new binding list with its fresh outlines, keeping per-unit
    /// visibility and, when identities are unchanged, the active drag.
    pub fn refresh(&mut self, bindings: Vec<Binding>) {
        self.adopt(bindings, false);
    }

    fn adopt(&mut self, bindings: Vec<Binding>, keep_outlines: bool) {
        let same_shape = bindings.len() == self.working.len()
            && bindings
                .iter()
                .zip(self.working.iter())
                .all(|(a, b)| a.key() == b.key());
        let kept: HashMap<UnitKey, (Polygon, bool)> = self
            .working
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_sentinel())
            .map(|(i, b)| (b.key(), (b.polygon.clone(), self.is_visible(i))))
            .collect();

        let mut visibility = Vec::with_capacity(bindings.len());
        let next: Vec<Binding> = bindings
            .into_iter()
            .map(|mut b| {
                let prior = if b.is_sentinel() { None } else { kept.get(&b.key()) };
                match prior {
                    Some((poly, visible)) => {
                        if keep_outlines {
                            b.polygon = poly.clone();
                        }
                        visibility.push(*visible);
                    }
                    None => visibility.push(true),
                }
                b
            })
            .collect();
        if !same_shape {
            log::debug!(
                "re-keyed edit session: {} -> {} polygons",
                self.working.len(),
                next.len()
            );
            // Indices may now point at other units.
            self.drag = DragState::Idle;
        }
        self.working = Arc::new(next);
        self.visibility = visibility;
        self.revision += 1;
    }
}
