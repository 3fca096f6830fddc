//! Interactive map surface: picking, per-polygon visual state and tooltips.
//!
//! Times are milliseconds from the host clock. Deadlines live in the state
//! they belong to, so replacing that state drops any pending expiry with it.

use crate::config::MapConfig;
use crate::geometry::math::{seg_distance_sq, within};
use crate::model::{Binding, Vertex};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Pointer,
    Touch,
}

/// Visual state of one polygon, independent of its business status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visual {
    #[default]
    Idle,
    Hovered,
    Highlighted,
}

/// Rendered size of the overlay in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport { width, height }
    }

    /// Map a pixel position to logical canvas space. The overlay stretches
    /// non-uniformly, so each axis scales on its own.
    pub fn to_logical(&self, px: f64, py: f64, config: &MapConfig) -> Option<Vertex> {
        if !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let v = Vertex::new(
            px * config.canvas_width / self.width,
            py * config.canvas_height / self.height,
        );
        v.is_finite().then_some(v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tooltip {
    /// Desktop tooltip that follows the pointer.
    Follow { polygon: usize, at: Vertex },
    /// Centered touch tooltip, dismissed at `expires_at`.
    Modal { polygon: usize, expires_at: f64 },
}

impl Tooltip {
    pub fn polygon(&self) -> usize {
        match self {
            Tooltip::Follow { polygon, .. } | Tooltip::Modal { polygon, .. } => *polygon,
        }
    }
}

/// What lies under a point, topmost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Vertex { polygon: usize, vertex: usize },
    Centroid { polygon: usize },
    Insert { polygon: usize, after: usize },
    Delete { polygon: usize, vertex: usize },
    Polygon { polygon: usize },
    Empty,
}

/// Offset of a vertex's delete control from the vertex itself.
pub const DELETE_OFFSET: Vertex = Vertex::new(10.0, -10.0);

pub fn delete_anchor(v: Vertex) -> Vertex {
    Vertex::new(v.x + DELETE_OFFSET.x, v.y + DELETE_OFFSET.y)
}

/// Whether `p` is still inside the hover group of vertex `v` and its delete
/// control: the strip between them, as wide as the vertex marker.
pub fn in_vertex_group(v: Vertex, p: Vertex, config: &MapConfig) -> bool {
    let r = config.vertex_radius.max(config.insert_radius);
    let (d2, _) = seg_distance_sq(p, v, delete_anchor(v));
    d2 <= r * r
}

/// Hit-test the overlay.
///
/// Later polygons are drawn on top, so they are tested first. In edit mode the
/// per-vertex controls take precedence over the fill. Sentinel bindings and
/// polygons hidden by `visible` are skipped.
pub fn pick(
    bindings: &[Binding],
    p: Vertex,
    edit_mode: bool,
    visible: impl Fn(usize) -> bool,
    hovered_vertex: Option<(usize, usize)>,
    config: &MapConfig,
) -> Hit {
    if !p.is_finite() {
        return Hit::Empty;
    }
    for (i, b) in bindings.iter().enumerate().rev() {
        if b.polygon.is_empty() || b.is_sentinel() || !visible(i) {
            continue;
        }
        if edit_mode {
            if let Some((hp, hv)) = hovered_vertex {
                if hp == i {
                    if let Some(v) = b.polygon.vertex(hv) {
                        if within(p, delete_anchor(v), config.insert_radius) {
                            return Hit::Delete { polygon: i, vertex: hv };
                        }
                    }
                }
            }
            if let Some(vertex) = b
                .polygon
                .vertices()
                .iter()
                .position(|v| within(p, *v, config.vertex_radius))
            {
                return Hit::Vertex { polygon: i, vertex };
            }
            if let Some(after) = b
                .polygon
                .edge_midpoints()
                .iter()
                .position(|m| within(p, *m, config.insert_radius))
            {
                return Hit::Insert { polygon: i, after };
            }
            if let Some(c) = b.polygon.centroid() {
                if within(p, c, config.centroid_radius) {
                    return Hit::Centroid { polygon: i };
                }
            }
        }
        if b.polygon.contains(p) {
            return Hit::Polygon { polygon: i };
        }
    }
    Hit::Empty
}

/// Transient state of the overlay.
#[derive(Clone, Debug, Default)]
pub struct MapSurface {
    device: Device,
    viewport: Option<Viewport>,
    hovered: Option<usize>,
    highlighted: Option<usize>,
    hovered_vertex: Option<(usize, usize)>,
    tooltip: Option<Tooltip>,
    touch_feedback: Option<(usize, f64)>,
}

impl MapSurface {
    pub fn new(device: Device) -> Self {
        MapSurface {
            device,
            ..Default::default()
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn set_device(&mut self, device: Device) {
        if self.device != device {
            self.device = device;
            self.clear_all();
        }
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Narrow viewports are treated as touch devices.
    pub fn set_viewport(&mut self, viewport: Viewport, config: &MapConfig) {
        self.viewport = Some(viewport);
        let device = if viewport.width <= config.touch_breakpoint_px {
            Device::Touch
        } else {
            Device::Pointer
        };
        self.set_device(device);
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn hovered_vertex(&self) -> Option<(usize, usize)> {
        self.hovered_vertex
    }

    pub fn set_hovered_vertex(&mut self, v: Option<(usize, usize)>) {
        self.hovered_vertex = v;
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.tooltip
    }

    pub fn visual(&self, index: usize) -> Visual {
        if self.highlighted == Some(index) {
            Visual::Highlighted
        } else if self.hovered == Some(index) {
            Visual::Hovered
        } else {
            Visual::Idle
        }
    }

    /// Whether the status glow is drawn: hover, highlight or a live touch flash.
    pub fn shows_glow(&self, index: usize, now: f64) -> bool {
        self.visual(index) != Visual::Idle
            || matches!(self.touch_feedback, Some((i, until)) if i == index && now < until)
    }

    /// Pointer moved over `polygon` (or off every polygon). Ignored on touch devices.
    pub fn hover(&mut self, polygon: Option<usize>, at: Vertex) {
        if self.device == Device::Touch {
            return;
        }
        self.hovered = polygon;
        self.tooltip = polygon.map(|polygon| Tooltip::Follow { polygon, at });
    }

    pub fn leave(&mut self) {
        self.hovered = None;
        self.hovered_vertex = None;
        if matches!(self.tooltip, Some(Tooltip::Follow { .. })) {
            self.tooltip = None;
        }
    }

    pub fn highlight(&mut self, polygon: usize) {
        self.highlighted = Some(polygon);
    }

    /// Touch tap: highlight and open the modal tooltip, replacing any earlier one.
    pub fn open_modal(&mut self, polygon: usize, now: f64, config: &MapConfig) {
        self.highlighted = Some(polygon);
        self.hovered = None;
        self.tooltip = Some(Tooltip::Modal {
            polygon,
            expires_at: now + config.touch_tooltip_ms,
        });
    }

    pub fn flash(&mut self, polygon: usize, now: f64, config: &MapConfig) {
        self.touch_feedback = Some((polygon, now + config.touch_feedback_ms));
    }

    pub fn clear_all(&mut self) {
        self.hovered = None;
        self.highlighted = None;
        self.hovered_vertex = None;
        self.tooltip = None;
        self.touch_feedback = None;
    }

    /// Drop expired deadlines. Returns true if anything changed.
    pub fn tick(&mut self, now: f64) -> bool {
        let mut changed = false;
        if let Some(Tooltip::Modal { polygon, expires_at }) = self.tooltip {
            if now >= expires_at {
                self.tooltip = None;
                if self.highlighted == Some(polygon) {
                    self.highlighted = None;
                }
                changed = true;
            }
        }
        if matches!(self.touch_feedback, Some((_, until)) if now >= until) {
            self.touch_feedback = None;
            changed = true;
        }
        changed
    }

    /// Forget state that points past the end of a shrunk binding list.
    pub fn retain_within(&mut self, len: usize) {
        if self.hovered.map_or(false, |i| i >= len) {
            self.hovered = None;
        }
        if self.highlighted.map_or(false, |i| i >= len) {
            self.highlighted = None;
        }
        if self.hovered_vertex.map_or(false, |(i, _)| i >= len) {
            self.hovered_vertex = None;
        }
        if self.tooltip.map_or(false, |t| t.polygon() >= len) {
            self.tooltip = None;
        }
        if self.touch_feedback.map_or(false, |(i, _)| i >= len) {
            self.touch_feedback = None;
        }
    }
}
