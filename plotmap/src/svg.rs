use crate::config::MapConfig;
use crate::model::{Binding, Rgb, UnitStatus, RED};
use crate::session::DragState;
use crate::surface::{delete_anchor, MapSurface};

const IDLE_FILL_ALPHA: f32 = 0.01;
const HOVER_FILL_ALPHA: f32 = 0.7;
const GLOW_STROKE_ALPHA: f32 = 0.6;
const GLOW_STROKE_WIDTH: f64 = 8.0;
const EDGE_COLOR: &str = "#d7c28d";
const CENTROID_COLOR: &str = "#4a90e2";
const ACTIVE_COLOR: &str = "#ff0000";
const INSERT_COLOR: &str = "#22c55e";

/// Everything the overlay needs for one frame.
pub struct Frame<'a> {
    pub bindings: &'a [Binding],
    pub visible: &'a dyn Fn(usize) -> bool,
    pub surface: &'a MapSurface,
    pub drag: DragState,
    pub edit_mode: bool,
    pub now: f64,
}

fn glow_filter(id: &str, color: Rgb) -> String {
    format!(
        "<filter id=\"{}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\
<feGaussianBlur in=\"SourceGraphic\" stdDeviation=\"4\" result=\"blur\"/>\
<feFlood flood-color=\"{}\"/><feComposite in2=\"blur\" operator=\"in\"/>\
<feMerge><feMergeNode/><feMergeNode in=\"SourceGraphic\"/></feMerge></filter>",
        id,
        color.rgba(1.0)
    )
}

fn defs() -> String {
    let statuses = [
        UnitStatus::Available,
        UnitStatus::Reserved,
        UnitStatus::SoldTransferred,
        UnitStatus::Unavailable,
        UnitStatus::Unknown,
    ];
    let mut out = String::from("<defs>");
    for s in statuses {
        out.push_str(&glow_filter(s.glow_filter(), s.highlight_color()));
    }
    out.push_str(
        "<filter id=\"blurredStroke\"><feGaussianBlur stdDeviation=\"3\"/></filter>\
<filter id=\"doubleFeather\"><feGaussianBlur stdDeviation=\"1\"/></filter>",
    );
    out.push_str("</defs>");
    out
}

fn polygon_svg(out: &mut String, index: usize, b: &Binding, frame: &Frame, config: &MapConfig) {
    let points = b.polygon.points_attr();
    let color = b.status.highlight_color();
    let glow = frame.surface.shows_glow(index, frame.now);
    let fill_alpha = if glow { HOVER_FILL_ALPHA } else { IDLE_FILL_ALPHA };
    let feather = if frame.edit_mode { "" } else { " filter=\"url(#doubleFeather)\"" };
    out.push_str(&format!(
        "<polygon data-index=\"{}\" points=\"{}\" fill=\"{}\" stroke=\"transparent\"{}/>",
        index,
        points,
        color.rgba(fill_alpha),
        feather
    ));
    if glow {
        out.push_str(&format!(
            "<polygon points=\"{}\" fill=\"transparent\" stroke=\"{}\" stroke-width=\"{}\" filter=\"url(#{})\" pointer-events=\"none\"/>",
            points,
            color.rgba(GLOW_STROKE_ALPHA),
            GLOW_STROKE_WIDTH,
            b.status.glow_filter()
        ));
    }
    if !frame.edit_mode {
        return;
    }

    for (_, a, z) in b.polygon.edges() {
        out.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"5,5\" opacity=\"0.7\"/>",
            a.x, a.y, z.x, z.y, EDGE_COLOR
        ));
    }
    if let Some(c) = b.polygon.centroid() {
        let dragging = matches!(frame.drag, DragState::Polygon(d) if d.polygon_index == index);
        out.push_str(&format!(
            "<circle class=\"centroid\" cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"#fff\" stroke-width=\"2\"/>",
            c.x,
            c.y,
            config.centroid_radius,
            if dragging { ACTIVE_COLOR } else { CENTROID_COLOR }
        ));
    }
    for (vi, v) in b.polygon.vertices().iter().enumerate() {
        let dragging = matches!(frame.drag, DragState::Vertex(d) if d.polygon_index == index && d.vertex_index == vi);
        out.push_str(&format!(
            "<circle class=\"vertex\" cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"#000\" stroke-width=\"1\"/>",
            v.x,
            v.y,
            config.vertex_radius,
            if dragging { ACTIVE_COLOR } else { EDGE_COLOR }
        ));
    }
    for m in b.polygon.edge_midpoints() {
        out.push_str(&format!(
            "<g class=\"insert\"><circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"#fff\" stroke-width=\"2\" opacity=\"0.7\"/>\
<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"8\" fill=\"#fff\" pointer-events=\"none\">+</text></g>",
            m.x,
            m.y,
            config.insert_radius,
            INSERT_COLOR,
            m.x,
            m.y + 1.0
        ));
    }
    if let Some((hp, hv)) = frame.surface.hovered_vertex() {
        if hp == index {
            if let Some(v) = b.polygon.vertex(hv) {
                let d = delete_anchor(v);
                out.push_str(&format!(
                    "<g class=\"delete\"><circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>\
<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"8\" fill=\"#fff\" pointer-events=\"none\">×</text></g>",
                    d.x,
                    d.y,
                    config.insert_radius,
                    RED.rgba(1.0),
                    d.x,
                    d.y + 3.0
                ));
            }
        }
    }
}

/// Overlay document in logical coordinates, stretched over the base image.
pub fn render_overlay(frame: &Frame, config: &MapConfig) -> String {
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {} {}\" preserveAspectRatio=\"none\">",
        config.canvas_width, config.canvas_height
    );
    out.push_str(&defs());
    for (i, b) in frame.bindings.iter().enumerate() {
        if b.polygon.is_empty() || b.is_sentinel() || !(frame.visible)(i) {
            continue;
        }
        polygon_svg(&mut out, i, b, frame, config);
    }
    out.push_str("</svg>");
    out
}
