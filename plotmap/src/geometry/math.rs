use crate::model::Vertex;

#[inline]
pub fn dist_sq(a: Vertex, b: Vertex) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

#[inline]
pub fn within(a: Vertex, b: Vertex, radius: f64) -> bool {
    dist_sq(a, b) <= radius * radius
}

/// Squared distance from `p` to segment `a`-`b`, with the clamped parameter.
pub fn seg_distance_sq(p: Vertex, a: Vertex, b: Vertex) -> (f64, f64) {
    let vx = b.x - a.x; let vy = b.y - a.y;
    let wx = p.x - a.x; let wy = p.y - a.y;
    let vv = vx * vx + vy * vy;
    let t = if vv > 0.0 { ((wx * vx + wy * vy) / vv).clamp(0.0, 1.0) } else { 0.0 };
    let proj = Vertex::new(a.x + t * vx, a.y + t * vy);
    (dist_sq(p, proj), t)
}
