use plotmap::{GeometryError, Polygon, Vertex};
use proptest::prelude::*;

fn polygon_strategy() -> impl Strategy<Value = Polygon> {
    prop::collection::vec((-1000i32..1000, -1000i32..1000), 3..12).prop_map(|pts| {
        Polygon::new(
            pts.into_iter()
                .map(|(x, y)| Vertex::new(x as f64, y as f64))
                .collect(),
        )
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #[test]
    fn remove_vertex_shrinks_or_refuses(p in polygon_strategy(), idx in 0usize..12) {
        let before = p.clone();
        let idx = idx % p.len();
        match p.remove_vertex(idx) {
            Ok(q) => {
                prop_assert!(p.len() > 3);
                prop_assert_eq!(q.len(), p.len() - 1);
            }
            Err(e) => {
                prop_assert_eq!(p.len(), 3);
                prop_assert_eq!(e, GeometryError::TooFewVertices { len: 3 });
            }
        }
        prop_assert_eq!(p, before);
    }

    #[test]
    fn insert_midpoint_places_mean_of_neighbours(p in polygon_strategy(), idx in 0usize..12) {
        let i = idx % p.len();
        let q = p.insert_midpoint(i).unwrap();
        prop_assert_eq!(q.len(), p.len() + 1);
        let a = p.vertex(i).unwrap();
        let b = p.vertex((i + 1) % p.len()).unwrap();
        let m = q.vertex(i + 1).unwrap();
        prop_assert!(close(m.x, (a.x + b.x) / 2.0));
        prop_assert!(close(m.y, (a.y + b.y) / 2.0));
    }

    #[test]
    fn insert_past_end_is_rejected(p in polygon_strategy(), extra in 0usize..5) {
        let n = p.len();
        prop_assert_eq!(
            p.insert_midpoint(n + extra),
            Err(GeometryError::InvalidIndex { index: n + extra, len: n })
        );
    }

    #[test]
    fn centroid_ignores_rotation(p in polygon_strategy(), shift in 0usize..12) {
        let mut vs = p.vertices().to_vec();
        let k = shift % vs.len();
        vs.rotate_left(k);
        let a = p.centroid().unwrap();
        let b = Polygon::new(vs).centroid().unwrap();
        prop_assert!(close(a.x, b.x));
        prop_assert!(close(a.y, b.y));
    }

    #[test]
    fn centroid_scales_linearly(p in polygon_strategy(), s in 1i32..20) {
        let s = s as f64 * 0.5;
        let a = p.centroid().unwrap();
        let b = p.scaled(s, s).centroid().unwrap();
        prop_assert!(close(b.x, a.x * s));
        prop_assert!(close(b.y, a.y * s));
    }
}

#[test]
fn square_insert_after_first_vertex() {
    let square = Polygon::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    let q = square.insert_midpoint(0).unwrap();
    assert_eq!(q.len(), 5);
    assert_eq!(q.vertex(1), Some(Vertex::new(5.0, 0.0)));
    assert_eq!(q.vertex(2), Some(Vertex::new(10.0, 0.0)));
}

#[test]
fn insert_after_last_wraps_to_first() {
    let tri = Polygon::from_points(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
    let q = tri.insert_midpoint(2).unwrap();
    assert_eq!(q.vertex(3), Some(Vertex::new(0.0, 5.0)));
}

#[test]
fn triangle_keeps_its_vertices() {
    let tri = Polygon::from_points(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
    assert_eq!(tri.remove_vertex(1), Err(GeometryError::TooFewVertices { len: 3 }));
    assert_eq!(tri.len(), 3);
}

#[test]
fn remove_out_of_range_is_invalid_index() {
    let sq = Polygon::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    assert_eq!(
        sq.remove_vertex(7),
        Err(GeometryError::InvalidIndex { index: 7, len: 4 })
    );
}

#[test]
fn moving_a_vertex_to_nan_is_refused() {
    let sq = Polygon::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    assert_eq!(
        sq.with_vertex(0, Vertex::new(f64::NAN, 1.0)),
        Err(GeometryError::NonFinite)
    );
}
