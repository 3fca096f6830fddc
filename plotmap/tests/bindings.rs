use plotmap::geometry::polygon::Polygon;
use plotmap::registry::{
    apply_persisted_geometry, placeholder, resolve_with_source, BindingSource, PLACEHOLDER_CENTER,
};
use plotmap::{map_units_to_bindings, resolve_binding, GeometryRecord, Ident, UnitRecord, UnitStatus, Vertex};

fn pts(p: &Polygon) -> Vec<(f64, f64)> {
    p.vertices().iter().map(|v| (v.x, v.y)).collect()
}

#[test]
fn unit_1a_resolves_from_table() {
    let units = vec![Some(UnitRecord::new(1, "A"))];
    let bindings = map_units_to_bindings(&units);
    assert_eq!(bindings.len(), 1);
    assert_eq!(
        pts(&bindings[0].polygon),
        vec![
            (200.0, 150.0),
            (225.0, 140.0),
            (250.0, 150.0),
            (250.0, 175.0),
            (225.0, 200.0),
            (200.0, 175.0)
        ]
    );
}

#[test]
fn identifiers_are_normalized_before_lookup() {
    let a = resolve_binding(&Ident::from(" 1 "), &Ident::from(" a"), None);
    let b = resolve_binding(&Ident::from(1), &Ident::from("A"), None);
    assert_eq!(a, b);
    let (_, source) = resolve_with_source(&Ident::from("07"), &Ident::from("b"), None);
    assert_eq!(source, BindingSource::Table);
}

#[test]
fn custom_vertices_win_over_table() {
    let custom = vec![Vertex::new(1.0, 2.0), Vertex::new(3.0, 4.0), Vertex::new(5.0, 1.0)];
    let (p, source) = resolve_with_source(&Ident::from(1), &Ident::from("A"), Some(custom.as_slice()));
    assert_eq!(source, BindingSource::Custom);
    assert_eq!(p.vertices(), custom.as_slice());
}

#[test]
fn empty_custom_vertices_fall_through() {
    let (_, source) = resolve_with_source(&Ident::from(1), &Ident::from("A"), Some(&[] as &[Vertex]));
    assert_eq!(source, BindingSource::Table);
}

#[test]
fn unknown_unit_gets_placeholder_hexagon() {
    let p = resolve_binding(&Ident::from(99), &Ident::from("Z"), None);
    assert_eq!(p, placeholder());
    assert_eq!(p.len(), 6);
    assert_eq!(p.centroid(), Some(PLACEHOLDER_CENTER));
    assert_eq!(PLACEHOLDER_CENTER, Vertex::new(325.0, 315.0));
}

#[test]
fn missing_records_become_sentinels_in_place() {
    let units = vec![
        Some(UnitRecord::new(1, "A").with_status(UnitStatus::Reserved)),
        None,
        Some(UnitRecord::new(2, "B")),
    ];
    let bindings = map_units_to_bindings(&units);
    assert_eq!(bindings.len(), 3);
    assert!(bindings[1].is_sentinel());
    assert!(bindings[1].polygon.is_empty());
    assert_eq!(bindings[1].status, UnitStatus::Unavailable);
    assert_eq!(bindings[1].building_number, Ident::from("unknown"));
    assert!(!bindings[1].is_available);
    assert_eq!(bindings[0].status, UnitStatus::Reserved);
    assert_eq!(bindings[2].source_unit_index, 2);
}

#[test]
fn persisted_geometry_attaches_by_identity() {
    let mut units = vec![Some(UnitRecord::new(1, "A")), Some(UnitRecord::new("2", "b"))];
    let outline = vec![Vertex::new(0.0, 0.0), Vertex::new(9.0, 0.0), Vertex::new(9.0, 9.0)];
    let records = vec![GeometryRecord {
        building_number: Ident::from(2),
        unit_number: Ident::from("B"),
        vertices: outline.clone(),
    }];
    assert_eq!(apply_persisted_geometry(&mut units, &records), 1);
    let bindings = map_units_to_bindings(&units);
    assert_eq!(bindings[1].polygon.vertices(), outline.as_slice());
    assert_eq!(pts(&bindings[0].polygon)[0], (200.0, 150.0));
}

#[test]
fn unit_records_parse_from_camel_case() {
    let u: UnitRecord = serde_json::from_str(
        r#"{"buildingNumber": 3.0, "unitNumber": "A", "pricePerM2": 9000, "status": "sold-not-transferred"}"#,
    )
    .unwrap();
    assert_eq!(u.building_number, Ident::Number(3));
    assert_eq!(u.status, Some(UnitStatus::SoldNotTransferred));
    let odd: UnitRecord =
        serde_json::from_str(r#"{"buildingNumber": 1, "unitNumber": "A", "status": "pending"}"#).unwrap();
    assert_eq!(odd.status, Some(UnitStatus::Unknown));
}
