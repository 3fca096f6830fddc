use plotmap::cache::{entry_key, CachedPolygon, COUNT_KEY, SAVED_KEY};
use plotmap::json::{batch_to_json, parse_geometry, parse_units, parse_units_str};
use plotmap::{
    map_units_to_bindings, GeometryRecord, Ident, IngestError, KvStore, MapConfig, MemoryKv,
    RecoveryCache, UnitRecord, Vertex,
};
use serde_json::json;

fn record(b: i64, u: &str, pts: &[(f64, f64)]) -> GeometryRecord {
    GeometryRecord {
        building_number: Ident::from(b),
        unit_number: Ident::from(u),
        vertices: pts.iter().map(|&(x, y)| Vertex::new(x, y)).collect(),
    }
}

const TRI: [(f64, f64); 3] = [(1.0, 1.0), (9.0, 1.0), (5.0, 8.0)];

#[test]
fn write_lays_out_entries_count_and_marker() {
    let mut cache = RecoveryCache::new(MemoryKv::new());
    cache
        .write(&[record(1, "A", &TRI), record(1, "B", &TRI)])
        .unwrap();
    let kv = cache.store();
    assert_eq!(kv.get(COUNT_KEY).as_deref(), Some("2"));
    assert_eq!(kv.get(SAVED_KEY).as_deref(), Some("true"));
    assert_eq!(entry_key(0), "polygon_1");
    assert!(kv.get("polygon_2").unwrap().contains("\"unitNumber\":\"B\""));
    assert_eq!(cache.read().unwrap().count, 2);
}

#[test]
fn keyed_entries_follow_units_after_reorder() {
    let mut cache = RecoveryCache::new(MemoryKv::new());
    cache.write(&[record(1, "B", &TRI)]).unwrap();
    let units = vec![Some(UnitRecord::new(2, "A")), Some(UnitRecord::new(1, "B"))];
    let mut bindings = map_units_to_bindings(&units);
    let applied = cache.read().unwrap().apply_to(&mut bindings);
    assert_eq!(applied, 1);
    assert_eq!(bindings[1].polygon.vertices()[0], Vertex::new(1.0, 1.0));
    assert_eq!(bindings[0].polygon.vertices()[0], Vertex::new(270.0, 150.0));
}

fn legacy_kv(count: usize) -> MemoryKv {
    let mut kv = MemoryKv::new();
    for i in 0..count {
        kv.set(&entry_key(i), r#"[{"x":1,"y":1},{"x":9,"y":1},{"x":5,"y":8}]"#).unwrap();
    }
    kv.set(COUNT_KEY, &count.to_string()).unwrap();
    kv.set(SAVED_KEY, "true").unwrap();
    kv
}

#[test]
fn positional_entries_apply_when_counts_match() {
    let cache = RecoveryCache::new(legacy_kv(2));
    let snap = cache.read().unwrap();
    assert!(matches!(snap.entries[0], Some(CachedPolygon::Positional(_))));
    let units = vec![Some(UnitRecord::new(1, "A")), Some(UnitRecord::new(1, "B"))];
    let mut bindings = map_units_to_bindings(&units);
    assert_eq!(snap.apply_to(&mut bindings), 2);
}

#[test]
fn positional_entries_skipped_on_count_mismatch() {
    let cache = RecoveryCache::new(legacy_kv(3));
    let units = vec![Some(UnitRecord::new(1, "A")), Some(UnitRecord::new(1, "B"))];
    let mut bindings = map_units_to_bindings(&units);
    let fresh = bindings.clone();
    assert_eq!(cache.read().unwrap().apply_to(&mut bindings), 0);
    assert_eq!(bindings, fresh);
}

#[test]
fn malformed_entries_are_dropped() {
    let mut kv = legacy_kv(2);
    kv.set("polygon_2", "{not json").unwrap();
    let cache = RecoveryCache::new(kv);
    let snap = cache.read().unwrap();
    assert!(snap.entries[0].is_some());
    assert!(snap.entries[1].is_none());
}

#[test]
fn clear_removes_everything() {
    let mut cache = RecoveryCache::new(legacy_kv(4));
    cache.clear();
    assert!(cache.store().is_empty());
    assert!(cache.read().is_none());
}

#[test]
fn unit_list_tolerates_bad_entries() {
    let units = parse_units(json!([
        {"buildingNumber": 1, "unitNumber": "A", "status": "available"},
        null,
        {"unitNumber": "B"},
    ]))
    .unwrap();
    assert_eq!(units.len(), 3);
    assert!(units[0].is_some());
    assert!(units[1].is_none());
    assert!(units[2].is_none());
    assert!(parse_units_str("{\"units\": 1}").is_err());
}

#[test]
fn geometry_documents_and_limits() {
    let body = batch_to_json(&[record(1, "A", &TRI)]);
    assert_eq!(body["polygons"][0]["buildingNumber"], json!(1));
    assert_eq!(parse_geometry(body).unwrap().len(), 1);
    let bare = json!([{"buildingNumber": "1", "unitNumber": "A", "vertices": [{"x": 1, "y": 2}]}]);
    assert_eq!(parse_geometry(bare).unwrap()[0].vertices, vec![Vertex::new(1.0, 2.0)]);
    let far = json!([{"buildingNumber": 1, "unitNumber": "A", "vertices": [{"x": 1.0e12, "y": 0}]}]);
    assert_eq!(parse_geometry(far), Err(IngestError::OutOfBounds { index: 0 }));
}

#[test]
fn config_defaults_and_validation() {
    let cfg = MapConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, MapConfig::default());
    assert_eq!(cfg.touch_tooltip_ms, 10_000.0);
    assert_eq!(cfg.row_highlight_ms, 2_000.0);
    assert!(!cfg.edit_mode);
    let edit = MapConfig::from_json_str(r#"{"edit_mode": true, "persist_changes": false}"#).unwrap();
    assert!(edit.edit_mode && !edit.persist_changes);
    assert!(MapConfig::from_json_str(r#"{"vertex_radius": 0}"#).is_err());
    assert!(MapConfig::from_json_str("[").is_err());
}

#[test]
fn empty_outlines_leave_their_slot_unwritten() {
    let mut cache = RecoveryCache::new(MemoryKv::new());
    let sentinel = GeometryRecord {
        building_number: Ident::unknown(),
        unit_number: Ident::unknown(),
        vertices: Vec::new(),
    };
    cache.write(&[record(1, "A", &TRI), sentinel]).unwrap();
    let kv = cache.store();
    assert_eq!(kv.get(COUNT_KEY).as_deref(), Some("2"));
    assert!(kv.get("polygon_2").is_none());

    let snapshot = cache.read().unwrap();
    assert_eq!(snapshot.count, 2);
    assert!(snapshot.entries[0].is_some());
    assert_eq!(snapshot.entries[1], None);

    let units = vec![Some(UnitRecord::new(1, "A")), None];
    let mut bindings = map_units_to_bindings(&units);
    assert_eq!(snapshot.apply_to(&mut bindings), 1);
    assert!(bindings[1].polygon.is_empty());
}
