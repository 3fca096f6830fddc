use plotmap::cache::RecoveryCache;
use plotmap::controller::{MSG_MIN_VERTICES, MSG_RESTORED, MSG_SAVED, MSG_SAVE_FAILED};
use plotmap::{
    map_units_to_bindings, Binding, Clipboard, ClipboardError, DragState, EditController,
    EditSession, GeometryError, GeometryRecord, GeometrySource, GeometryStore, Ident, Level,
    MapConfig, MemoryKv, Notification, StoreError, UnitRecord, Vertex,
};
use proptest::prelude::*;

#[derive(Default)]
struct FakeStore {
    saved: Vec<Vec<GeometryRecord>>,
    fail: bool,
}

impl GeometryStore for FakeStore {
    fn save_geometry(&mut self, batch: &[GeometryRecord]) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Save("offline".into()));
        }
        self.saved.push(batch.to_vec());
        Ok(())
    }
}

impl GeometrySource for FakeStore {
    fn load_geometry(&self) -> Result<Vec<GeometryRecord>, StoreError> {
        Ok(self.saved.last().cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeClipboard {
    text: Option<String>,
    broken: bool,
}

impl Clipboard for FakeClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.broken {
            return Err(ClipboardError("denied".into()));
        }
        self.text = Some(text.to_string());
        Ok(())
    }
}

fn two_units() -> Vec<Option<UnitRecord>> {
    vec![Some(UnitRecord::new(1, "A")), Some(UnitRecord::new(1, "B"))]
}

fn editing(units: &[Option<UnitRecord>]) -> (EditController, RecoveryCache<MemoryKv>) {
    let cache = RecoveryCache::new(MemoryKv::new());
    let mut c = EditController::new(&MapConfig::editing());
    c.load_bindings(map_units_to_bindings(units), &cache);
    (c, cache)
}

proptest! {
    #[test]
    fn vertex_drag_keeps_cursor_offset(
        ox in -5i32..5, oy in -5i32..5,
        dx in -300i32..300, dy in -300i32..300,
    ) {
        let mut s = EditSession::new(map_units_to_bindings(&two_units()));
        let v = s.polygon(0).unwrap().vertex(2).unwrap();
        let cursor = Vertex::new(v.x + ox as f64, v.y + oy as f64);
        s.begin_vertex_drag(0, 2, cursor).unwrap();
        s.update_drag(Vertex::new(cursor.x + dx as f64, cursor.y + dy as f64));
        let moved = s.polygon(0).unwrap().vertex(2).unwrap();
        prop_assert_eq!(moved, Vertex::new(v.x + dx as f64, v.y + dy as f64));
    }

    #[test]
    fn polygon_drag_translates_every_vertex(dx in -200i32..200, dy in -200i32..200) {
        let mut s = EditSession::new(map_units_to_bindings(&two_units()));
        let before = s.polygon(1).unwrap().clone();
        let c = before.centroid().unwrap();
        let cursor = Vertex::new(c.x + 3.0, c.y - 2.0);
        s.begin_polygon_drag(1, cursor).unwrap();
        s.update_drag(Vertex::new(cursor.x + dx as f64, cursor.y + dy as f64));
        for (a, b) in before.vertices().iter().zip(s.polygon(1).unwrap().vertices()) {
            prop_assert!((b.x - a.x - dx as f64).abs() < 1e-9);
            prop_assert!((b.y - a.y - dy as f64).abs() < 1e-9);
        }
    }
}

#[test]
fn drag_lifecycle_marks_unsaved_on_end() {
    let mut s = EditSession::new(map_units_to_bindings(&two_units()));
    s.begin_vertex_drag(0, 0, Vertex::new(201.0, 151.0)).unwrap();
    assert!(matches!(s.drag(), DragState::Vertex(_)));
    assert!(s.update_drag(Vertex::new(210.0, 160.0)));
    assert!(s.end_drag());
    assert_eq!(s.drag(), DragState::Idle);
    assert!(s.has_unsaved_edits());
    assert!(!s.end_drag());
}

#[test]
fn non_finite_cursor_is_skipped() {
    let mut s = EditSession::new(map_units_to_bindings(&two_units()));
    let before = s.working().to_vec();
    assert_eq!(
        s.begin_vertex_drag(0, 0, Vertex::new(f64::NAN, 0.0)),
        Err(GeometryError::NonFinite)
    );
    s.begin_vertex_drag(0, 0, Vertex::new(200.0, 150.0)).unwrap();
    assert!(!s.update_drag(Vertex::new(f64::INFINITY, 1.0)));
    assert_eq!(s.working(), before.as_slice());
}

#[test]
fn snapshot_is_not_touched_by_later_drags() {
    let mut s = EditSession::new(map_units_to_bindings(&two_units()));
    let snap = s.snapshot();
    s.begin_polygon_drag(0, Vertex::new(225.0, 165.0)).unwrap();
    s.update_drag(Vertex::new(400.0, 400.0));
    assert_ne!(snap[0].polygon, s.working()[0].polygon);
}

#[test]
fn rekey_keeps_edited_outline_by_identity() {
    let mut s = EditSession::new(map_units_to_bindings(&two_units()));
    s.insert_vertex(1, 0).unwrap();
    let edited = s.polygon(1).unwrap().clone();
    let reordered = vec![
        Some(UnitRecord::new(2, "A")),
        Some(UnitRecord::new(1, "B")),
        Some(UnitRecord::new(1, "A")),
    ];
    s.rekey(map_units_to_bindings(&reordered));
    assert_eq!(s.len(), 3);
    assert_eq!(s.polygon(1), Some(&edited));
    assert_eq!(s.working()[1].source_unit_index, 1);
}

#[test]
fn mutations_need_edit_mode() {
    let cache = RecoveryCache::new(MemoryKv::new());
    let mut c = EditController::new(&MapConfig::default());
    c.load_bindings(map_units_to_bindings(&two_units()), &cache);
    let mut notes: Vec<Notification> = Vec::new();
    assert_eq!(c.insert_vertex(0, 0, &mut notes), Err(GeometryError::EditDisabled));
    assert!(c.begin_vertex_drag(0, 0, Vertex::new(200.0, 150.0)).is_err());
    assert!(!c.toggle_area_visibility(0));
    assert!(c.is_area_visible(0));
    assert!(!c.has_unsaved_edits());
}

#[test]
fn removing_from_triangle_notifies() {
    let tri = vec![Vertex::new(0.0, 0.0), Vertex::new(10.0, 0.0), Vertex::new(0.0, 10.0)];
    let units = vec![Some(UnitRecord::new(1, "A").with_vertices(tri))];
    let (mut c, _) = editing(&units);
    let mut notes: Vec<Notification> = Vec::new();
    assert_eq!(
        c.remove_vertex(0, 0, &mut notes),
        Err(GeometryError::TooFewVertices { len: 3 })
    );
    assert_eq!(notes[0].message, MSG_MIN_VERTICES);
    assert_eq!(notes[0].level, Level::Error);
    assert_eq!(c.working()[0].polygon.len(), 3);
    assert!(!c.has_unsaved_edits());
}

#[test]
fn insert_announces_polygon_number() {
    let (mut c, _) = editing(&two_units());
    let mut notes: Vec<Notification> = Vec::new();
    c.insert_vertex(1, 5, &mut notes).unwrap();
    assert_eq!(notes[0].message, "Added vertex to polygon 2");
    assert_eq!(c.working()[1].polygon.len(), 7);
    assert!(c.has_unsaved_edits());
}

#[test]
fn visibility_toggles() {
    let (mut c, _) = editing(&two_units());
    assert!(c.toggle_area_visibility(1));
    assert!(!c.is_area_visible(1));
    c.hide_all_areas();
    assert!(!c.is_area_visible(0));
    c.show_all_areas();
    assert!(c.is_area_visible(0) && c.is_area_visible(1));
    assert!(!c.toggle_area_visibility(9));
}

#[test]
fn persist_sends_one_batch_with_identities() {
    let (mut c, mut cache) = editing(&two_units());
    let mut notes: Vec<Notification> = Vec::new();
    c.begin_vertex_drag(1, 0, Vertex::new(200.0, 210.0)).unwrap();
    c.update_drag(Vertex::new(190.0, 205.0));
    c.end_drag();

    let mut store = FakeStore::default();
    assert!(c.persist_changes(&mut store, &mut cache, &mut notes));
    assert_eq!(store.saved.len(), 1);
    let batch = &store.saved[0];
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].building_number, Ident::from(1));
    assert_eq!(batch[0].unit_number, Ident::from("A"));
    assert_eq!(batch[0].vertices, c.working()[0].polygon.vertices());
    assert_eq!(batch[1].unit_number, Ident::from("B"));
    assert_eq!(batch[1].vertices[0], Vertex::new(190.0, 205.0));
    assert!(!c.has_unsaved_edits());
    assert_eq!(notes.last().map(|n| n.message.as_str()), Some(MSG_SAVED));
    assert!(cache.has_marker());
}

#[test]
fn persist_skips_sentinels() {
    let units = vec![Some(UnitRecord::new(1, "A")), None];
    let (c, mut cache) = editing(&units);
    let batch = c.begin_persist(&mut cache).unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.bindings().len(), 2);
}

#[test]
fn failed_persist_keeps_edits() {
    let (mut c, mut cache) = editing(&two_units());
    let mut notes: Vec<Notification> = Vec::new();
    c.insert_vertex(0, 0, &mut notes).unwrap();
    let mut store = FakeStore { fail: true, ..Default::default() };
    assert!(!c.persist_changes(&mut store, &mut cache, &mut notes));
    assert!(c.has_unsaved_edits());
    assert_eq!(c.working()[0].polygon.len(), 7);
    let last = notes.last().unwrap();
    assert_eq!((last.message.as_str(), last.level), (MSG_SAVE_FAILED, Level::Error));
}

#[test]
fn save_completing_after_new_edit_keeps_unsaved_flag() {
    let (mut c, mut cache) = editing(&two_units());
    let mut notes: Vec<Notification> = Vec::new();
    let batch = c.begin_persist(&mut cache).unwrap();
    c.insert_vertex(0, 1, &mut notes).unwrap();
    c.finish_persist(&batch, Ok(()), &mut notes);
    assert!(c.has_unsaved_edits());
    assert_eq!(batch.bindings()[0].polygon.len(), 6);
}

#[test]
fn restore_matches_fresh_derivation_and_clears_cache() {
    let units = two_units();
    let (mut c, mut cache) = editing(&units);
    let mut notes: Vec<Notification> = Vec::new();
    c.insert_vertex(0, 0, &mut notes).unwrap();
    c.begin_persist(&mut cache).unwrap();
    assert!(cache.has_marker());

    assert!(c.restore_previous_version(&mut cache, &mut notes));
    let fresh: Vec<Binding> = map_units_to_bindings(&units);
    assert_eq!(c.working(), fresh.as_slice());
    assert!(!c.has_unsaved_edits());
    assert!(cache.read().is_none());
    assert!(!cache.has_marker());
    assert!(cache.store().is_empty());
    assert_eq!(notes.last().map(|n| n.message.as_str()), Some(MSG_RESTORED));
}

#[test]
fn reload_seeds_from_recovery_cache() {
    let units = two_units();
    let (mut c, mut cache) = editing(&units);
    let mut notes: Vec<Notification> = Vec::new();
    c.insert_vertex(1, 2, &mut notes).unwrap();
    c.begin_persist(&mut cache).unwrap();
    let edited = c.working().to_vec();

    let mut reloaded = EditController::new(&MapConfig::editing());
    reloaded.load_bindings(map_units_to_bindings(&units), &cache);
    assert!(reloaded.seeded_from_cache());
    assert!(reloaded.has_unsaved_edits());
    assert_eq!(reloaded.working(), edited.as_slice());
}

#[test]
fn reload_ignores_cache_when_persist_flag_off() {
    let units = two_units();
    let (mut c, mut cache) = editing(&units);
    let mut notes: Vec<Notification> = Vec::new();
    c.insert_vertex(1, 2, &mut notes).unwrap();
    c.begin_persist(&mut cache).unwrap();

    let cfg = MapConfig { persist_changes: false, ..MapConfig::editing() };
    let mut reloaded = EditController::new(&cfg);
    reloaded.load_bindings(map_units_to_bindings(&units), &cache);
    assert!(!reloaded.seeded_from_cache());
    assert_eq!(reloaded.working(), map_units_to_bindings(&units).as_slice());
}

#[test]
fn clipboard_gets_source_listing() {
    let (c, _) = editing(&two_units());
    let mut clip = FakeClipboard::default();
    assert!(c.copy_coordinates_to_clipboard(&mut clip));
    let text = clip.text.unwrap();
    assert!(text.starts_with("// Polygon 1\nexport const polygonVertices: Vertex[] = ["));
    assert!(text.contains("// Polygon 2\nexport const polygonVertices2: Vertex[]"));

    let mut broken = FakeClipboard { broken: true, ..Default::default() };
    assert!(!c.copy_coordinates_to_clipboard(&mut broken));
}
