use std::fs;

use chrono::{Local, TimeZone};
use indexmap::IndexMap;
use refresher_engine::{ensure_writable_dir, snapshot_filename, SnapshotStore};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn creates_missing_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("a").join("b");
    ensure_writable_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn file_in_place_of_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();
    assert!(ensure_writable_dir(&file_path).is_err());
}

#[test]
fn filenames_embed_sortable_timestamp() {
    let at = Local.with_ymd_and_hms(2024, 7, 3, 9, 5, 1).unwrap();
    assert_eq!(snapshot_filename(at), "x_api_details_2024-07-03_09-05-01.json");

    let later = Local.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap();
    assert!(snapshot_filename(at) < snapshot_filename(later));
}

#[test]
fn same_second_snapshots_never_overwrite() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path().to_path_buf());
    let at = Local.with_ymd_and_hms(2024, 7, 3, 9, 5, 1).unwrap();

    let mut first = IndexMap::new();
    first.insert(1u64, json!({"v": 1}));
    let mut second = IndexMap::new();
    second.insert(1u64, json!({"v": 2}));

    let a = store.write(&first, at).unwrap();
    let b = store.write(&second, at).unwrap();

    assert_ne!(a, b);
    assert_eq!(b.file_name().unwrap(), "x_api_details_2024-07-03_09-05-01_1.json");
    let a_json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&a).unwrap()).unwrap();
    let b_json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&b).unwrap()).unwrap();
    assert_eq!(a_json["1"]["v"], 1);
    assert_eq!(b_json["1"]["v"], 2);
}

#[test]
fn write_creates_a_missing_snapshot_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("snapshots");
    let store = SnapshotStore::new(dir.clone());
    let at = Local.with_ymd_and_hms(2024, 7, 3, 9, 5, 1).unwrap();

    let path = store.write(&IndexMap::new(), at).unwrap();
    assert_eq!(path.parent(), Some(dir.as_path()));
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
}
