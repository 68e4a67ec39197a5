use refresher_engine::{app_data_dir, base_data_dir, APP_NAME};
use tempfile::TempDir;

#[test]
fn override_wins_and_app_folder_is_created() {
    let temp = TempDir::new().unwrap();
    let dir = app_data_dir(Some(temp.path())).unwrap();
    assert_eq!(dir, temp.path().join(APP_NAME));
    assert!(dir.is_dir());
}

#[test]
fn base_dir_without_override_is_resolved() {
    let temp = TempDir::new().unwrap();
    assert_eq!(base_data_dir(Some(temp.path())).as_deref(), Some(temp.path()));
}

#[test]
fn unusable_base_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain-file");
    std::fs::write(&file, "x").unwrap();
    assert!(app_data_dir(Some(&file)).is_err());
}
