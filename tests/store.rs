mod common;

use std::fs;
use std::time::{Duration, SystemTime};

use docxide_report::store::OutputStore;

fn fresh_dir(name: &str) -> std::path::PathBuf {
    let dir = common::output_dir("store").join(name);
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn save_then_find() {
    let _ = env_logger::try_init();
    let store = OutputStore::new(fresh_dir("save_then_find"));

    let saved = store.save(b"docx bytes", "TYPE_A_20230529_Cell_report.docx").unwrap();
    let file_id = saved.file_id.clone().unwrap();
    assert_eq!(file_id.len(), 36);
    assert_eq!(saved.size_bytes, 10);
    assert!(
        saved
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&file_id)
    );

    let found = store.find(&file_id).unwrap().unwrap();
    assert_eq!(found.path, saved.path);
    assert_eq!(found.filename, "TYPE_A_20230529_Cell_report.docx");
    assert_eq!(found.file_id.as_deref(), Some(file_id.as_str()));
}

#[test]
fn short_or_unknown_ids_are_not_found() {
    let _ = env_logger::try_init();
    let store = OutputStore::new(fresh_dir("unknown_ids"));
    store.save(b"x", "a.docx").unwrap();

    assert!(store.find("abc").unwrap().is_none());
    assert!(store.find("").unwrap().is_none());
    assert!(
        store
            .find("00000000-0000-0000-0000-000000000000")
            .unwrap()
            .is_none()
    );
}

#[test]
fn list_only_reports_docx_files() {
    let _ = env_logger::try_init();
    let dir = fresh_dir("list");
    let store = OutputStore::new(&dir);
    assert!(store.list().unwrap().is_empty());

    store.save(b"one", "one.docx").unwrap();
    store.save(b"two", "two.docx").unwrap();
    fs::write(dir.join("notes.txt"), "ignore me").unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    let mut names: Vec<&str> = listed.iter().map(|r| r.filename.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["one.docx", "two.docx"]);
    assert!(listed[0].created_at >= listed[1].created_at);
}

#[test]
fn cleanup_removes_only_old_files() {
    let _ = env_logger::try_init();
    let dir = fresh_dir("cleanup");
    let store = OutputStore::new(&dir);

    let old = store.save(b"old", "old.docx").unwrap();
    let fresh = store.save(b"new", "new.docx").unwrap();
    let two_days_ago = SystemTime::now() - Duration::from_secs(48 * 3600);
    fs::File::options()
        .write(true)
        .open(&old.path)
        .unwrap()
        .set_modified(two_days_ago)
        .unwrap();

    assert_eq!(store.cleanup_older_than(24).unwrap(), 1);
    assert!(!old.path.exists());
    assert!(fresh.path.exists());
    assert_eq!(store.cleanup_older_than(24).unwrap(), 0);
}

#[test]
fn missing_directory_is_empty() {
    let store = OutputStore::new(fresh_dir("never_created"));
    assert!(store.list().unwrap().is_empty());
    assert_eq!(store.cleanup_older_than(1).unwrap(), 0);
    assert!(
        store
            .find("00000000-0000-0000-0000-000000000000")
            .unwrap()
            .is_none()
    );
}

#[test]
fn huge_cleanup_age_keeps_everything() {
    let _ = env_logger::try_init();
    let store = OutputStore::new(fresh_dir("huge_age"));
    let saved = store.save(b"keep", "keep.docx").unwrap();

    assert_eq!(store.cleanup_older_than(u64::MAX).unwrap(), 0);
    assert!(saved.path.exists());
}
