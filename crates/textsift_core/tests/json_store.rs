use std::fs;
use std::sync::Arc;
use std::thread;
use textsift_core::{
    Category, CoreConfig, EntryStatus, EntryStore, JsonFileStore, LifecycleError,
    LifecycleManager, StoreError, StoreLoad, StoreState,
};

#[test]
fn missing_file_loads_as_empty_without_creating_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = JsonFileStore::new(&path);

    assert_eq!(store.load().unwrap(), StoreLoad::Missing);
    let manager = LifecycleManager::open(store).unwrap();
    assert!(manager.snapshot().is_empty());
    assert!(!path.exists());
}

#[test]
fn malformed_file_is_surfaced_not_emptied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ not json").unwrap();

    let err = LifecycleManager::open(JsonFileStore::new(&path))
        .err()
        .expect("malformed store must fail to open");
    assert!(matches!(
        err,
        LifecycleError::Persistence(StoreError::Malformed { .. })
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn structurally_invalid_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(
        &path,
        r#"{"version": 1, "formula_data": [
            {"id": "6f1c1f7e-8c4e-4c43-9a43-2d1c0a6f9b10", "content": "!!", "timestamp": "2024-05-01 10:00:00", "status": "trash", "type": "trash"}
        ], "trash_data": []}"#,
    )
    .unwrap();

    let err = JsonFileStore::new(&path).load().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData { .. }));
}

#[test]
fn save_then_load_reproduces_state_and_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let manager = LifecycleManager::open(JsonFileStore::new(&path)).unwrap();
    let formula = manager.submit("x+y=2").unwrap();
    manager.submit("hello, world!").unwrap();
    manager.submit("!!!").unwrap();
    manager.move_to_trash(formula.id).unwrap();
    let expected = manager.snapshot();
    let bytes_before = fs::read(&path).unwrap();

    let store = JsonFileStore::new(&path);
    let loaded = store.load().unwrap();
    assert_eq!(loaded, StoreLoad::Current(expected.clone()));

    store.save(&loaded.into_state()).unwrap();
    assert_eq!(fs::read(&path).unwrap(), bytes_before);

    let reopened = LifecycleManager::open(JsonFileStore::new(&path)).unwrap();
    assert_eq!(reopened.snapshot(), expected);
}

#[test]
fn persisted_document_uses_expected_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let manager = LifecycleManager::open(JsonFileStore::new(&path)).unwrap();
    let kept = manager.submit("a = b + c").unwrap();
    manager.submit("   ").unwrap();

    let doc: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);
    let active = doc["formula_data"].as_array().unwrap();
    let trash = doc["trash_data"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(trash.len(), 1);
    assert_eq!(active[0]["id"], kept.id.to_string());
    assert_eq!(active[0]["content"], "a = b + c");
    assert_eq!(active[0]["status"], "active");
    assert_eq!(active[0]["type"], "formula");
    assert_eq!(trash[0]["status"], "trash");
    assert_eq!(trash[0]["type"], "trash");
}

#[test]
fn save_leaves_no_temp_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let manager = LifecycleManager::open(JsonFileStore::new(&path)).unwrap();
    for text in ["a", "b!", "?"] {
        manager.submit(text).unwrap();
    }

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
}

#[test]
fn failed_write_keeps_previous_file_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    let path = blocker.join("store.json");
    let manager = LifecycleManager::open(JsonFileStore::new(&path)).unwrap();

    // The parent directory cannot be created once a file takes its name.
    fs::write(&blocker, "file in the way").unwrap();
    let err = manager.submit("x = 1").unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Persistence(StoreError::Io { .. })
    ));
    assert!(manager.snapshot().is_empty());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "file in the way");
}

#[test]
fn legacy_document_is_upgraded_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data_storage.json");
    fs::write(
        &path,
        r#"{
    "formula_data": [
        {"content": "E = mc2", "timestamp": "2024-03-01 08:00:00", "status": "active", "type": "formula"},
        {"content": "meeting notes, v2", "timestamp": "2024-03-01 08:05:00", "status": "active", "type": "normal"}
    ],
    "trash_data": [
        {"content": "@@@", "timestamp": "2024-03-01 08:10:00", "status": "trash"}
    ]
}"#,
    )
    .unwrap();

    let manager = LifecycleManager::open(JsonFileStore::new(&path)).unwrap();
    let active = manager.list_active();
    assert_eq!(active.len(), 2);
    assert_eq!(active[1].category, Category::Normal);
    assert_eq!(manager.list_trash()[0].category, Category::Trash);
    assert_eq!(manager.list_trash()[0].status, EntryStatus::Trashed);

    // The upgraded document is written back with stable ids.
    let reloaded = JsonFileStore::new(&path).load().unwrap();
    assert!(!reloaded.needs_upgrade());
    assert_eq!(reloaded.into_state(), manager.snapshot());
}

#[test]
fn concurrent_submissions_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let manager = Arc::new(LifecycleManager::open(JsonFileStore::new(&path)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for item in 0..10 {
                    manager.submit(format!("w{worker} + {item}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.list_active().len(), 40);
    let on_disk = JsonFileStore::new(&path).load().unwrap().into_state();
    assert_eq!(on_disk, manager.snapshot());
}

#[test]
fn config_opens_manager_on_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "data_file = \"entries.json\"\nmax_content_chars = 8\n",
    )
    .unwrap();

    let config = CoreConfig::load(&config_path).unwrap();
    let manager = config.open_manager().unwrap();
    manager.submit("a+b").unwrap();
    assert!(manager.submit("123456789").is_err());

    let state: StoreState = JsonFileStore::new(dir.path().join("entries.json"))
        .load()
        .unwrap()
        .into_state();
    assert_eq!(state.active().len(), 1);
}
