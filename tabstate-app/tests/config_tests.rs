use pretty_assertions::assert_eq;
use std::io::Write;
use tabstate_app::{AppConfig, AppError, AppStore};

#[test]
fn defaults() {
    let config = AppConfig::default();
    assert_eq!(config.persisted_paths, vec!["settings"]);
    assert_eq!(config.hydrated_paths, vec!["user"]);
    assert!(config.follow_remote);
    assert_eq!(config.storage.namespace, "app_");
    assert_eq!(config.store.max_history, 50);
}

#[test]
fn partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"storage": {{"namespace": "shop_"}}, "store": {{"max_history": 10}}}}"#
    )
    .unwrap();

    let config = AppConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.storage.namespace, "shop_");
    assert!(config.storage.notify_self);
    assert_eq!(config.store.max_history, 10);
    assert_eq!(config.persisted_paths, vec!["settings"]);
}

#[test]
fn malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    let err = AppConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn followed_paths_are_deduplicated() {
    let config = AppConfig {
        persisted_paths: vec!["settings".into(), "user".into()],
        hydrated_paths: vec!["user".into(), "orders".into()],
        ..AppConfig::default()
    };
    assert_eq!(config.followed_paths(), vec!["settings", "user", "orders"]);
}

// ── File-backed state ────────────────────────────────────────────

#[test]
fn open_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let app = AppStore::open(&path, AppConfig::default()).unwrap();
    app.store().set("settings.currency", "JPY");
    drop(app);

    let reopened = AppStore::open(&path, AppConfig::default()).unwrap();
    assert_eq!(
        reopened.store().get_as::<String>("settings.currency"),
        Some("JPY".to_string())
    );
}
