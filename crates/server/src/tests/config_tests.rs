use super::{load_settings_from, normalize_database_url, prepare_database_url, Settings};

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, env_from(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.year_bounds().min, 1895);
    assert_eq!(settings.year_bounds().max, 2030);
}

#[test]
fn file_values_override_defaults() {
    let settings = load_settings_from(
        Some(
            r#"
            bind_addr = "0.0.0.0:8080"
            database_url = "sqlite://./catalog.db"
            max_release_year = 2026
            "#,
        ),
        env_from(&[]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.database_url, "sqlite://./catalog.db");
    assert_eq!(settings.year_bounds().max, 2026);
}

#[test]
fn environment_overrides_file_and_prefixed_names_win() {
    let settings = load_settings_from(
        Some("bind_addr = \"0.0.0.0:8080\"\nmax_release_year = 2026"),
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:9000"),
            ("APP__BIND_ADDR", "127.0.0.1:9001"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("APP__MAX_RELEASE_YEAR", "2035"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:9001");
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.max_release_year, 2035);
}

#[test]
fn malformed_inputs_fall_back_to_defaults() {
    let settings = load_settings_from(
        Some("this is = = not toml"),
        env_from(&[("APP__MAX_RELEASE_YEAR", "next year")]),
    );
    assert_eq!(settings, Settings::default());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("   "), Settings::default().database_url);
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn keeps_windows_absolute_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn normalizes_windows_plain_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn converts_sqlite_double_slash_windows_path() {
    assert_eq!(
        normalize_database_url("sqlite://C:/Users/alice/test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("movies.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(temp_root.path().join("nested").exists());

    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    storage.close().await;

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
