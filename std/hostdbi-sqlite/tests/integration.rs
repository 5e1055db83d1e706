///
/// # Integration Tests for hostdbi-sqlite
///
/// End-to-end workflows against file-backed databases: configuration loaded
/// from disk, data surviving reconnects, typed fetches with missing values,
/// blob columns, and handle bookkeeping across several connections.
///

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use hostdbi_core::na::{is_na_real, NA_INTEGER, NA_STRING};
use hostdbi_core::{load_config, Column, DbiError, ElementType, FRAME_CLASS};
use hostdbi_sqlite::{field_types, Driver, Param};

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("hostdbi.toml");
    fs::write(&path, body).expect("Failed to write config");
    path
}

fn db_path(dir: &TempDir) -> String {
    dir.path().join("test.db").display().to_string()
}

#[test]
fn test_config_file_drives_limits_and_fetch() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = write_config(
        temp_dir.path(),
        r#"driver_name = "sqlite"

[limits]
max_connections = 1
max_result_sets = 1

[fetch]
default_batch = 1
trim_trailing_blanks = true
"#,
    );
    let config = load_config(&config_path).expect("Failed to load config");
    let mut driver = Driver::new(config);
    assert_eq!(driver.config().driver_name, "sqlite");

    let conn = driver.connect(&db_path(&temp_dir)).unwrap();
    assert!(matches!(driver.connect_in_memory(), Err(DbiError::Full { capacity: 1, .. })));

    driver
        .exec(conn, "CREATE TABLE c (code TEXT); INSERT INTO c VALUES ('ab   '), ('   '), ('x');")
        .unwrap();
    let res = driver.send_query(conn, "SELECT code FROM c ORDER BY rowid").unwrap();
    assert!(matches!(driver.send_query(conn, "SELECT 1"), Err(DbiError::Full { .. })));

    let table = driver.fetch(res, -1).unwrap();
    assert_eq!(table.column("code").unwrap().as_string().unwrap(), &["ab", "", "x"]);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    match load_config(&temp_dir.path().join("absent.toml")) {
        Err(DbiError::Io(_)) => {}
        other => panic!("Expected Io error, got {:?}", other),
    }
}

#[test]
fn test_data_survives_reconnect() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = db_path(&temp_dir);
    let mut driver = Driver::default();

    let conn = driver.connect(&path).unwrap();
    driver.exec(conn, "CREATE TABLE kv (k TEXT, v INTEGER)").unwrap();
    let stmt = driver.prepare(conn, "INSERT INTO kv VALUES (?1, ?2)").unwrap();
    for (k, v) in [("one", 1), ("two", 2), ("three", 3)] {
        driver
            .bind(stmt, vec![Param::Text(k.to_string()), Param::Int(v)])
            .unwrap();
        let res = driver.execute(stmt).unwrap();
        assert_eq!(driver.result_info(res).unwrap().rows_affected, 1);
        driver.clear_result(res).unwrap();
    }
    driver.disconnect(conn).unwrap();
    assert!(driver.list_connections().is_empty());

    let conn = driver.connect(&path).unwrap();
    let table = driver.get_query(conn, "SELECT k, v FROM kv ORDER BY v").unwrap();
    assert_eq!(table.names(), &["k", "v"]);
    assert_eq!(table.column("k").unwrap().as_string().unwrap(), &["one", "two", "three"]);
    assert_eq!(table.column("v").unwrap().as_int().unwrap(), &[1, 2, 3]);
    assert_eq!(table.class(), Some(FRAME_CLASS));
}

#[test]
fn test_typed_fetch_with_missing_values() {
    let mut driver = Driver::default();
    let conn = driver.connect_in_memory().unwrap();
    driver
        .exec(
            conn,
            "CREATE TABLE m (i INTEGER, big INTEGER, r REAL, s TEXT, nothing TEXT, b BLOB);
             INSERT INTO m VALUES (1, 5000000000, 0.25, 'x', NULL, x'0102');
             INSERT INTO m VALUES (NULL, NULL, NULL, NULL, NULL, NULL);",
        )
        .unwrap();

    let res = driver.send_query(conn, "SELECT * FROM m ORDER BY rowid").unwrap();
    let info = driver.result_info(res).unwrap();
    assert_eq!(
        field_types(&info.fields),
        vec![
            ElementType::Int,
            ElementType::Float,
            ElementType::Float,
            ElementType::String,
            ElementType::String,
            ElementType::Nested,
        ]
    );

    let table = driver.fetch(res, -1).unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column("i").unwrap().as_int().unwrap(), &[1, NA_INTEGER]);

    let big = table.column("big").unwrap().as_float().unwrap();
    assert_eq!(big[0], 5_000_000_000.0);
    assert!(is_na_real(big[1]));

    let r = table.column("r").unwrap().as_float().unwrap();
    assert_eq!(r[0], 0.25);
    assert!(is_na_real(r[1]));

    assert_eq!(table.column("s").unwrap().as_string().unwrap(), &["x", NA_STRING]);
    assert_eq!(table.column("nothing").unwrap().as_string().unwrap(), &[NA_STRING, NA_STRING]);

    let blobs = table.column("b").unwrap().as_nested().unwrap();
    assert_eq!(blobs[0], Some(Column::Int(vec![1, 2])));
    assert_eq!(blobs[1], None);
}

#[test]
fn test_duplicate_column_names_are_kept() {
    let mut driver = Driver::default();
    let conn = driver.connect_in_memory().unwrap();
    let table = driver.get_query(conn, "SELECT 1 AS a, 'z' AS a").unwrap();
    assert_eq!(table.names(), &["a", "a"]);
    assert_eq!(table.column("a").unwrap().as_int().unwrap(), &[1]);
    assert_eq!(table.column_at(1).unwrap().as_string().unwrap(), &["z"]);
}

#[test]
fn test_handles_across_connections() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = db_path(&temp_dir);
    let mut driver = Driver::default();

    let a = driver.connect(&path).unwrap();
    let b = driver.connect(&path).unwrap();
    let c = driver.connect_in_memory().unwrap();
    driver.exec(a, "CREATE TABLE shared (n INTEGER); INSERT INTO shared VALUES (7);").unwrap();

    let from_b = driver.get_query(b, "SELECT n FROM shared").unwrap();
    assert_eq!(from_b.column("n").unwrap().as_int().unwrap(), &[7]);

    let ra = driver.send_query(a, "SELECT n FROM shared").unwrap();
    let rc = driver.send_query(c, "SELECT 1").unwrap();
    driver.disconnect(b).unwrap();

    assert_eq!(driver.list_connections(), vec![a, c]);
    assert_eq!(driver.list_results(a).unwrap(), vec![ra]);
    assert_eq!(driver.list_results(c).unwrap(), vec![rc]);
    assert!(driver.list_results(b).is_err());

    let reused = driver.connect_in_memory().unwrap();
    assert_eq!(reused, b);
    assert!(driver.list_results(reused).unwrap().is_empty());

    assert_eq!(driver.close_all(), 3);
    assert!(matches!(driver.fetch(ra, 1), Err(DbiError::NotFound { .. })));
}

#[test]
fn test_escaped_literals_round_trip() {
    let mut driver = Driver::default();
    let conn = driver.connect_in_memory().unwrap();
    let escaped = Driver::escape_strings(&["O'Brien"]);
    let sql = format!("SELECT '{}' AS name", escaped[0]);
    let table = driver.get_query(conn, &sql).unwrap();
    assert_eq!(table.column("name").unwrap().as_string().unwrap(), &["O'Brien"]);
}
