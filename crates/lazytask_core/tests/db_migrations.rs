use lazytask_core::db::migrations::latest_version;
use lazytask_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;
use std::error::Error;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "nodes");
    assert_table_exists(&conn, "edges");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazytask.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "edges");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn newer_schema_error_names_both_versions() {
    let err = DbError::UnsupportedSchemaVersion {
        db_version: 999,
        latest_supported: latest_version(),
    };
    let message = err.to_string();
    assert!(message.contains("999"));
    assert!(message.contains(&latest_version().to_string()));
    assert!(err.source().is_none());
}

#[test]
fn unreachable_path_reports_open_failure_with_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("tasks.db");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Open { mode: "file", .. }));
    assert!(err.source().is_some());
    assert!(err.to_string().starts_with("cannot open file task database"));
}

#[test]
fn schema_allows_only_one_root_row() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO nodes (node_uuid, title, created_at, is_root) VALUES ('a', 'Root', 0, 1);",
        [],
    )
    .unwrap();

    let second = conn.execute(
        "INSERT INTO nodes (node_uuid, title, created_at, is_root) VALUES ('b', 'Root', 0, 1);",
        [],
    );
    assert!(second.is_err());
}

#[test]
fn deleting_node_row_cascades_to_edges() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO nodes (node_uuid, title, created_at, is_root) VALUES ('p', 'Root', 0, 1);
         INSERT INTO nodes (node_uuid, title, created_at) VALUES ('c', 'Child', 0);
         INSERT INTO edges (parent_uuid, child_uuid, priority, seq) VALUES ('p', 'c', 0.0, 0);
         DELETE FROM nodes WHERE node_uuid = 'c';",
    )
    .unwrap();

    let edges: i64 = conn
        .query_row("SELECT COUNT(*) FROM edges;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(edges, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
