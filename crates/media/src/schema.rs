//! SQLite schema DDL and initialization for family-tree databases.

use anyhow::bail;
use rusqlite::Connection;

use crate::db::migrations::{run_migrations_for_conn, LATEST_SCHEMA_VERSION, MIGRATIONS};
use crate::db::DbResult;

/// Version 1 schema. Later versions are reached through
/// [`crate::db::migrations::MIGRATIONS`].
///
/// The CHECK on `media_objects` enforces the record invariant at the storage
/// layer too: a row is a placeholder (path and mime_type both NULL) or
/// file-backed (both set), nothing in between.
pub const BASE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS media_objects(
    id INTEGER PRIMARY KEY,
    handle TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    mime_type TEXT,
    path TEXT,
    flags INTEGER,
    attributes_json TEXT CHECK (attributes_json IS NULL OR json_valid(attributes_json)),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    CHECK ((path IS NULL) = (mime_type IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_media_objects_path ON media_objects(path);

CREATE TABLE IF NOT EXISTS change_log(
    id INTEGER PRIMARY KEY,
    label TEXT NOT NULL,
    object_handle TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
);

CREATE TABLE IF NOT EXISTS tree_metadata(
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    last_opened TEXT
);

CREATE TRIGGER IF NOT EXISTS media_objects_touch_updated_at
AFTER UPDATE ON media_objects
FOR EACH ROW
BEGIN
    UPDATE media_objects
    SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
    WHERE id = NEW.id;
END;
"#;

/// Applies the schema (or upgrades an existing database) on the connection.
///
/// Enforces WAL journaling + foreign keys, lays down the base schema on a
/// fresh database, runs pending migrations, and keeps `PRAGMA user_version`
/// aligned with the `tree_metadata` bookkeeping row. Databases written by a
/// newer build are rejected rather than modified.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;

    let user_version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if user_version > LATEST_SCHEMA_VERSION {
        bail!("tree schema version {user_version} is newer than supported {LATEST_SCHEMA_VERSION}");
    }

    if user_version == 0 {
        conn.execute_batch(BASE_SCHEMA_SQL)?;
        conn.execute(
            "INSERT INTO tree_metadata (id, schema_version) VALUES (1, 1)
             ON CONFLICT(id) DO NOTHING",
            [],
        )?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    run_migrations_for_conn(conn, MIGRATIONS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::current_schema_version_for_conn;

    #[test]
    fn fresh_database_lands_on_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let version = current_schema_version_for_conn(&conn).unwrap();
        assert_eq!(version, LATEST_SCHEMA_VERSION);

        let user_version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(user_version, LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn initialization_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
    }

    #[test]
    fn newer_database_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", LATEST_SCHEMA_VERSION + 1)
            .unwrap();

        assert!(initialize_schema(&conn).is_err());
    }

    #[test]
    fn placeholder_check_rejects_mismatched_presence() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO media_objects (handle, description, mime_type, path)
             VALUES ('h1', 'broken', 'image/jpeg', NULL)",
            [],
        );
        assert!(result.is_err());
    }
}
