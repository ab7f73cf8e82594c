use std::fs;
use std::path::{Path, PathBuf};

use app_settings::AppSettings;
use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::db::{DbHandle, DbResult};
use crate::schema::initialize_schema;
use crate::FamilyTreePath;

/// Owns the connection to one family-tree database.
#[derive(Debug)]
pub struct MediaDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl MediaDb {
    /// Open (or create) the database at `path`, normalizing the family-tree
    /// extension and creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = FamilyTreePath::new(path).into_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn transaction(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction()
    }

    pub fn schema_version(&self) -> DbResult<i64> {
        crate::db::migrations::current_schema_version_for_conn(&self.conn)
    }

    pub fn touch_last_opened(&self) -> DbResult<()> {
        self.conn.execute(
            "UPDATE tree_metadata
             SET last_opened = strftime('%Y-%m-%dT%H:%M:%fZ','now')
             WHERE id = 1",
            [],
        )?;
        Ok(())
    }

    pub fn last_opened(&self) -> DbResult<Option<chrono::DateTime<chrono::Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT last_opened FROM tree_metadata WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();
        crate::db::decode_ts_opt(raw, "last_opened")
    }

    /// The tree the user had open last, per the application settings.
    pub fn last_used() -> Option<PathBuf> {
        AppSettings::load().ok().and_then(|s| s.last_tree)
    }

    pub fn set_last_used(path: impl AsRef<Path>) -> crate::Result<()> {
        let mut settings = AppSettings::load().unwrap_or_default();
        let normalized = FamilyTreePath::new(path).into_path();
        settings.set_last_tree(normalized);
        settings.save()?;
        Ok(())
    }
}

impl DbHandle for MediaDb {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize> {
        self.conn.execute(sql, params)
    }

    fn prepare<'a>(&'a self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'a>> {
        self.conn.prepare(sql)
    }

    fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}
