//! Row bindings for the family-tree SQLite schema.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod db;
pub mod history;
pub mod media_objects;
pub mod migrations;

pub use db::MediaDb;
pub use history::ChangeEntry;
pub use media_objects::MediaObject;
pub use migrations::{Migration, LATEST_SCHEMA_VERSION, MIGRATIONS};

pub type DbResult<T> = anyhow::Result<T>;

/// Common trait allowing row modules to operate over either a `Connection`
/// or a `Transaction`.
pub trait DbHandle {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize>;
    fn prepare<'a>(&'a self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'a>>;
    fn last_insert_rowid(&self) -> i64;
}

impl DbHandle for Connection {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize> {
        Connection::execute(self, sql, params)
    }

    fn prepare<'a>(&'a self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'a>> {
        Connection::prepare(self, sql)
    }

    fn last_insert_rowid(&self) -> i64 {
        Connection::last_insert_rowid(self)
    }
}

impl<'conn> DbHandle for Transaction<'conn> {
    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<usize> {
        (**self).execute(sql, params)
    }

    fn prepare<'stmt>(&'stmt self, sql: &str) -> rusqlite::Result<rusqlite::Statement<'stmt>> {
        (**self).prepare(sql)
    }

    fn last_insert_rowid(&self) -> i64 {
        (**self).last_insert_rowid()
    }
}

/// Map a single row to a typed value, failing when no row is returned.
pub fn query_one<T, H, P, F>(db: &H, sql: &str, params: P, map: F) -> DbResult<T>
where
    H: DbHandle + ?Sized,
    P: rusqlite::Params,
    F: FnOnce(&Row) -> DbResult<T>,
{
    let mut stmt = db.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let row = rows.next()?.context("query returned no rows")?;
    map(row)
}

/// Map at most one row to a typed value.
pub fn query_optional<T, H, P, F>(db: &H, sql: &str, params: P, mut map: F) -> DbResult<Option<T>>
where
    H: DbHandle + ?Sized,
    P: rusqlite::Params,
    F: FnMut(&Row) -> DbResult<T>,
{
    let mut stmt = db.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(map(row)?)),
        None => Ok(None),
    }
}

/// Collect every row of a query into a vector.
pub fn query_all<T, H, P, F>(db: &H, sql: &str, params: P, mut map: F) -> DbResult<Vec<T>>
where
    H: DbHandle + ?Sized,
    P: rusqlite::Params,
    F: FnMut(&Row) -> DbResult<T>,
{
    let mut stmt = db.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map(row)?);
    }
    Ok(out)
}

pub fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_ts(raw: String, column: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {column} timestamp: {raw}"))
}

pub fn decode_ts_opt(raw: Option<String>, column: &str) -> DbResult<Option<DateTime<Utc>>> {
    raw.map(|value| decode_ts(value, column)).transpose()
}

pub fn to_json<T: Serialize>(value: &T) -> DbResult<String> {
    serde_json::to_string(value).context("failed to serialize JSON column")
}

pub fn from_json<T: DeserializeOwned>(s: &str) -> DbResult<T> {
    serde_json::from_str(s).context("failed to deserialize JSON column")
}
