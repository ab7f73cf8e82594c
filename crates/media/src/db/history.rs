use anyhow::Context;
use chrono::{DateTime, Utc};
use core_types::MediaHandle;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::{decode_ts, encode_ts, query_all, query_optional, DbHandle, DbResult};

/// One entry in the user-visible change history: the label of a committed
/// transaction ("Add Media Object", ...) and the handle it touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub id: i64,
    pub label: String,
    pub object_handle: Option<MediaHandle>,
    pub created_at: DateTime<Utc>,
}

impl ChangeEntry {
    pub fn new(label: impl Into<String>, object_handle: Option<MediaHandle>) -> Self {
        Self {
            id: 0,
            label: label.into(),
            object_handle,
            created_at: Utc::now(),
        }
    }

    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<i64> {
        db.execute(
            "INSERT INTO change_log (label, object_handle, created_at) VALUES (?1, ?2, ?3)",
            params![
                self.label,
                self.object_handle.as_ref().map(|h| h.as_str()),
                encode_ts(self.created_at)
            ],
        )
        .with_context(|| format!("failed to insert change log entry label={}", self.label))?;
        Ok(db.last_insert_rowid())
    }

    /// Newest first, the order a history panel shows them.
    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            "SELECT id, label, object_handle, created_at
             FROM change_log
             ORDER BY id DESC",
            [],
            ChangeEntry::from_row,
        )
    }

    pub fn latest<H: DbHandle>(db: &H) -> DbResult<Option<Self>> {
        query_optional(
            db,
            "SELECT id, label, object_handle, created_at
             FROM change_log
             ORDER BY id DESC
             LIMIT 1",
            [],
            ChangeEntry::from_row,
        )
    }

    fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            object_handle: row.get::<_, Option<String>>(2)?.map(MediaHandle::new),
            created_at: decode_ts(row.get::<_, String>(3)?, "created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MediaDb;

    #[test]
    fn entries_come_back_newest_first() {
        let db = MediaDb::in_memory().unwrap();

        ChangeEntry::new("Add Media Object", Some(MediaHandle::new("h1")))
            .insert(&db)
            .unwrap();
        ChangeEntry::new("Remove Media Object", Some(MediaHandle::new("h1")))
            .insert(&db)
            .unwrap();

        let entries = ChangeEntry::load_all(&db).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "Remove Media Object");

        let latest = ChangeEntry::latest(&db).unwrap().unwrap();
        assert_eq!(latest.label, "Remove Media Object");
        assert_eq!(latest.object_handle, Some(MediaHandle::new("h1")));
    }
}
