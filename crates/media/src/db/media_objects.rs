use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use core_types::{MediaFlags, MediaHandle};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{
    decode_ts, encode_ts, from_json, query_all, query_one, query_optional, to_json, DbHandle,
    DbResult,
};
use crate::record::MediaRecord;

/// One persisted media object.
///
/// `checksum` is a blake3 digest of the file content for file-backed rows,
/// used for duplicate detection. `attributes_json` carries free-form
/// key/value attributes attached by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaObject {
    pub id: i64,
    pub handle: MediaHandle,
    pub description: String,
    pub mime_type: Option<String>,
    pub path: Option<String>,
    pub checksum: Option<String>,
    pub flags: Option<MediaFlags>,
    pub attributes_json: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, handle, description, mime_type, path, checksum, flags, \
                       attributes_json, created_at, updated_at";

impl MediaObject {
    /// Build an unsaved row (id 0) from a freshly resolved record.
    pub fn from_record(record: &MediaRecord, checksum: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            handle: record.handle.clone(),
            description: record.description.clone(),
            mime_type: record.mime_type.clone(),
            path: record
                .path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            checksum,
            flags: None,
            attributes_json: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_record(&self) -> MediaRecord {
        MediaRecord {
            handle: self.handle.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            path: self.path.as_ref().map(PathBuf::from),
        }
    }

    pub fn insert<H: DbHandle>(&self, db: &H) -> DbResult<i64> {
        let attributes_json = self.attributes_json.as_ref().map(to_json).transpose()?;
        db.execute(
            "INSERT INTO media_objects (
                handle, description, mime_type, path, checksum, flags,
                attributes_json, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.handle.as_str(),
                self.description,
                self.mime_type,
                self.path,
                self.checksum,
                self.flags.map(|f| f.bits() as i64),
                attributes_json,
                encode_ts(self.created_at),
                encode_ts(self.updated_at)
            ],
        )
        .with_context(|| format!("failed to insert media object handle={}", self.handle))?;
        Ok(db.last_insert_rowid())
    }

    pub fn load<H: DbHandle>(db: &H, id: i64) -> DbResult<Self> {
        query_one(
            db,
            &format!("SELECT {COLUMNS} FROM media_objects WHERE id = ?1"),
            params![id],
            MediaObject::from_row,
        )
        .with_context(|| format!("failed to load media object id={id}"))
    }

    pub fn load_all<H: DbHandle>(db: &H) -> DbResult<Vec<Self>> {
        query_all(
            db,
            &format!("SELECT {COLUMNS} FROM media_objects ORDER BY id"),
            [],
            MediaObject::from_row,
        )
    }

    pub fn update<H: DbHandle>(&self, db: &H) -> DbResult<()> {
        let attributes_json = self.attributes_json.as_ref().map(to_json).transpose()?;
        db.execute(
            "UPDATE media_objects SET
                description = ?1,
                mime_type = ?2,
                path = ?3,
                checksum = ?4,
                flags = ?5,
                attributes_json = ?6,
                updated_at = ?7
             WHERE handle = ?8",
            params![
                self.description,
                self.mime_type,
                self.path,
                self.checksum,
                self.flags.map(|f| f.bits() as i64),
                attributes_json,
                encode_ts(self.updated_at),
                self.handle.as_str()
            ],
        )
        .with_context(|| format!("failed to update media object handle={}", self.handle))?;
        Ok(())
    }

    pub fn delete<H: DbHandle>(db: &H, handle: &MediaHandle) -> DbResult<()> {
        db.execute(
            "DELETE FROM media_objects WHERE handle = ?1",
            params![handle.as_str()],
        )
        .with_context(|| format!("failed to delete media object handle={handle}"))?;
        Ok(())
    }

    pub fn find_by_handle<H: DbHandle>(db: &H, handle: &MediaHandle) -> DbResult<Option<Self>> {
        query_optional(
            db,
            &format!("SELECT {COLUMNS} FROM media_objects WHERE handle = ?1"),
            params![handle.as_str()],
            MediaObject::from_row,
        )
    }

    pub fn find_by_path<H: DbHandle>(db: &H, path: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            &format!("SELECT {COLUMNS} FROM media_objects WHERE path = ?1"),
            params![path],
            MediaObject::from_row,
        )
    }

    pub fn find_by_checksum<H: DbHandle>(db: &H, checksum: &str) -> DbResult<Option<Self>> {
        query_optional(
            db,
            &format!("SELECT {COLUMNS} FROM media_objects WHERE checksum = ?1"),
            params![checksum],
            MediaObject::from_row,
        )
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> DbResult<Self> {
        let flags: Option<i64> = row.get(6)?;
        Ok(Self {
            id: row.get(0)?,
            handle: MediaHandle::new(row.get::<_, String>(1)?),
            description: row.get(2)?,
            mime_type: row.get(3)?,
            path: row.get(4)?,
            checksum: row.get(5)?,
            flags: flags.map(|bits| MediaFlags::from_bits_truncate(bits as u8)),
            attributes_json: {
                let raw: Option<String> = row.get(7)?;
                match raw {
                    Some(json) => Some(from_json(&json)?),
                    None => None,
                }
            },
            created_at: decode_ts(row.get::<_, String>(8)?, "created_at")?,
            updated_at: decode_ts(row.get::<_, String>(9)?, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MediaDb;

    fn sample(handle: &str) -> MediaObject {
        MediaObject {
            id: 0,
            handle: MediaHandle::new(handle),
            description: "Grandma's portrait".into(),
            mime_type: Some("image/jpeg".into()),
            path: Some("photos/grandma.jpg".into()),
            checksum: Some("abcd".into()),
            flags: Some(MediaFlags::PRIVATE),
            attributes_json: Some(serde_json::json!({"photographer": "unknown"})),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_load_round_trip() {
        let db = MediaDb::in_memory().unwrap();

        let id = sample("h1").insert(&db).unwrap();
        let loaded = MediaObject::load(&db, id).unwrap();

        assert_eq!(loaded.handle, MediaHandle::new("h1"));
        assert_eq!(loaded.description, "Grandma's portrait");
        assert_eq!(loaded.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(loaded.flags, Some(MediaFlags::PRIVATE));
        assert_eq!(loaded.attributes_json.unwrap()["photographer"], "unknown");
    }

    #[test]
    fn placeholder_rows_round_trip() {
        let db = MediaDb::in_memory().unwrap();
        let record = MediaRecord::placeholder(MediaHandle::new("h2"), "");
        let id = MediaObject::from_record(&record, None).insert(&db).unwrap();

        let loaded = MediaObject::load(&db, id).unwrap();
        assert!(loaded.path.is_none());
        assert!(loaded.mime_type.is_none());
        assert_eq!(loaded.description, "");
        assert!(loaded.to_record().is_placeholder());
    }

    #[test]
    fn handles_are_unique_in_the_table() {
        let db = MediaDb::in_memory().unwrap();
        sample("h3").insert(&db).unwrap();
        assert!(sample("h3").insert(&db).is_err());
    }

    #[test]
    fn finders_match_handle_and_checksum() {
        let db = MediaDb::in_memory().unwrap();
        sample("h4").insert(&db).unwrap();

        assert!(MediaObject::find_by_handle(&db, &MediaHandle::new("h4"))
            .unwrap()
            .is_some());
        assert!(MediaObject::find_by_handle(&db, &MediaHandle::new("h5"))
            .unwrap()
            .is_none());
        assert!(MediaObject::find_by_checksum(&db, "abcd").unwrap().is_some());
        assert!(MediaObject::find_by_path(&db, "photos/grandma.jpg")
            .unwrap()
            .is_some());
    }

    #[test]
    fn insert_with_transaction_handle() {
        let mut db = MediaDb::in_memory().unwrap();
        let tx = db.transaction().unwrap();
        let id = sample("h6").insert(&tx).unwrap();
        tx.commit().unwrap();

        let loaded = MediaObject::load(&db, id).unwrap();
        assert_eq!(loaded.handle, MediaHandle::new("h6"));
    }
}
