use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use blake3::Hasher;
use chrono::Utc;
use core_types::{MediaFlags, MediaHandle};

use crate::db::{ChangeEntry, MediaDb, MediaObject};
use crate::handle::{HandleSource, UuidHandles};
use crate::mime::{InferDetector, MimeDetector};
use crate::record::MediaRecord;
use crate::resolver::{MediaResolver, ResolveRequest};
use crate::{paths, scan, Result};

/// Transaction labels shown in the user-visible change history.
pub const ADD_MEDIA_LABEL: &str = "Add Media Object";
pub const EDIT_MEDIA_LABEL: &str = "Edit Media Object";
pub const REMOVE_MEDIA_LABEL: &str = "Remove Media Object";

/// High-level media operations over one family-tree database.
///
/// Each mutation pairs a resolution (where applicable) with exactly one
/// transaction: resolve first, then begin, write the object and its change
/// log entry, commit. A failed resolve never begins a transaction.
pub struct MediaService<D = InferDetector, H = UuidHandles> {
    db: MediaDb,
    resolver: MediaResolver<D, H>,
}

impl MediaService {
    pub fn new(db: MediaDb) -> Self {
        Self {
            db,
            resolver: MediaResolver::new(),
        }
    }
}

impl<D: MimeDetector, H: HandleSource> MediaService<D, H> {
    pub fn with_resolver(db: MediaDb, resolver: MediaResolver<D, H>) -> Self {
        Self { db, resolver }
    }

    pub fn db(&self) -> &MediaDb {
        &self.db
    }

    /// Resolve one user confirmation into a record and commit it.
    pub fn add_media(&mut self, request: ResolveRequest) -> Result<MediaRecord> {
        let base = request.relative_to.clone();
        let record = self.resolver.resolve(request)?;

        let checksum = match &record.path {
            Some(path) => {
                let absolute = match &base {
                    Some(base) => paths::resolve_against(path, base),
                    None => path.clone(),
                };
                Some(file_checksum(&absolute)?)
            }
            None => None,
        };

        let object = MediaObject::from_record(&record, checksum);
        let tx = self.db.transaction()?;
        object.insert(&tx)?;
        ChangeEntry::new(ADD_MEDIA_LABEL, Some(record.handle.clone())).insert(&tx)?;
        tx.commit()?;

        tracing::info!(
            handle = %record.handle,
            placeholder = record.is_placeholder(),
            "added media object"
        );
        Ok(record)
    }

    /// Scan a folder and add every media file not already present in the
    /// tree (matched by content checksum). One transaction per file.
    pub fn import_folder(
        &mut self,
        dir: &Path,
        relative_to: Option<&Path>,
    ) -> Result<Vec<MediaRecord>> {
        let candidates = scan::scan_folder_for_media(dir)?;
        let mut imported = Vec::new();

        for path in candidates {
            let checksum = file_checksum(&path)?;
            if MediaObject::find_by_checksum(&self.db, &checksum)?.is_some() {
                tracing::debug!(path = %path.display(), "skipping file already in the tree");
                continue;
            }

            let mut request = ResolveRequest::file(path, "");
            if let Some(base) = relative_to {
                request = request.relative_to(base);
            }
            imported.push(self.add_media(request)?);
        }

        tracing::info!(count = imported.len(), dir = %dir.display(), "imported media folder");
        Ok(imported)
    }

    pub fn list_media(&self) -> Result<Vec<MediaObject>> {
        Ok(MediaObject::load_all(&self.db)?)
    }

    pub fn load_media(&self, handle: &MediaHandle) -> Result<Option<MediaObject>> {
        Ok(MediaObject::find_by_handle(&self.db, handle)?)
    }

    pub fn change_history(&self) -> Result<Vec<ChangeEntry>> {
        Ok(ChangeEntry::load_all(&self.db)?)
    }

    pub fn update_description(
        &mut self,
        handle: &MediaHandle,
        description: impl Into<String>,
    ) -> Result<()> {
        let description = description.into();
        let tx = self.db.transaction()?;
        let mut object = MediaObject::find_by_handle(&tx, handle)?
            .with_context(|| format!("no media object with handle {handle}"))?;
        object.description = description;
        object.updated_at = Utc::now();
        object.update(&tx)?;
        ChangeEntry::new(EDIT_MEDIA_LABEL, Some(handle.clone())).insert(&tx)?;
        tx.commit()?;
        Ok(())
    }

    pub fn update_flags(&mut self, handle: &MediaHandle, flags: MediaFlags) -> Result<()> {
        let tx = self.db.transaction()?;
        let mut object = MediaObject::find_by_handle(&tx, handle)?
            .with_context(|| format!("no media object with handle {handle}"))?;
        object.flags = Some(flags);
        object.updated_at = Utc::now();
        object.update(&tx)?;
        ChangeEntry::new(EDIT_MEDIA_LABEL, Some(handle.clone())).insert(&tx)?;
        tx.commit()?;
        Ok(())
    }

    pub fn remove_media(&mut self, handle: &MediaHandle) -> Result<()> {
        let tx = self.db.transaction()?;
        MediaObject::delete(&tx, handle)?;
        ChangeEntry::new(REMOVE_MEDIA_LABEL, Some(handle.clone())).insert(&tx)?;
        tx.commit()?;
        tracing::info!(%handle, "removed media object");
        Ok(())
    }

    /// File-backed records whose file no longer exists. Relative paths are
    /// checked against `base`; without one they are checked as stored.
    pub fn find_missing_files(&self, base: Option<&Path>) -> Result<Vec<MediaObject>> {
        let mut missing = Vec::new();
        for object in MediaObject::load_all(&self.db)? {
            let Some(path) = object.path.as_deref() else {
                continue;
            };
            let path = Path::new(path);
            let absolute = match base {
                Some(base) => paths::resolve_against(path, base),
                None => path.to_path_buf(),
            };
            if !absolute.exists() {
                tracing::warn!(path = %path.display(), handle = %object.handle, "media file is missing");
                missing.push(object);
            }
        }
        Ok(missing)
    }
}

fn file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];

    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
