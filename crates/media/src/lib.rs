pub mod db;
pub mod handle;
pub mod mime;
pub mod paths;
pub mod record;
pub mod resolver;
pub mod scan;
pub mod schema;
pub mod services;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use db::{ChangeEntry, MediaDb, MediaObject};
pub use handle::{HandleSource, UuidHandles};
pub use mime::{InferDetector, MimeDetector};
pub use record::MediaRecord;
pub use resolver::{MediaResolver, MediaSource, ResolveRequest};
pub use services::MediaService;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media file does not exist: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] app_settings::AppSettingsError),

    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;

/// Path to a family-tree database file, normalized to carry the expected
/// extension unless it already names a SQLite file.
#[derive(Debug, Clone)]
pub struct FamilyTreePath(PathBuf);

impl FamilyTreePath {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let mut normalized = path.as_ref().to_path_buf();
        if normalized
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| ext.eq_ignore_ascii_case("ancestratree") || ext.eq_ignore_ascii_case("sqlite"))
            .is_none()
        {
            normalized.set_extension("ancestratree");
        }
        Self(normalized)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}
