use core_types::MediaHandle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A media object ready for persistence.
///
/// A record is either a placeholder (no backing file: `path` and `mime_type`
/// both absent) or file-backed (both present). The constructors below are the
/// only way to build one, so no other combination can exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub handle: MediaHandle,
    pub description: String,
    pub mime_type: Option<String>,
    pub path: Option<PathBuf>,
}

impl MediaRecord {
    /// Internal stand-in entry with no backing file. The description is kept
    /// verbatim, empty included; there is no file to name it after.
    pub fn placeholder(handle: MediaHandle, description: impl Into<String>) -> Self {
        Self {
            handle,
            description: description.into(),
            mime_type: None,
            path: None,
        }
    }

    pub fn file_backed(
        handle: MediaHandle,
        description: impl Into<String>,
        mime_type: impl Into<String>,
        path: PathBuf,
    ) -> Self {
        Self {
            handle,
            description: description.into(),
            mime_type: Some(mime_type.into()),
            path: Some(path),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_has_no_path_and_no_mime_type() {
        let record = MediaRecord::placeholder(MediaHandle::new("h1"), "");
        assert!(record.is_placeholder());
        assert!(record.path.is_none());
        assert!(record.mime_type.is_none());
        assert_eq!(record.description, "");
    }

    #[test]
    fn file_backed_has_both_path_and_mime_type() {
        let record = MediaRecord::file_backed(
            MediaHandle::new("h2"),
            "Grandma's portrait",
            "image/jpeg",
            PathBuf::from("grandma.jpg"),
        );
        assert!(!record.is_placeholder());
        assert_eq!(record.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(record.path.as_deref(), Some(std::path::Path::new("grandma.jpg")));
    }
}
