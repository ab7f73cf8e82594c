use std::path::PathBuf;

use crate::handle::{HandleSource, UuidHandles};
use crate::mime::{InferDetector, MimeDetector};
use crate::paths;
use crate::record::MediaRecord;
use crate::{MediaError, Result};

/// What the user picked in the chooser.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Internal stand-in entry with no backing file.
    Placeholder,
    /// A file selected from the filesystem.
    File(PathBuf),
}

/// Raw input for one resolution, as supplied by the presentation layer.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub source: MediaSource,
    /// When set, the stored path is rewritten relative to this directory
    /// (or its parent if it is not a directory).
    pub relative_to: Option<PathBuf>,
    /// Free-text label; empty means "derive from the file name".
    pub description: String,
}

impl ResolveRequest {
    pub fn placeholder(description: impl Into<String>) -> Self {
        Self {
            source: MediaSource::Placeholder,
            relative_to: None,
            description: description.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            source: MediaSource::File(path.into()),
            relative_to: None,
            description: description.into(),
        }
    }

    pub fn relative_to(mut self, base: impl Into<PathBuf>) -> Self {
        self.relative_to = Some(base.into());
        self
    }
}

/// Turns one user confirmation into a validated media record.
///
/// Stateless and synchronous: the only I/O is the existence check (plus
/// whatever the MIME detector reads). A failed resolution performs no
/// further work; no handle is allocated and no partial record exists.
pub struct MediaResolver<D = InferDetector, H = UuidHandles> {
    detector: D,
    handles: H,
}

impl MediaResolver {
    pub fn new() -> Self {
        Self {
            detector: InferDetector,
            handles: UuidHandles,
        }
    }
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: MimeDetector, H: HandleSource> MediaResolver<D, H> {
    pub fn with_collaborators(detector: D, handles: H) -> Self {
        Self { detector, handles }
    }

    pub fn resolve(&self, request: ResolveRequest) -> Result<MediaRecord> {
        let ResolveRequest {
            source,
            relative_to,
            description,
        } = request;

        let selected = match source {
            MediaSource::Placeholder => {
                return Ok(MediaRecord::placeholder(self.handles.next_handle(), description));
            }
            MediaSource::File(path) => path,
        };

        // Rewrite first so the error (and the stored path) show what the
        // user asked for; a relative result is checked against the base it
        // was made relative to, not the working directory.
        let (stored, absolute) = match relative_to.as_deref() {
            Some(base) => {
                let rewritten = paths::relative_to(&selected, base);
                let absolute = paths::resolve_against(&rewritten, base);
                (rewritten, absolute)
            }
            None => (selected.clone(), selected),
        };

        if !absolute.exists() {
            return Err(MediaError::FileNotFound { path: stored });
        }

        let mime_type = self.detector.detect(&absolute);
        let description = if description.is_empty() {
            stored
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            description
        };

        Ok(MediaRecord::file_backed(
            self.handles.next_handle(),
            description,
            mime_type,
            stored,
        ))
    }
}
