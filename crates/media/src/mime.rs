use std::ffi::OsStr;
use std::path::Path;

/// Content-type classification for files referenced by media records.
///
/// Implementations always produce a type string; a file that cannot be
/// classified is reported as `application/octet-stream`, never as "no type",
/// so a file-backed record is always distinguishable from a placeholder.
pub trait MimeDetector {
    fn detect(&self, path: &Path) -> String;
}

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Extension fallback for when content sniffing is inconclusive, covering
/// the file kinds commonly attached to genealogy records.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/x-wav"),
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
];

/// Default detector: sniff the file's leading bytes, then fall back to the
/// extension table, then to `application/octet-stream`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferDetector;

impl MimeDetector for InferDetector {
    fn detect(&self, path: &Path) -> String {
        if let Ok(Some(kind)) = infer::get_from_path(path) {
            return kind.mime_type().to_string();
        }
        mime_for_extension(path).unwrap_or(FALLBACK_MIME_TYPE).to_string()
    }
}

pub fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(OsStr::to_str)?;
    EXTENSION_TYPES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Generic themed-icon name for a MIME type. The resolver never calls this;
/// it exists for presentation layers that show a glyph when no thumbnail is
/// available.
pub fn icon_name(mime_type: &str) -> &'static str {
    if mime_type.starts_with("image/") {
        "image-x-generic"
    } else if mime_type.starts_with("video/") {
        "video-x-generic"
    } else if mime_type.starts_with("audio/") {
        "audio-x-generic"
    } else if mime_type.starts_with("text/") {
        "text-x-generic"
    } else if mime_type == "application/pdf" {
        "application-pdf"
    } else {
        "application-x-generic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sniffs_png_content_regardless_of_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portrait.dat");
        // PNG signature followed by arbitrary bytes.
        fs::write(&path, b"\x89PNG\r\n\x1a\n0000").unwrap();

        assert_eq!(InferDetector.detect(&path), "image/png");
    }

    #[test]
    fn falls_back_to_extension_for_unrecognized_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tiff");
        fs::write(&path, b"not actually tiff bytes").unwrap();

        assert_eq!(InferDetector.detect(&path), "image/tiff");
    }

    #[test]
    fn unknown_files_become_octet_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.xyz");
        fs::write(&path, b"???").unwrap();

        assert_eq!(InferDetector.detect(&path), "application/octet-stream");
    }

    #[test]
    fn icon_names_follow_mime_class() {
        assert_eq!(icon_name("image/jpeg"), "image-x-generic");
        assert_eq!(icon_name("application/pdf"), "application-pdf");
        assert_eq!(icon_name("application/octet-stream"), "application-x-generic");
    }
}
