use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::mime::mime_for_extension;
use crate::Result;

/// Scan a folder (recursive) for files that look like attachable media,
/// judged by extension. Unreadable entries are skipped rather than failing
/// the whole walk.
pub fn scan_folder_for_media(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(dir).into_iter().filter_map(|res| res.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if mime_for_extension(&path).is_some() {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_media_files_recursively_and_sorted() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("1920s");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.path().join("b_will.pdf"), b"pdf").unwrap();
        fs::write(sub.join("a_portrait.jpg"), b"jpg").unwrap();
        fs::write(dir.path().join("notes.xyz"), b"???").unwrap();

        let found = scan_folder_for_media(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![sub.join("a_portrait.jpg"), dir.path().join("b_will.pdf")]
        );
    }

    #[test]
    fn empty_folder_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(scan_folder_for_media(dir.path()).unwrap().is_empty());
    }
}
