use std::path::{Component, Path, PathBuf};

/// Rewrite `target` relative to `base`.
///
/// When `base` does not denote a directory (a database file path, say) its
/// parent is used as the anchor. When the two paths share no prefix at all
/// (different drive roots on Windows), the target is returned unchanged.
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let anchor = directory_anchor(base);
    let target_parts: Vec<Component<'_>> = target.components().collect();
    let anchor_parts: Vec<Component<'_>> = anchor.components().collect();

    let mut shared = 0;
    while shared < target_parts.len()
        && shared < anchor_parts.len()
        && target_parts[shared] == anchor_parts[shared]
    {
        shared += 1;
    }

    if shared == 0 {
        return target.to_path_buf();
    }

    let mut rewritten = PathBuf::new();
    for _ in &anchor_parts[shared..] {
        rewritten.push("..");
    }
    for part in &target_parts[shared..] {
        rewritten.push(part.as_os_str());
    }
    if rewritten.as_os_str().is_empty() {
        rewritten.push(".");
    }
    rewritten
}

/// Re-anchor a stored path: relative paths are joined onto `base` (or its
/// parent when `base` is not a directory), absolute paths pass through.
pub fn resolve_against(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    directory_anchor(base).join(path)
}

fn directory_anchor(base: &Path) -> &Path {
    if base.is_dir() {
        base
    } else {
        base.parent().unwrap_or(base)
    }
}
