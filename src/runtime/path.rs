//! Lexical path helpers used when unpacking payloads into an install root.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
///
/// `/game/Modding/../../etc/passwd` is NOT under `/game/Modding`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Join an archive entry name onto a destination directory.
///
/// Returns `None` for absolute entries or entries that would land outside `dest`.
pub fn join_entry(dest: &Path, entry: &Path) -> Option<PathBuf> {
    if entry.has_root() || entry.components().any(|c| matches!(c, Component::Prefix(_))) {
        return None;
    }
    let joined = normalize_path(&dest.join(entry));
    if joined == normalize_path(dest) || !is_path_under(&joined, dest) {
        return None;
    }
    Some(joined)
}
