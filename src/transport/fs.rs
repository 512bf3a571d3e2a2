use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::source::decode::DataFormat;

/// List decodable data files (`.csv`, `.json`, `.geojson`) under `root`.
///
/// A file path is returned as-is. Directory entries are sorted by path so
/// repeated fetches see files in the same order. Unreadable entries are
/// skipped.
pub fn list_data_files(root: &Path, follow_links: bool) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(follow_links)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| DataFormat::from_path(path).is_some())
        .collect();
    files.sort();
    files
}

/// Best-effort file modified time.
pub fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
