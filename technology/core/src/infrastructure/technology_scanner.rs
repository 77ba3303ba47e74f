// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Technology file discovery.
//!
//! Walks a directory tree and collects `*.lyt` files in path order so that
//! registration order does not depend on the filesystem.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::domain::technology::TechnologyError;

pub const TECHNOLOGY_FILE_EXTENSION: &str = "lyt";

/// All technology files below `dir`, sorted by path.
///
/// Unreadable entries below the root are skipped with a warning; a missing or
/// unreadable root is an error.
pub fn scan_technology_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, TechnologyError> {
    let dir = dir.as_ref();
    let metadata = std::fs::metadata(dir).map_err(|e| TechnologyError::path(dir, e))?;
    if !metadata.is_dir() {
        return Err(TechnologyError::path(
            dir,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry while scanning for technologies");
                continue;
            }
        };
        if entry.file_type().is_file() && is_technology_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_technology_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TECHNOLOGY_FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_nested_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("b/nested/z.lyt"), "").unwrap();
        fs::write(dir.path().join("a.lyt"), "").unwrap();
        fs::write(dir.path().join("b/readme.txt"), "").unwrap();
        fs::write(dir.path().join("C.LYT"), "").unwrap();

        let files = scan_technology_files(dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("C.LYT"),
                PathBuf::from("a.lyt"),
                PathBuf::from("b/nested/z.lyt"),
            ]
        );
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_technology_files(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, TechnologyError::Path { .. }));
    }
}
