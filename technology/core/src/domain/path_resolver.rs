// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Base Path Resolver Domain Service
//!
//! Files referenced by a technology (for example the layer properties file)
//! are stored relative to the technology's base path whenever they live below
//! it. This service implements both directions of that mapping:
//!
//! - [`PathResolver::correct_path`] turns an absolute path into one relative to
//!   the base path, but only for paths *below* the base. Paths above or beside
//!   the base are returned unchanged, so no `../` sequences are ever introduced.
//! - [`PathResolver::build_effective_path`] resolves a relative path against the
//!   base path. Absolute paths pass through.
//!
//! All operations are lexical. The filesystem is never consulted, so symlinks
//! are not resolved and the paths do not need to exist.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements path resolution against a technology base path

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Path resolution errors
#[derive(Debug, Error)]
pub enum PathResolverError {
    #[error("Path outside base path: {0}")]
    OutsideBase(String),

    #[error("Path escapes its root: {0}")]
    EscapesRoot(String),
}

/// Lexically normalizes a path.
///
/// Removes `.` components and folds `name/..` pairs. A `..` that would climb
/// above the root of an absolute path is dropped; leading `..` components of a
/// relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                normalized.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    normalized.pop();
                    depth -= 1;
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            Component::Normal(part) => {
                normalized.push(part);
                depth += 1;
            }
        }
    }

    normalized
}

/// Resolves paths against a technology base path.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    base: &'a str,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver for the given base path (empty means "no base path")
    pub fn new(base: &'a str) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &str {
        self.base
    }

    /// Makes `path` relative to the base path if it lies below it.
    ///
    /// Returns `"."` for the base path itself. Any other path, or any path when
    /// no base path is set, is returned unchanged.
    pub fn correct_path(&self, path: &str) -> String {
        if self.base.is_empty() || path.is_empty() {
            return path.to_string();
        }

        match self.strip_base(path) {
            Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
            Ok(relative) => relative.to_string_lossy().into_owned(),
            Err(_) => path.to_string(),
        }
    }

    /// Resolves a relative `path` against the base path.
    ///
    /// Absolute paths, empty paths and paths resolved without a base path are
    /// returned unchanged.
    pub fn build_effective_path(&self, path: &str) -> String {
        if path.is_empty() || self.base.is_empty() {
            return path.to_string();
        }

        let p = Path::new(path);
        if p.is_absolute() {
            return path.to_string();
        }

        normalize(&Path::new(self.base).join(p))
            .to_string_lossy()
            .into_owned()
    }

    /// Extract the base-relative part of `path`
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Relative path (empty for the base itself)
    /// * `Err(PathResolverError)` - Path is not below the base path
    pub fn strip_base(&self, path: &str) -> Result<PathBuf, PathResolverError> {
        let base = normalize(Path::new(self.base));
        let target = normalize(Path::new(path));

        // A relative base can only contain relative paths and vice versa
        if base.is_absolute() != target.is_absolute() {
            return Err(PathResolverError::OutsideBase(path.to_string()));
        }
        if target.components().any(|c| c == Component::ParentDir) {
            return Err(PathResolverError::EscapesRoot(path.to_string()));
        }

        target
            .strip_prefix(&base)
            .map(|p| p.to_path_buf())
            .map_err(|_| PathResolverError::OutsideBase(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_current_dir() {
        assert_eq!(
            normalize(Path::new("/tech/./layers/./x.lyp")),
            PathBuf::from("/tech/layers/x.lyp")
        );
    }

    #[test]
    fn test_normalize_parent_dir() {
        assert_eq!(normalize(Path::new("/tech/a/../b")), PathBuf::from("/tech/b"));
        assert_eq!(normalize(Path::new("/../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize(Path::new("../x/y/..")), PathBuf::from("../x"));
    }

    #[test]
    fn test_correct_path_below_base() {
        let resolver = PathResolver::new("/home/tech");
        assert_eq!(resolver.correct_path("/home/tech/layers.lyp"), "layers.lyp");
        assert_eq!(resolver.correct_path("/home/tech/sub/x.lyp"), "sub/x.lyp");
    }

    #[test]
    fn test_correct_path_base_itself() {
        let resolver = PathResolver::new("/home/tech/");
        assert_eq!(resolver.correct_path("/home/tech"), ".");
    }

    #[test]
    fn test_correct_path_beside_or_above_base() {
        let resolver = PathResolver::new("/home/tech");
        assert_eq!(resolver.correct_path("/home/other/x.lyp"), "/home/other/x.lyp");
        assert_eq!(resolver.correct_path("/home/x.lyp"), "/home/x.lyp");
        assert_eq!(resolver.correct_path("/home/technology/x.lyp"), "/home/technology/x.lyp");
        assert_eq!(resolver.correct_path("/home/tech/../x.lyp"), "/home/tech/../x.lyp");
    }

    #[test]
    fn test_correct_path_without_base() {
        let resolver = PathResolver::new("");
        assert_eq!(resolver.correct_path("/home/tech/x.lyp"), "/home/tech/x.lyp");
    }

    #[test]
    fn test_build_effective_path() {
        let resolver = PathResolver::new("/home/tech");
        assert_eq!(resolver.build_effective_path("layers.lyp"), "/home/tech/layers.lyp");
        assert_eq!(resolver.build_effective_path("/abs/x.lyp"), "/abs/x.lyp");
        assert_eq!(resolver.build_effective_path("."), "/home/tech");
        assert_eq!(resolver.build_effective_path(""), "");
    }

    #[test]
    fn test_round_trip() {
        let resolver = PathResolver::new("/home/tech");
        for p in ["/home/tech/a.lyp", "/home/tech/x/y/z.lyp", "/home/tech"] {
            let corrected = resolver.correct_path(p);
            assert_eq!(resolver.build_effective_path(&corrected), p);
        }
    }

    #[test]
    fn test_strip_base_outside() {
        let resolver = PathResolver::new("/home/tech");
        assert!(matches!(
            resolver.strip_base("/etc/passwd"),
            Err(PathResolverError::OutsideBase(_))
        ));
        assert!(resolver.strip_base("relative/x").is_err());
    }
}
