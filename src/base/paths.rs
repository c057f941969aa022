//! Filesystem path normalisation.

use std::io;
use std::path::{Path, PathBuf};

/// Absolute form of `path` with every symlink resolved.
///
/// Relative paths are taken against the current directory. Fails if any
/// component does not exist.
pub fn canonical_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_dot_segments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("inner")).unwrap();

        let messy = dir.path().join("inner").join("..").join("inner");
        let canonical = canonical_path(&messy).unwrap();
        assert!(canonical.is_absolute());
        assert_eq!(canonical, canonical_path(dir.path().join("inner")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn resolves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(canonical_path(&link).unwrap(), canonical_path(&target).unwrap());
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = canonical_path(dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
