//! The filesystem layer: roots, path resolution, unique-name allocation and
//! the primitive file operations everything else is built on.
//!
//! There is no index and no lock manager — the directory layout *is* the
//! index. Directory creation and removal are best-effort: races are
//! swallowed with a log line, because every creation is followed by a real
//! write that fails loudly on a genuine permission problem.

use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owns the originals root and the derived-cache root and resolves
/// identifiers to absolute paths beneath them.
#[derive(Debug, Clone)]
pub struct AssetStore {
    originals_path: PathBuf,
    cache_path: PathBuf,
}

impl AssetStore {
    /// Create a store over the two configured roots.
    #[must_use]
    pub fn new(originals_path: impl Into<PathBuf>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            originals_path: originals_path.into(),
            cache_path: cache_path.into(),
        }
    }

    /// Root directory of original assets.
    #[must_use]
    pub fn originals_root(&self) -> &Path {
        &self.originals_path
    }

    /// Root directory of derived variants.
    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_path
    }

    /// Absolute path of an original asset.
    #[must_use]
    pub fn original_path(&self, identifier: &str) -> PathBuf {
        self.originals_path.join(identifier)
    }

    /// Absolute path of a cached derived variant.
    #[must_use]
    pub fn cached_path(&self, identifier: &str) -> PathBuf {
        self.cache_path.join(identifier)
    }

    /// Whether an original asset exists.
    #[must_use]
    pub fn original_exists(&self, identifier: &str) -> bool {
        !identifier.is_empty() && self.original_path(identifier).exists()
    }

    /// Whether a cached variant exists.
    #[must_use]
    pub fn cached_exists(&self, identifier: &str) -> bool {
        !identifier.is_empty() && self.cached_path(identifier).exists()
    }

    /// Best-effort recursive directory creation.
    ///
    /// "Already exists" races and permission failures are logged and
    /// swallowed; the subsequent real write surfaces genuine problems.
    pub fn ensure_dir(dir: &Path) {
        match fs::create_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(dir = %dir.display(), "directory already exists");
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "could not create directory");
            }
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o775));
        }
    }

    /// Allocate a file name in `dir` that no existing file occupies.
    ///
    /// Returns the desired `{stem}.{ext}` untouched when it is free;
    /// otherwise appends `.2`, `.3`, … to the stem — always reformatting
    /// from the pristine stem, so the suffix widens correctly (`.9` →
    /// `.10`) instead of truncating.
    ///
    /// The check-then-write gap on two concurrent uploads choosing the same
    /// stem is a known, accepted race.
    #[must_use]
    pub fn allocate_unique_name(dir: &Path, stem: &str, extension: &str) -> (PathBuf, String) {
        let mut candidate = stem.to_string();
        let mut counter: u32 = 1;
        loop {
            let file_name = format!("{candidate}.{extension}");
            let path = dir.join(&file_name);
            if !path.exists() {
                return (path, file_name);
            }
            counter += 1;
            candidate = format!("{stem}.{counter}");
        }
    }

    /// Move an uploaded temporary file into place.
    ///
    /// Renames when source and destination share a filesystem, falling back
    /// to copy-and-remove when they do not.
    pub fn move_into_place(source: &Path, destination: &Path) -> Result<()> {
        if fs::rename(source, destination).is_ok() {
            return Ok(());
        }
        fs::copy(source, destination).map_err(|e| Error::io(e, destination, "copy"))?;
        if let Err(e) = fs::remove_file(source) {
            debug!(path = %source.display(), error = %e, "could not remove moved temp file");
        }
        Ok(())
    }

    /// Write content to `destination` without interleaving with concurrent
    /// writers: the bytes land in a temporary file in the destination's
    /// directory and are renamed into place. Two concurrent writers of the
    /// same derived variant produce identical bytes, so last-writer-wins is
    /// harmless.
    pub fn write_content(destination: &Path, bytes: &[u8]) -> Result<()> {
        let dir = destination
            .parent()
            .ok_or_else(|| Error::io_no_path(
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination has no parent"),
                "write",
            ))?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::io(e, dir, "create temp file"))?;
        temp.write_all(bytes)
            .map_err(|e| Error::io(e, destination, "write"))?;
        temp.persist(destination)
            .map_err(|e| Error::io(e.error, destination, "persist"))?;
        Ok(())
    }

    /// File names in `dir` matching `pattern`. A missing directory yields
    /// an empty list.
    #[must_use]
    pub fn list_matching(dir: &Path, pattern: &Regex) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut matches: Vec<String> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name().to_str()?.to_string();
                pattern.is_match(&name).then_some(name)
            })
            .collect();
        matches.sort_unstable();
        matches
    }

    /// Remove a single file.
    pub fn remove_file(path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::io(e, path, "remove"))
    }

    /// Remove `dir` when it holds no real entries. Best-effort: a
    /// concurrent writer or an earlier cleaner may win the race, and that
    /// is fine.
    pub fn remove_dir_if_empty(dir: &Path) {
        let Ok(mut entries) = fs::read_dir(dir) else {
            return;
        };
        if entries.next().is_some() {
            return;
        }
        if let Err(e) = fs::remove_dir(dir) {
            debug!(dir = %dir.display(), error = %e, "could not remove empty directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unique_name_keeps_free_names_untouched() {
        let temp = TempDir::new().unwrap();
        let (path, name) = AssetStore::allocate_unique_name(temp.path(), "photo", "jpg");
        assert_eq!(name, "photo.jpg");
        assert_eq!(path, temp.path().join("photo.jpg"));
    }

    #[test]
    fn unique_name_appends_numeric_suffixes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("photo.jpg"), b"first").unwrap();
        let (_, name) = AssetStore::allocate_unique_name(temp.path(), "photo", "jpg");
        assert_eq!(name, "photo.2.jpg");

        fs::write(temp.path().join("photo.2.jpg"), b"second").unwrap();
        let (_, name) = AssetStore::allocate_unique_name(temp.path(), "photo", "jpg");
        assert_eq!(name, "photo.3.jpg");
    }

    #[test]
    fn unique_name_suffix_widens_past_nine() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("photo.jpg"), b"x").unwrap();
        for i in 2..=9 {
            fs::write(temp.path().join(format!("photo.{i}.jpg")), b"x").unwrap();
        }
        let (_, name) = AssetStore::allocate_unique_name(temp.path(), "photo", "jpg");
        assert_eq!(name, "photo.10.jpg");
    }

    #[test]
    fn write_content_lands_atomically() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("pic.jpg");
        AssetStore::write_content(&dest, b"bytes").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"bytes");

        // A repeat write of the same bytes is harmless.
        AssetStore::write_content(&dest, b"bytes").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"bytes");

        // No stray temp files remain next to the destination.
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "pic.jpg")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn list_matching_filters_by_pattern() {
        let temp = TempDir::new().unwrap();
        for name in ["pic.jpg", "pic.100x100.fit.85.jpg", "pic.2.jpg", "other.jpg"] {
            fs::write(temp.path().join(name), b"x").unwrap();
        }
        let pattern = pixstore_core::match_pattern("pic");
        let matches = AssetStore::list_matching(temp.path(), &pattern);
        assert_eq!(matches, vec!["pic.100x100.fit.85.jpg", "pic.jpg"]);
    }

    #[test]
    fn remove_dir_if_empty_only_removes_empty_dirs() {
        let temp = TempDir::new().unwrap();
        let full = temp.path().join("full");
        let empty = temp.path().join("empty");
        fs::create_dir_all(&full).unwrap();
        fs::create_dir_all(&empty).unwrap();
        fs::write(full.join("file"), b"x").unwrap();

        AssetStore::remove_dir_if_empty(&full);
        AssetStore::remove_dir_if_empty(&empty);
        assert!(full.exists());
        assert!(!empty.exists());
    }

    #[test]
    fn ensure_dir_tolerates_existing_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c");
        AssetStore::ensure_dir(&dir);
        assert!(dir.is_dir());
        AssetStore::ensure_dir(&dir);
        assert!(dir.is_dir());
    }
}
