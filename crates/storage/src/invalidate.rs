//! Cache invalidation
//!
//! Deleting a source asset must also clear every derived variant sharing
//! its base name — in the cache directory (primary and WebP renditions
//! alike) and in the originals directory. The descriptor codec rebuilds
//! the matching pattern; directories left empty by the sweep are removed
//! best-effort.

use crate::error::Result;
use crate::record::AssetRecord;
use crate::store::AssetStore;
use pixstore_core::AssetDescriptor;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::warn;

/// What to delete: a resolved record, a full identifier, or a bare file
/// name (which matches by name only, in the roots themselves).
#[derive(Debug, Clone, Copy)]
pub enum DeleteTarget<'a> {
    /// A record returned by a store or resolve operation
    Record(&'a AssetRecord),
    /// A full `namespace/prefix/file` identifier
    Identifier(&'a str),
    /// A bare file name with no namespace or prefix
    Name(&'a str),
}

impl<'a> From<&'a AssetRecord> for DeleteTarget<'a> {
    fn from(record: &'a AssetRecord) -> Self {
        Self::Record(record)
    }
}

/// Removes cache entries (and emptied directories) for a source asset.
pub struct CacheInvalidator<'a> {
    store: &'a AssetStore,
}

impl<'a> CacheInvalidator<'a> {
    /// Create an invalidator over the given store.
    #[must_use]
    pub fn new(store: &'a AssetStore) -> Self {
        Self { store }
    }

    /// Remove every file matching the target's base name from the cache
    /// and originals directories.
    ///
    /// With `only_changed_variants` set, a file whose name equals the
    /// descriptor's current canonical filename is spared — used when a
    /// source has just been replaced in place and only the now-stale
    /// siblings should go.
    ///
    /// # Errors
    ///
    /// Returns an error when the target does not parse as a descriptor.
    /// Individual file removals are best-effort and logged.
    pub fn delete(&self, target: DeleteTarget<'_>, only_changed_variants: bool) -> Result<()> {
        let descriptor = match target {
            DeleteTarget::Record(record) => AssetDescriptor::from_identifier(record.identifier())?,
            DeleteTarget::Identifier(identifier) => AssetDescriptor::from_identifier(identifier)?,
            DeleteTarget::Name(name) => AssetDescriptor::from_name(name)?,
        };

        let pattern = descriptor.sibling_pattern();
        let current = descriptor.original_file_name();
        let spared = only_changed_variants.then_some(current.as_str());

        let subdir = Self::shard_subdir(&descriptor);
        Self::sweep(&self.store.cache_root().join(&subdir), &pattern, spared);
        Self::sweep(&self.store.originals_root().join(&subdir), &pattern, spared);
        Ok(())
    }

    fn shard_subdir(descriptor: &AssetDescriptor) -> PathBuf {
        let mut subdir = PathBuf::new();
        for segment in [descriptor.namespace(), descriptor.hash_prefix()] {
            if !segment.is_empty() {
                subdir.push(segment);
            }
        }
        subdir
    }

    fn sweep(dir: &Path, pattern: &Regex, spared: Option<&str>) {
        if !dir.exists() {
            return;
        }
        for name in AssetStore::list_matching(dir, pattern) {
            if spared == Some(name.as_str()) {
                continue;
            }
            let path = dir.join(&name);
            if let Err(e) = AssetStore::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove cache entry");
            }
        }
        AssetStore::remove_dir_if_empty(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn delete_sweeps_all_variants_everywhere() {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path().join("orig"), temp.path().join("cache"));
        let orig_dir = temp.path().join("orig/gallery/ab");
        let cache_dir = temp.path().join("cache/gallery/ab");
        seed(&orig_dir, &["pic.jpg"]);
        seed(
            &cache_dir,
            &[
                "pic.100x100.fit.85.jpg",
                "pic.100x100.fit.85.webp",
                "pic.50x50.fill.70.jpg",
            ],
        );

        CacheInvalidator::new(&store)
            .delete(DeleteTarget::Identifier("gallery/ab/pic.jpg"), false)
            .unwrap();

        assert!(!orig_dir.join("pic.jpg").exists());
        assert!(!cache_dir.exists(), "emptied cache dir should be removed");
        assert!(!orig_dir.exists(), "emptied originals dir should be removed");
    }

    #[test]
    fn sibling_uploads_survive_the_sweep() {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path().join("orig"), temp.path().join("cache"));
        let orig_dir = temp.path().join("orig/gallery/ab");
        seed(&orig_dir, &["pic.jpg", "pic.2.jpg", "picture.jpg"]);

        CacheInvalidator::new(&store)
            .delete(DeleteTarget::Identifier("gallery/ab/pic.jpg"), false)
            .unwrap();

        assert!(!orig_dir.join("pic.jpg").exists());
        assert!(orig_dir.join("pic.2.jpg").exists());
        assert!(orig_dir.join("picture.jpg").exists());
    }

    #[test]
    fn only_changed_variants_spares_the_current_file() {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path().join("orig"), temp.path().join("cache"));
        let orig_dir = temp.path().join("orig/gallery/ab");
        let cache_dir = temp.path().join("cache/gallery/ab");
        seed(&orig_dir, &["pic.jpg"]);
        seed(&cache_dir, &["pic.jpg", "pic.100x100.fit.85.jpg"]);

        CacheInvalidator::new(&store)
            .delete(DeleteTarget::Identifier("gallery/ab/pic.jpg"), true)
            .unwrap();

        // The replaced source and its name-twin in the cache survive; the
        // stale derived size does not.
        assert!(orig_dir.join("pic.jpg").exists());
        assert!(cache_dir.join("pic.jpg").exists());
        assert!(!cache_dir.join("pic.100x100.fit.85.jpg").exists());
    }

    #[test]
    fn delete_by_bare_name_sweeps_the_roots() {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path().join("orig"), temp.path().join("cache"));
        seed(&temp.path().join("orig"), &["banner.png"]);
        seed(&temp.path().join("cache"), &["banner.300x100.fit.85.png"]);

        CacheInvalidator::new(&store)
            .delete(DeleteTarget::Name("banner.png"), false)
            .unwrap();

        assert!(!temp.path().join("orig/banner.png").exists());
        assert!(!temp.path().join("cache/banner.300x100.fit.85.png").exists());
    }

    #[test]
    fn missing_directories_are_not_an_error() {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path().join("orig"), temp.path().join("cache"));
        CacheInvalidator::new(&store)
            .delete(DeleteTarget::Identifier("nothing/ab/here.png"), false)
            .unwrap();
    }
}
