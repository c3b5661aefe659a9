//! The storage facade
//!
//! [`AssetStorage`] wires the configured roots, checksums and imaging
//! backend into one handle: save uploads and content, resolve originals
//! and derived variants, delete assets together with their cached
//! variants.

use crate::error::Result;
use crate::hashing::Hasher;
use crate::imaging::{ImageProcessor, PixelBackend};
use crate::invalidate::{CacheInvalidator, DeleteTarget};
use crate::record::AssetRecord;
use crate::resolver::DerivedAssetResolver;
use crate::store::AssetStore;
use pixstore_core::{Error as CoreError, StorageConfig, StorageOptions, sanitize_name};
use std::path::PathBuf;

/// An uploaded file as handed over by the HTTP layer: a temporary file on
/// disk plus the client-supplied, untrusted display name.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Where the upload landed on disk
    pub temp_path: PathBuf,
    /// The display name as sent by the client — sanitized before use
    pub untrusted_name: String,
}

impl Upload {
    /// Describe an uploaded temporary file.
    #[must_use]
    pub fn new(temp_path: impl Into<PathBuf>, untrusted_name: impl Into<String>) -> Self {
        Self {
            temp_path: temp_path.into(),
            untrusted_name: untrusted_name.into(),
        }
    }
}

/// Filesystem image storage with an on-demand derived-variant cache.
pub struct AssetStorage<P: ImageProcessor = PixelBackend> {
    config: StorageConfig,
    store: AssetStore,
    hasher: Hasher,
    processor: P,
}

impl AssetStorage<PixelBackend> {
    /// Create a storage over the default `image`-crate backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when required options are missing or
    /// invalid.
    pub fn new(options: StorageOptions) -> Result<Self> {
        Self::with_processor(options, PixelBackend::new())
    }
}

impl<P: ImageProcessor> AssetStorage<P> {
    /// Create a storage with a custom imaging backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when required options are missing or
    /// invalid.
    pub fn with_processor(options: StorageOptions, processor: P) -> Result<Self> {
        let config = options.resolve()?;
        let store = AssetStore::new(&config.originals_path, &config.cache_path);
        let hasher = Hasher::new(config.file_hash_algorithm, config.content_hash_algorithm);
        Ok(Self {
            config,
            store,
            hasher,
            processor,
        })
    }

    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The underlying filesystem store.
    #[must_use]
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    fn resolver(&self) -> DerivedAssetResolver<'_, P> {
        DerivedAssetResolver::new(&self.store, &self.config, &self.processor)
    }

    /// Store an uploaded file under `namespace`.
    ///
    /// The display name is sanitized; colliding names get a numeric
    /// suffix, so no upload ever overwrites another. The checksum defaults
    /// to the configured file hash of the temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingExtension`] when the sanitized name has
    /// no extension, and I/O errors when the upload cannot be moved into
    /// place.
    pub fn save_upload(
        &self,
        upload: &Upload,
        namespace: &str,
        checksum: Option<String>,
    ) -> Result<AssetRecord> {
        let checksum = match checksum {
            Some(checksum) => checksum,
            None => self.hasher.file_hash(&upload.temp_path)?,
        };
        let name = sanitize_name(&upload.untrusted_name);
        let (path, identifier) = self.save_location(&name, namespace, &checksum)?;
        AssetStore::move_into_place(&upload.temp_path, &path)?;
        Ok(self
            .original_record(identifier)
            .with_checksum(checksum)
            .with_display_name(name))
    }

    /// Store in-memory content as an asset under `namespace`.
    ///
    /// The checksum defaults to the configured content hash. The write
    /// goes through a temporary file and a rename, so concurrent writers
    /// never interleave.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingExtension`] when the sanitized name has
    /// no extension, and I/O errors when the content cannot be written.
    pub fn save_content(
        &self,
        content: &[u8],
        name: &str,
        namespace: &str,
        checksum: Option<String>,
    ) -> Result<AssetRecord> {
        let checksum = checksum.unwrap_or_else(|| self.hasher.content_hash(content));
        let name = sanitize_name(name);
        let (path, identifier) = self.save_location(&name, namespace, &checksum)?;
        AssetStore::write_content(&path, content)?;
        Ok(self
            .original_record(identifier)
            .with_checksum(checksum)
            .with_display_name(name))
    }

    /// Resolve an identifier to its original asset, or to the no-image
    /// placeholder when it is empty or missing.
    ///
    /// # Errors
    ///
    /// Fails only when the placeholder cannot be materialized.
    pub fn resolve(&self, identifier: &str) -> Result<AssetRecord> {
        self.resolver().resolve(identifier)
    }

    /// Resolve a derived variant, producing and caching it on first
    /// request. See
    /// [`DerivedAssetResolver::resolve_transformed`].
    ///
    /// # Errors
    ///
    /// Returns size-spec and unknown-mode errors before any I/O; later
    /// failures degrade to sentinel or original-asset records.
    pub fn resolve_transformed(
        &self,
        identifier: &str,
        size_spec: &str,
        flag: Option<&str>,
        quality: Option<u8>,
    ) -> Result<AssetRecord> {
        self.resolver()
            .resolve_transformed(identifier, size_spec, flag, quality)
    }

    /// The no-image placeholder record, materialized on first use.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoImageUnwritable`] when the placeholder
    /// cannot be created.
    pub fn no_image(&self) -> Result<AssetRecord> {
        self.resolver().no_image()
    }

    /// Delete an asset and every cached variant sharing its base name.
    ///
    /// See [`CacheInvalidator::delete`] for the `only_changed_variants`
    /// semantics.
    ///
    /// # Errors
    ///
    /// Returns an error when the target does not parse as a descriptor.
    pub fn delete(&self, target: DeleteTarget<'_>, only_changed_variants: bool) -> Result<()> {
        CacheInvalidator::new(&self.store).delete(target, only_changed_variants)
    }

    fn original_record(&self, identifier: String) -> AssetRecord {
        AssetRecord::new(
            self.config.friendly_urls,
            &self.config.originals_url_dir,
            &self.config.originals_path,
            identifier,
        )
    }

    // Pick the sharded directory and a collision-free file name for a
    // save, creating the directory best-effort on the way.
    fn save_location(
        &self,
        name: &str,
        namespace: &str,
        checksum: &str,
    ) -> Result<(PathBuf, String)> {
        let prefix: String = checksum.chars().take(2).collect();
        if prefix.chars().count() != 2 {
            return Err(CoreError::configuration(format!(
                "checksum `{checksum}` is too short for a shard prefix"
            ))
            .into());
        }

        let (stem, extension) = split_extension(name)?;
        let dir = self.config.originals_path.join(namespace).join(&prefix);
        AssetStore::ensure_dir(&dir);

        let (path, file_name) = AssetStore::allocate_unique_name(&dir, stem, extension);
        let identifier = format!("{namespace}/{prefix}/{file_name}");
        Ok((path, identifier))
    }
}

// Split `stem.ext` on the last dot.
fn split_extension(name: &str) -> Result<(&str, &str)> {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            Ok((stem, extension))
        }
        _ => Err(CoreError::missing_extension(name).into()),
    }
}
