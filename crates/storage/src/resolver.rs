//! The derived-asset resolver
//!
//! One request walks PARSE → RESOLVE_SOURCE → CACHE_CHECK → {HIT,
//! MISS→TRANSFORM→PERSIST} → RESULT. The canonical identifier built from
//! the descriptor is the cache key; existence of the file at that key is
//! the cache hit test. Concurrent first-requests for the same descriptor
//! may both transform — both then write identical bytes through a rename,
//! so the race is benign.
//!
//! Errors after the source has been located degrade instead of
//! propagating: an undecodable source yields a sentinel record, a failed
//! encode yields a record pointing back at the original asset. Template
//! rendering never breaks on a bad derived asset.

use crate::error::Result;
use crate::imaging::{ImageProcessor, ImagingError, Raster};
use crate::placeholder;
use crate::record::AssetRecord;
use crate::store::AssetStore;
use pixstore_core::{AssetDescriptor, SizeSpec, StorageConfig, flag_bits};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Produces (or reuses) derived variants of stored assets.
pub struct DerivedAssetResolver<'a, P: ImageProcessor> {
    store: &'a AssetStore,
    config: &'a StorageConfig,
    processor: &'a P,
}

impl<'a, P: ImageProcessor> DerivedAssetResolver<'a, P> {
    /// Create a resolver over the given store, configuration and imaging
    /// backend.
    #[must_use]
    pub fn new(store: &'a AssetStore, config: &'a StorageConfig, processor: &'a P) -> Self {
        Self {
            store,
            config,
            processor,
        }
    }

    /// Resolve an identifier without a transform: the original asset, or
    /// the no-image placeholder when the identifier is empty or the file
    /// is missing.
    ///
    /// # Errors
    ///
    /// Returns an error only when the placeholder itself cannot be
    /// materialized.
    pub fn resolve(&self, identifier: &str) -> Result<AssetRecord> {
        if identifier.is_empty() || !self.store.original_exists(identifier) {
            return self.no_image();
        }
        Ok(AssetRecord::new(
            self.config.friendly_urls,
            &self.config.originals_url_dir,
            &self.config.originals_path,
            identifier,
        ))
    }

    /// The no-image placeholder as a servable record, materializing the
    /// placeholder file on first use.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoImageUnwritable`] when the placeholder is
    /// absent and cannot be created.
    pub fn no_image(&self) -> Result<AssetRecord> {
        placeholder::ensure_no_image(self.store, self.config)?;
        Ok(AssetRecord::new(
            self.config.friendly_urls,
            &self.config.originals_url_dir,
            &self.config.originals_path,
            &self.config.no_image_identifier,
        ))
    }

    /// Resolve a derived variant of `identifier` for the given compact
    /// size spec, producing it on a cache miss.
    ///
    /// `flag` and `quality` override the configured defaults only when
    /// given.
    ///
    /// # Errors
    ///
    /// Before any I/O: [`pixstore_core::Error::SizeSpec`] for a missing or
    /// zero dimension and [`pixstore_core::Error::UnknownTransformMode`]
    /// for an unknown mode token (a configuration bug). Later failures
    /// degrade to sentinel or original-asset records instead of erroring.
    pub fn resolve_transformed(
        &self,
        identifier: &str,
        size_spec: &str,
        flag: Option<&str>,
        quality: Option<u8>,
    ) -> Result<AssetRecord> {
        // PARSE — fail fast, nothing has touched the filesystem yet.
        let spec = SizeSpec::parse(size_spec)?;
        let flag = flag.unwrap_or(&self.config.default_transform_mode);
        let quality = quality.unwrap_or(self.config.default_quality);
        let mode_bits = flag_bits(flag)?;

        // RESOLVE_SOURCE
        let (source, source_path, is_placeholder) = self.locate_source(identifier)?;
        let descriptor = source
            .to_builder()
            .transform(spec)
            .flag(flag)
            .quality(quality)
            .build()?;

        // CACHE_CHECK
        let derived_identifier = descriptor.identifier();
        let webp_identifier = descriptor.webp_identifier();
        let primary_path = self.store.cached_path(&derived_identifier);
        let webp_path = self.store.cached_path(&webp_identifier);

        if !primary_path.exists() && !webp_path.exists() {
            // MISS → TRANSFORM → PERSIST
            if let Some(record) = self.populate(
                identifier,
                &descriptor,
                &source_path,
                is_placeholder,
                mode_bits,
                quality,
                &primary_path,
                &webp_path,
            ) {
                return Ok(record);
            }
        }

        // RESULT — prefer the WebP sibling when both ended up on disk.
        let cached = if webp_path.exists() {
            webp_identifier
        } else {
            derived_identifier
        };
        Ok(AssetRecord::new(
            self.config.friendly_urls,
            &self.config.cache_url_dir,
            &self.config.cache_path,
            cached,
        )
        .with_descriptor(descriptor))
    }

    // Perform the transform and write the cache files. Returns a degraded
    // record to short-circuit with, or None when the cache was populated.
    #[allow(clippy::too_many_arguments)]
    fn populate(
        &self,
        identifier: &str,
        descriptor: &AssetDescriptor,
        source_path: &Path,
        is_placeholder: bool,
        mode_bits: u8,
        quality: u8,
        primary_path: &Path,
        webp_path: &Path,
    ) -> Option<AssetRecord> {
        if !source_path.exists() {
            return Some(AssetRecord::sentinel("Can not find image"));
        }

        let mut raster = match self.processor.decode(source_path) {
            Ok(raster) => raster,
            Err(e) => {
                debug!(source = %source_path.display(), error = %e, "source did not decode");
                return Some(AssetRecord::sentinel("Unknown type of file"));
            }
        };

        // The placeholder's own aspect ratio is authoritative; a caller
        // crop never applies to it.
        if let Some(crop) = descriptor.crop()
            && !is_placeholder
        {
            raster.crop(crop);
        }

        let Some((width, height)) = descriptor.size() else {
            // The builder guarantees a size on every derived descriptor.
            return Some(AssetRecord::sentinel("Can not find image"));
        };
        raster.resize(width, height, mode_bits);

        if let Some(dir) = primary_path.parent() {
            AssetStore::ensure_dir(dir);
        }

        raster.sharpen();
        if let Err(e) = raster.encode(primary_path, quality) {
            warn!(path = %primary_path.display(), error = %e, "encode failed; serving the original");
            return Some(self.original_fallback(identifier));
        }

        if self.config.generate_webp {
            match raster.encode_webp(webp_path, quality) {
                Ok(()) => {
                    // The WebP file is the cached variant from here on.
                    if let Err(e) = AssetStore::remove_file(primary_path) {
                        debug!(path = %primary_path.display(), error = %e, "could not drop primary after webp");
                    }
                }
                Err(ImagingError::Unsupported { what }) => {
                    debug!(%what, "webp encoding unsupported; keeping the primary format");
                }
                Err(e) => {
                    warn!(path = %webp_path.display(), error = %e, "webp encode failed; serving the original");
                    return Some(self.original_fallback(identifier));
                }
            }
        }

        None
    }

    // Fallback record pointing at the unresized original asset.
    fn original_fallback(&self, identifier: &str) -> AssetRecord {
        AssetRecord::new(
            self.config.friendly_urls,
            &self.config.originals_url_dir,
            &self.config.originals_path,
            identifier,
        )
    }

    // Locate the source asset, substituting the placeholder for empty or
    // missing identifiers. The substitution is remembered so crop never
    // applies to the placeholder.
    fn locate_source(&self, identifier: &str) -> Result<(AssetDescriptor, PathBuf, bool)> {
        if !identifier.is_empty()
            && let Ok(descriptor) = AssetDescriptor::from_identifier(identifier)
        {
            let path = self.store.original_path(&descriptor.original_identifier());
            if path.exists() {
                return Ok((descriptor, path, false));
            }
        }
        let (descriptor, path) = placeholder::ensure_no_image(self.store, self.config)?;
        Ok((descriptor, path, true))
    }
}
