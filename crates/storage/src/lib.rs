//! Filesystem image storage with an on-demand derived-variant cache
//!
//! This crate stores original uploads under a sharded directory layout and
//! derives resized/cropped variants lazily, caching each one at the path
//! its descriptor serializes to:
//!
//! - Originals live at `{originals}/{namespace}/{2-char-hash-prefix}/{stem}[.N].{ext}`
//! - Variants live at `{cache}/{namespace}/{prefix}/{stem}.{W}x{H}[crop...][.flag][.quality].{ext|webp}`
//!
//! The cache path is the index: a transform request re-derives the
//! canonical identifier, checks whether the file exists, and only computes
//! the transform on a miss. A WebP rendition is produced opportunistically
//! next to the primary format; when the backend cannot encode WebP the
//! primary format quietly stands alone.
//!
//! # Overview
//!
//! - [`AssetStorage`] — the facade: save, resolve, delete
//! - [`AssetStore`] — roots, paths, unique-name allocation, primitive I/O
//! - [`DerivedAssetResolver`] — the transform state machine
//! - [`CacheInvalidator`] — pattern sweeps when a source changes or goes
//! - [`ImageProcessor`]/[`Raster`] — the imaging capability seam
//!
//! Every operation is synchronous blocking I/O and safe to call from many
//! request-handling threads: the filesystem is the only shared state, and
//! cache writes go through temp-file renames so concurrent misses for the
//! same descriptor are a benign race.

mod error;
mod hashing;
mod imaging;
mod invalidate;
mod placeholder;
mod record;
mod resolver;
mod storage;
mod store;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use hashing::Hasher;
pub use imaging::{ImageProcessor, ImagingError, PixelBackend, PixelRaster, Raster};
pub use invalidate::{CacheInvalidator, DeleteTarget};
pub use record::AssetRecord;
pub use resolver::DerivedAssetResolver;
pub use storage::{AssetStorage, Upload};
pub use store::AssetStore;

// The core vocabulary is part of this crate's API surface.
pub use pixstore_core::{
    AssetDescriptor, AssetDescriptorBuilder, CropRect, HashAlgorithm, SizeSpec, StorageConfig,
    StorageOptions, TransformMode, flag_bits, match_pattern, sanitize_name,
};
