//! Core types for pixstore: the transform descriptor and its identifier
//! codec, size-spec parsing, resize modes, display-name sanitization and
//! the configuration surface.
//!
//! Everything in this crate is pure — no filesystem access. The identifier
//! codec is the heart of the derived-asset cache: a descriptor serializes to
//! a stable, collision-resistant relative path, and that path *is* the cache
//! key. Determinism here is what makes repeated transform requests resolve
//! to the same on-disk file.

mod config;
mod descriptor;
mod error;
mod sanitize;

pub use config::{HashAlgorithm, StorageConfig, StorageOptions};
pub use descriptor::{
    AssetDescriptor, AssetDescriptorBuilder, CropRect, SizeSpec, TransformMode, flag_bits,
    match_pattern,
};
pub use error::{Error, Result};
pub use sanitize::sanitize_name;
