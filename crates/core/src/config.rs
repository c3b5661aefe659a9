//! Configuration surface for pixstore
//!
//! Options deserialize from the application's configuration layer with every
//! field optional, then [`StorageOptions::resolve`] applies defaults and
//! validates once at startup. The resolved [`StorageConfig`] is read-only for
//! the life of the process.

use crate::descriptor::flag_bits;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Checksum algorithm used for upload and content hashing.
///
/// Selected independently for file hashing (`fileHashAlgorithm`) and content
/// hashing (`contentHashAlgorithm`); call sites never depend on the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, the default
    #[default]
    Sha256,
    /// MD5, a faster non-cryptographic alternative
    Md5,
}

/// Raw, partially-specified configuration as read from the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageOptions {
    /// Filesystem root for original assets (required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originals_path: Option<PathBuf>,

    /// Public URL base for original assets (required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originals_url_dir: Option<String>,

    /// Filesystem root for derived variants; defaults to `{originalsPath}_cache`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Public URL base for derived variants; defaults to `{originalsUrlDir}_cache`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_url_dir: Option<String>,

    /// Algorithm for hashing uploaded files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash_algorithm: Option<HashAlgorithm>,

    /// Algorithm for hashing in-memory content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash_algorithm: Option<HashAlgorithm>,

    /// Encode quality applied when a request does not specify one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_quality: Option<u8>,

    /// Resize mode applied when a request does not specify one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_transform_mode: Option<String>,

    /// Identifier of the placeholder served for missing sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_image_placeholder_identifier: Option<String>,

    /// Build public links from descriptor query strings instead of raw cache paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_urls: Option<bool>,

    /// Opportunistically produce WebP variants next to the primary format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_webp: Option<bool>,
}

/// Resolved, validated configuration. Fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Filesystem root for original assets
    pub originals_path: PathBuf,
    /// Public URL base for original assets
    pub originals_url_dir: String,
    /// Filesystem root for derived variants
    pub cache_path: PathBuf,
    /// Public URL base for derived variants
    pub cache_url_dir: String,
    /// Algorithm for hashing uploaded files
    pub file_hash_algorithm: HashAlgorithm,
    /// Algorithm for hashing in-memory content
    pub content_hash_algorithm: HashAlgorithm,
    /// Encode quality applied when a request does not specify one
    pub default_quality: u8,
    /// Resize mode applied when a request does not specify one
    pub default_transform_mode: String,
    /// Identifier of the placeholder served for missing sources
    pub no_image_identifier: String,
    /// Build public links from descriptor query strings
    pub friendly_urls: bool,
    /// Produce WebP variants next to the primary format
    pub generate_webp: bool,
}

impl StorageOptions {
    /// Apply defaults and validate into a [`StorageConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error when a required root is missing, the default quality
    /// is out of range, or the default transform mode does not name a known
    /// mode combination.
    pub fn resolve(self) -> Result<StorageConfig> {
        let originals_path = self
            .originals_path
            .ok_or_else(|| Error::configuration("originalsPath is required"))?;
        let originals_url_dir = self
            .originals_url_dir
            .ok_or_else(|| Error::configuration("originalsUrlDir is required"))?;

        let cache_path = self.cache_path.unwrap_or_else(|| {
            let mut s = originals_path.as_os_str().to_os_string();
            s.push("_cache");
            PathBuf::from(s)
        });
        let cache_url_dir = self
            .cache_url_dir
            .unwrap_or_else(|| format!("{originals_url_dir}_cache"));

        let default_quality = self.default_quality.unwrap_or(85);
        if default_quality > 100 {
            return Err(Error::configuration(format!(
                "defaultQuality must be 0-100, got {default_quality}"
            )));
        }

        let default_transform_mode = self
            .default_transform_mode
            .unwrap_or_else(|| "fit".to_string());
        // Resolving the bit value up front turns a typo into a startup error
        // instead of a per-request one.
        flag_bits(&default_transform_mode)?;

        Ok(StorageConfig {
            originals_path,
            originals_url_dir,
            cache_path,
            cache_url_dir,
            file_hash_algorithm: self.file_hash_algorithm.unwrap_or_default(),
            content_hash_algorithm: self.content_hash_algorithm.unwrap_or_default(),
            default_quality,
            default_transform_mode,
            no_image_identifier: self
                .no_image_placeholder_identifier
                .unwrap_or_else(|| "noimage/03/no-image.png".to_string()),
            friendly_urls: self.friendly_urls.unwrap_or(false),
            generate_webp: self.generate_webp.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> StorageOptions {
        StorageOptions {
            originals_path: Some(PathBuf::from("/srv/assets")),
            originals_url_dir: Some("assets".to_string()),
            ..StorageOptions::default()
        }
    }

    #[test]
    fn cache_roots_default_to_suffixed_originals() {
        let config = minimal().resolve().unwrap();
        assert_eq!(config.cache_path, PathBuf::from("/srv/assets_cache"));
        assert_eq!(config.cache_url_dir, "assets_cache");
    }

    #[test]
    fn explicit_cache_roots_win() {
        let mut options = minimal();
        options.cache_path = Some(PathBuf::from("/var/cache/assets"));
        options.cache_url_dir = Some("cdn-cache".to_string());
        let config = options.resolve().unwrap();
        assert_eq!(config.cache_path, PathBuf::from("/var/cache/assets"));
        assert_eq!(config.cache_url_dir, "cdn-cache");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = minimal().resolve().unwrap();
        assert_eq!(config.default_quality, 85);
        assert_eq!(config.default_transform_mode, "fit");
        assert_eq!(config.no_image_identifier, "noimage/03/no-image.png");
        assert_eq!(config.file_hash_algorithm, HashAlgorithm::Sha256);
        assert!(!config.friendly_urls);
        assert!(config.generate_webp);
    }

    #[test]
    fn missing_roots_are_rejected() {
        assert!(StorageOptions::default().resolve().is_err());
    }

    #[test]
    fn unknown_default_mode_is_a_startup_error() {
        let mut options = minimal();
        options.default_transform_mode = Some("zoom".to_string());
        assert!(matches!(
            options.resolve(),
            Err(Error::UnknownTransformMode { .. })
        ));
    }

    #[test]
    fn options_round_trip_through_json() {
        let mut options = minimal();
        options.default_quality = Some(70);
        options.generate_webp = Some(false);
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("originalsPath"));
        assert!(json.contains("generateWebp"));
        let parsed: StorageOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}
