//! The embedded no-image placeholder
//!
//! When a transform request names a source that is empty or missing, the
//! resolver substitutes a configured placeholder asset. The placeholder
//! file itself is materialized on first use from a PNG embedded here, so a
//! fresh deployment serves placeholders without any seeding step.

use crate::error::{Error, Result};
use crate::store::AssetStore;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pixstore_core::{AssetDescriptor, StorageConfig};
use std::path::PathBuf;
use tracing::debug;

// 120x90 neutral gray PNG.
const NO_IMAGE_PNG_BASE64: &str = "\
iVBORw0KGgoAAAANSUhEUgAAAHgAAABaCAIAAAD8YgW4AAAAn0lEQVR42u3dQQEAAATAQP3TKKSL\
FDy4RbgCi9RKgWAVujQWaNCgBRo0aNCgQQs0aNCgQYMWaNCgQYMGLdCgQYMGDVqgQYMGDRq0QIMG\
DRo0aIEGDRo0aNACDRo0aNCgBRo0aNCgQQs0aNCgQYMWaNCgQYMGLdCgQYMGDVqgQYPGARq0QIMG\
LdCgBRo0aIEGLdCgQQs0aIEG/RtavuBHanPnlg7vC4NzAAAAAElFTkSuQmCC";

/// Decoded bytes of the embedded placeholder PNG.
///
/// # Errors
///
/// Never fails for the embedded constant; kept fallible so a corrupted
/// build surfaces as an error rather than a panic.
pub(crate) fn no_image_bytes() -> Result<Vec<u8>> {
    STANDARD.decode(NO_IMAGE_PNG_BASE64).map_err(|e| {
        Error::from(pixstore_core::Error::configuration(format!(
            "embedded placeholder is not valid base64: {e}"
        )))
    })
}

/// Resolve the configured placeholder to its descriptor and on-disk path,
/// materializing the file on first use.
///
/// # Errors
///
/// Returns [`Error::NoImageUnwritable`] when the placeholder is absent and
/// its target directory cannot be created or written.
pub(crate) fn ensure_no_image(
    store: &AssetStore,
    config: &StorageConfig,
) -> Result<(AssetDescriptor, PathBuf)> {
    let descriptor = AssetDescriptor::from_identifier(&config.no_image_identifier)?;
    let path = store.original_path(&config.no_image_identifier);

    if path.exists() {
        return Ok((descriptor, path));
    }

    let Some(dir) = path.parent() else {
        return Err(Error::no_image_unwritable(&path));
    };
    AssetStore::ensure_dir(dir);
    if !dir.is_dir() {
        return Err(Error::no_image_unwritable(dir));
    }

    debug!(path = %path.display(), "materializing no-image placeholder");
    let bytes = no_image_bytes()?;
    if descriptor.extension().eq_ignore_ascii_case("png") {
        AssetStore::write_content(&path, &bytes)
            .map_err(|_| Error::no_image_unwritable(dir))?;
    } else {
        // A non-PNG placeholder identifier gets the embedded image
        // transcoded to its extension.
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            pixstore_core::Error::configuration(format!("embedded placeholder is corrupt: {e}"))
        })?;
        decoded
            .to_rgb8()
            .save(&path)
            .map_err(|_| Error::no_image_unwritable(dir))?;
    }

    Ok((descriptor, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(root: &std::path::Path) -> StorageConfig {
        pixstore_core::StorageOptions {
            originals_path: Some(root.join("assets")),
            originals_url_dir: Some("assets".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    #[test]
    fn embedded_placeholder_is_a_real_png() {
        let bytes = no_image_bytes().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 90));
    }

    #[test]
    fn placeholder_is_materialized_on_first_use() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let store = AssetStore::new(&config.originals_path, &config.cache_path);

        let (descriptor, path) = ensure_no_image(&store, &config).unwrap();
        assert_eq!(descriptor.identifier(), "noimage/03/no-image.png");
        assert!(path.exists());

        // Second call reuses the existing file.
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();
        let (_, again) = ensure_no_image(&store, &config).unwrap();
        assert_eq!(again, path);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
    }
}
