//! Result records for store and resolve operations

use pixstore_core::AssetDescriptor;
use std::fmt;
use std::path::{Path, PathBuf};

/// A concrete stored file, reachable at `{root_dir}/{identifier}` for URL
/// purposes and `{root_path}/{identifier}` on the filesystem.
///
/// The same type serves originals and cache results; only the roots passed
/// at construction differ. Every store/resolve operation returns a fresh,
/// independent value — records are never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    identifier: String,
    root_dir: String,
    root_path: PathBuf,
    friendly_url: bool,
    checksum: Option<String>,
    display_name: Option<String>,
    descriptor: Option<AssetDescriptor>,
}

impl AssetRecord {
    /// Create a record rooted at the given URL and filesystem bases.
    ///
    /// A single leading slash on the identifier is stripped so identifiers
    /// always join cleanly onto their roots.
    #[must_use]
    pub fn new(
        friendly_url: bool,
        root_dir: impl Into<String>,
        root_path: impl Into<PathBuf>,
        identifier: impl Into<String>,
    ) -> Self {
        let identifier = identifier.into();
        let identifier = match identifier.strip_prefix('/') {
            Some(stripped) => stripped.to_string(),
            None => identifier,
        };
        Self {
            identifier,
            root_dir: root_dir.into(),
            root_path: root_path.into(),
            friendly_url,
            checksum: None,
            display_name: None,
            descriptor: None,
        }
    }

    /// Sentinel record carrying a human-readable message instead of a real
    /// location; returned when a source cannot be found or decoded so that
    /// template rendering never breaks on a missing asset.
    #[must_use]
    pub fn sentinel(message: impl Into<String>) -> Self {
        Self::new(false, "#", "#", message)
    }

    /// Attach the checksum of the stored content.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Attach the sanitized display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attach the descriptor this derived variant was resolved from.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: AssetDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Relative identifier, never with a leading slash.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// URL base this record is rooted at.
    #[must_use]
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Filesystem base this record is rooted at.
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Checksum of the stored content, when known.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Sanitized display name, when known.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The descriptor of a derived variant, when this record represents one.
    #[must_use]
    pub fn descriptor(&self) -> Option<&AssetDescriptor> {
        self.descriptor.as_ref()
    }

    /// Absolute filesystem path of the file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.root_path.join(&self.identifier)
    }

    /// Descriptor for this record: the attached one, or parsed fresh from
    /// the identifier.
    #[must_use]
    pub fn descriptor_or_parsed(&self) -> Option<AssetDescriptor> {
        self.descriptor
            .clone()
            .or_else(|| AssetDescriptor::from_identifier(&self.identifier).ok())
    }

    /// Public URL of the file.
    ///
    /// With friendly URLs enabled the link is re-derived from the
    /// descriptor as a query over the original path, hiding raw cache file
    /// names; otherwise it is simply `{root_dir}/{identifier}`.
    #[must_use]
    pub fn link(&self) -> String {
        if self.friendly_url
            && let Some(descriptor) = self.descriptor_or_parsed()
        {
            return format!("{}/{}", self.root_dir, descriptor.to_query());
        }
        format!("{}/{}", self.root_dir, self.identifier)
    }

    /// The friendly query form of the attached descriptor.
    ///
    /// `None` when this record carries no descriptor and its identifier
    /// does not parse as one.
    #[must_use]
    pub fn query(&self) -> Option<String> {
        self.descriptor_or_parsed().map(|d| d.to_query())
    }
}

impl fmt::Display for AssetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slash_is_stripped() {
        let record = AssetRecord::new(false, "assets", "/srv/assets", "/ns/ab/pic.png");
        assert_eq!(record.identifier(), "ns/ab/pic.png");
        assert_eq!(record.path(), PathBuf::from("/srv/assets/ns/ab/pic.png"));
        assert_eq!(record.link(), "assets/ns/ab/pic.png");
    }

    #[test]
    fn friendly_link_uses_the_query_form() {
        let descriptor =
            AssetDescriptor::from_identifier("ns/ab/pic.100x100.fit.85.png").unwrap();
        let record = AssetRecord::new(
            true,
            "assets_cache",
            "/srv/assets_cache",
            "ns/ab/pic.100x100.fit.85.png",
        )
        .with_descriptor(descriptor);
        assert_eq!(
            record.link(),
            "assets_cache/ns/ab/pic.png?size=100x100&flag=fit&quality=85"
        );
    }

    #[test]
    fn sentinel_points_nowhere() {
        let record = AssetRecord::sentinel("Can not find image");
        assert_eq!(record.identifier(), "Can not find image");
        assert_eq!(record.root_dir(), "#");
    }
}
