//! Transform descriptors and the identifier codec
//!
//! An [`AssetDescriptor`] names a stored asset together with an optional
//! derived-variant request (size, crop, resize mode, quality). Its canonical
//! serialization — [`AssetDescriptor::identifier`] — is a relative path of
//! the shape
//!
//! ```text
//! namespace/prefix/base.WxH[cropXxYxWxH].flag.quality.ext
//! ```
//!
//! and doubles as the cache key: two descriptors with equal normalized
//! fields serialize byte-identically, so identical transform requests always
//! resolve to the identical cache path. [`AssetDescriptor::from_identifier`]
//! is the exact inverse for every value the encoder produces.
//!
//! Descriptors are immutable; construction goes through
//! [`AssetDescriptorBuilder`], which validates the invariants before the
//! value can be observed anywhere.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Resize mode. The numeric values form a bitmask so that `+`-joined tokens
/// combine with OR; the mapping is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    /// Scale to fit inside the target box, preserving aspect ratio
    Fit,
    /// Never scale up, only down
    ShrinkOnly,
    /// Ignore aspect ratio
    Stretch,
    /// Scale to completely cover the target box
    Fill,
    /// Cover the box, then trim to exactly the target dimensions
    Exact,
}

impl TransformMode {
    /// Bit value of this mode within a combined flag.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Fit => 0,
            Self::ShrinkOnly => 1,
            Self::Stretch => 2,
            Self::Fill => 4,
            Self::Exact => 8,
        }
    }

    /// The token used in identifiers and size specs.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::ShrinkOnly => "shrink_only",
            Self::Stretch => "stretch",
            Self::Fill => "fill",
            Self::Exact => "exact",
        }
    }

    /// Resolve a single mode token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTransformMode`] for anything else.
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "fit" => Ok(Self::Fit),
            "shrink_only" => Ok(Self::ShrinkOnly),
            "stretch" => Ok(Self::Stretch),
            "fill" => Ok(Self::Fill),
            "exact" => Ok(Self::Exact),
            other => Err(Error::unknown_transform_mode(other)),
        }
    }
}

/// Resolve a flag token — a single mode name or a `+`-joined combination —
/// to its bitmask value.
///
/// # Errors
///
/// Returns [`Error::UnknownTransformMode`] when any component token is not a
/// known mode.
pub fn flag_bits(flag: &str) -> Result<u8> {
    if flag.contains('+') {
        flag.split('+').try_fold(0u8, |bits, token| {
            Ok(bits | TransformMode::from_token(token)?.bits())
        })
    } else {
        TransformMode::from_token(flag).map(TransformMode::bits)
    }
}

/// A pre-resize crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge of the rectangle in source pixels
    pub x: u32,
    /// Top edge of the rectangle in source pixels
    pub y: u32,
    /// Rectangle width in source pixels
    pub width: u32,
    /// Rectangle height in source pixels
    pub height: u32,
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}x{}", self.x, self.y, self.width, self.height)
    }
}

#[allow(clippy::expect_used)]
static SIZE_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<w>\d+)?x(?<h>\d+)?(?:crop(?<cx>\d+)x(?<cy>\d+)x(?<cw>\d+)x(?<ch>\d+))?$")
        .expect("size-spec grammar is a valid regex")
});

/// A parsed compact size spec: `"{W}x{H}"`, optionally followed by
/// `"crop{X}x{Y}x{W}x{H}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    /// Target width, always positive
    pub width: u32,
    /// Target height, always positive
    pub height: u32,
    /// Optional pre-resize crop rectangle
    pub crop: Option<CropRect>,
}

impl SizeSpec {
    /// Parse a compact size spec.
    ///
    /// Width and height are both mandatory; the crop suffix is optional but
    /// all four crop numbers must appear together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeSpec`] when width or height is missing or zero,
    /// or the spec does not match the grammar at all.
    pub fn parse(spec: &str) -> Result<Self> {
        let captures = SIZE_SPEC_RE
            .captures(spec)
            .ok_or_else(|| Error::size_spec(spec))?;

        let dim = |name: &str| -> Option<u32> {
            captures.name(name).and_then(|m| m.as_str().parse().ok())
        };

        let (width, height) = match (dim("w"), dim("h")) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(Error::size_spec(spec)),
        };

        let crop = match (dim("cx"), dim("cy"), dim("cw"), dim("ch")) {
            (Some(x), Some(y), Some(w), Some(h)) => Some(CropRect {
                x,
                y,
                width: w,
                height: h,
            }),
            _ => None,
        };

        Ok(Self {
            width,
            height,
            crop,
        })
    }
}

// The suffix grammar of a stored file name. The transform block only
// parses when anchored by a size segment, so a sibling upload named
// `photo.2.jpg` never reads as `photo` at quality 2.
#[allow(clippy::expect_used)]
static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        (?<name>.+?)
        (?:
            \.(?<w>\d+)x(?<h>\d+)
            (?:crop(?<cx>\d+)x(?<cy>\d+)x(?<cw>\d+)x(?<ch>\d+))?
            (?:\.(?<flag>[a-z_]+(?:\+[a-z_]+)*))?
            (?:\.(?<q>\d+))?
        )?
        \.(?<ext>[^.]+)$",
    )
    .expect("file-name grammar is a valid regex")
});

/// Build the pattern that matches the original file and every derived
/// variant sharing `base_name`, whatever size/crop/flag/quality suffix is
/// attached and whatever the extension (including `webp`). Siblings created
/// by unique-name allocation (`base.2.ext`) do not match.
#[must_use]
#[allow(clippy::expect_used)]
pub fn match_pattern(base_name: &str) -> Regex {
    let escaped = regex::escape(base_name);
    Regex::new(&format!(
        r"^{escaped}(?:\.\d+x\d+(?:crop\d+x\d+x\d+x\d+)?(?:\.[a-z_]+(?:\+[a-z_]+)*)?(?:\.\d+)?)?\.[A-Za-z0-9]+$"
    ))
    .expect("escaped base name keeps the pattern a valid regex")
}

/// An immutable description of a stored asset, optionally carrying a
/// derived-variant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    namespace: String,
    hash_prefix: String,
    base_name: String,
    extension: String,
    size: Option<(u32, u32)>,
    crop: Option<CropRect>,
    flag: Option<String>,
    quality: Option<u8>,
}

impl AssetDescriptor {
    /// Start building a descriptor from scratch.
    #[must_use]
    pub fn builder() -> AssetDescriptorBuilder {
        AssetDescriptorBuilder::default()
    }

    /// Rebuild this descriptor with changed fields.
    #[must_use]
    pub fn to_builder(&self) -> AssetDescriptorBuilder {
        AssetDescriptorBuilder {
            namespace: self.namespace.clone(),
            hash_prefix: self.hash_prefix.clone(),
            base_name: self.base_name.clone(),
            extension: self.extension.clone(),
            size: self.size,
            crop: self.crop,
            flag: self.flag.clone(),
            quality: self.quality,
        }
    }

    /// Parse a full identifier of the shape `namespace/prefix/file`.
    ///
    /// Optional transform segments in the file name are recovered when
    /// present and well formed; a malformed transform block is treated as
    /// part of the base name, so the value reads as an original.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] when the path has fewer than
    /// three segments, the shard prefix is not exactly two characters, or
    /// the file name carries no extension.
    pub fn from_identifier(identifier: &str) -> Result<Self> {
        let trimmed = identifier.strip_prefix('/').unwrap_or(identifier);
        let mut segments = trimmed.rsplitn(3, '/');
        let (Some(file), Some(prefix), Some(namespace)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(Error::malformed_identifier(identifier));
        };
        if prefix.chars().count() != 2 {
            return Err(Error::malformed_identifier(identifier));
        }

        let mut descriptor = Self::parse_file_name(file)
            .ok_or_else(|| Error::malformed_identifier(identifier))?;
        descriptor.namespace = namespace.to_string();
        descriptor.hash_prefix = prefix.to_string();
        Ok(descriptor)
    }

    /// Parse a bare file name with no namespace or prefix.
    ///
    /// Used for delete-by-name: the resulting descriptor matches on file
    /// name only, within whatever directory the caller supplies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] when the name carries no
    /// extension.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::parse_file_name(name).ok_or_else(|| Error::malformed_identifier(name))
    }

    // Parse `base[.WxH[crop..]][.flag][.q].ext`, falling back to the
    // original interpretation when the transform block is out of range.
    fn parse_file_name(file: &str) -> Option<Self> {
        let captures = FILE_NAME_RE.captures(file)?;
        let extension = captures.name("ext")?.as_str().to_string();

        let parsed = Self::parse_transform_block(&captures);
        let descriptor = match parsed {
            Some((size, crop, flag, quality)) => Self {
                namespace: String::new(),
                hash_prefix: String::new(),
                base_name: captures.name("name")?.as_str().to_string(),
                extension,
                size,
                crop,
                flag,
                quality,
            },
            // Out-of-range numbers: the whole transform block belongs to
            // the base name.
            None => {
                let stem = file.strip_suffix(&format!(".{extension}"))?;
                Self {
                    namespace: String::new(),
                    hash_prefix: String::new(),
                    base_name: stem.to_string(),
                    extension,
                    size: None,
                    crop: None,
                    flag: None,
                    quality: None,
                }
            }
        };
        Some(descriptor)
    }

    #[allow(clippy::type_complexity)]
    fn parse_transform_block(
        captures: &regex::Captures<'_>,
    ) -> Option<(
        Option<(u32, u32)>,
        Option<CropRect>,
        Option<String>,
        Option<u8>,
    )> {
        let num = |name: &str| captures.name(name).map(|m| m.as_str().parse::<u32>());

        let size = match (num("w"), num("h")) {
            (None, None) => None,
            (Some(Ok(w)), Some(Ok(h))) if w > 0 && h > 0 => Some((w, h)),
            _ => return None,
        };
        let crop = match (num("cx"), num("cy"), num("cw"), num("ch")) {
            (None, None, None, None) => None,
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(w)), Some(Ok(h))) => Some(CropRect {
                x,
                y,
                width: w,
                height: h,
            }),
            _ => return None,
        };
        let flag = captures.name("flag").map(|m| m.as_str().to_string());
        let quality = match captures.name("q") {
            None => None,
            Some(m) => match m.as_str().parse::<u8>() {
                Ok(q) if q <= 100 => Some(q),
                _ => return None,
            },
        };
        Some((size, crop, flag, quality))
    }

    /// Logical bucket of the asset.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Two-character checksum shard.
    #[must_use]
    pub fn hash_prefix(&self) -> &str {
        &self.hash_prefix
    }

    /// Sanitized file stem.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// File extension, without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Target dimensions of the derived variant, if any.
    #[must_use]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Pre-resize crop rectangle, if any.
    #[must_use]
    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    /// Resize-mode token, if any.
    #[must_use]
    pub fn flag(&self) -> Option<&str> {
        self.flag.as_deref()
    }

    /// Encode quality, if any.
    #[must_use]
    pub fn quality(&self) -> Option<u8> {
        self.quality
    }

    /// Whether a crop rectangle was requested.
    #[must_use]
    pub fn has_crop(&self) -> bool {
        self.crop.is_some()
    }

    /// The canonical file name, transform segments included.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file_name_with_extension(&self.extension)
    }

    fn file_name_with_extension(&self, extension: &str) -> String {
        let mut out = self.base_name.clone();
        if let Some((w, h)) = self.size {
            out.push_str(&format!(".{w}x{h}"));
            if let Some(crop) = &self.crop {
                out.push_str(&format!("crop{crop}"));
            }
            if let Some(flag) = &self.flag {
                out.push('.');
                out.push_str(flag);
            }
            if let Some(quality) = self.quality {
                out.push_str(&format!(".{quality}"));
            }
        }
        out.push('.');
        out.push_str(extension);
        out
    }

    /// The file name of the source asset, transform segments stripped.
    #[must_use]
    pub fn original_file_name(&self) -> String {
        format!("{}.{}", self.base_name, self.extension)
    }

    fn join_path(&self, file: String) -> String {
        let mut out = String::new();
        for segment in [self.namespace.as_str(), self.hash_prefix.as_str()] {
            if !segment.is_empty() {
                out.push_str(segment);
                out.push('/');
            }
        }
        out.push_str(&file);
        out
    }

    /// Canonical serialization — the cache key.
    ///
    /// Segments are emitted in the fixed order
    /// `namespace/prefix/base.WxH[cropXxYxWxH].flag.quality.ext`, each one
    /// omitted when its field is unset, so equal descriptors always yield
    /// byte-equal identifiers.
    #[must_use]
    pub fn identifier(&self) -> String {
        self.join_path(self.file_name())
    }

    /// Identifier of the source asset this descriptor was derived from.
    #[must_use]
    pub fn original_identifier(&self) -> String {
        self.join_path(self.original_file_name())
    }

    /// Identifier of the WebP sibling: same stem, trailing extension
    /// replaced by `webp`.
    #[must_use]
    pub fn webp_identifier(&self) -> String {
        self.join_path(self.file_name_with_extension("webp"))
    }

    /// Pattern matching the original file and all derived variants of this
    /// descriptor's base name. See [`match_pattern`].
    #[must_use]
    pub fn sibling_pattern(&self) -> Regex {
        match_pattern(&self.base_name)
    }

    /// Friendly-URL query form: the original path plus the transform
    /// parameters as a query string, re-derived from the descriptor rather
    /// than the raw cache identifier.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut out = self.original_identifier();
        if let Some((w, h)) = self.size {
            out.push_str(&format!("?size={w}x{h}"));
            if let Some(crop) = &self.crop {
                out.push_str(&format!("&crop={crop}"));
            }
            if let Some(flag) = &self.flag {
                out.push_str(&format!("&flag={flag}"));
            }
            if let Some(quality) = self.quality {
                out.push_str(&format!("&quality={quality}"));
            }
        }
        out
    }
}

/// Builder for [`AssetDescriptor`]. Consuming setters; [`build`] validates
/// every invariant, so no partially-configured descriptor is ever observed.
///
/// [`build`]: AssetDescriptorBuilder::build
#[derive(Debug, Clone, Default)]
pub struct AssetDescriptorBuilder {
    namespace: String,
    hash_prefix: String,
    base_name: String,
    extension: String,
    size: Option<(u32, u32)>,
    crop: Option<CropRect>,
    flag: Option<String>,
    quality: Option<u8>,
}

impl AssetDescriptorBuilder {
    /// Set the logical bucket.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the two-character checksum shard.
    #[must_use]
    pub fn hash_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hash_prefix = prefix.into();
        self
    }

    /// Set the sanitized file stem.
    #[must_use]
    pub fn base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Set the extension (no leading dot).
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the target dimensions.
    #[must_use]
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Set the pre-resize crop rectangle.
    #[must_use]
    pub fn crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Apply a parsed size spec: dimensions plus optional crop in one call.
    #[must_use]
    pub fn transform(mut self, spec: SizeSpec) -> Self {
        self.size = Some((spec.width, spec.height));
        self.crop = spec.crop;
        self
    }

    /// Set the resize-mode token.
    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Set the encode quality.
    #[must_use]
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Validate and produce the immutable descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when an invariant is violated:
    /// empty base name or extension, a dot inside the extension, a shard
    /// prefix that is not exactly two characters, a zero dimension, or
    /// crop/flag/quality without a size.
    pub fn build(self) -> Result<AssetDescriptor> {
        if self.base_name.is_empty() || self.base_name.contains('/') {
            return Err(Error::configuration(format!(
                "invalid base name `{}`",
                self.base_name
            )));
        }
        if self.extension.is_empty() || self.extension.contains('.') {
            return Err(Error::configuration(format!(
                "invalid extension `{}`",
                self.extension
            )));
        }
        if !self.hash_prefix.is_empty() && self.hash_prefix.chars().count() != 2 {
            return Err(Error::configuration(format!(
                "hash prefix must be exactly 2 characters, got `{}`",
                self.hash_prefix
            )));
        }
        if let Some((w, h)) = self.size
            && (w == 0 || h == 0)
        {
            return Err(Error::configuration("size dimensions must be positive"));
        }
        if self.size.is_none() && (self.crop.is_some() || self.flag.is_some() || self.quality.is_some())
        {
            return Err(Error::configuration(
                "crop, flag and quality require a size",
            ));
        }
        if let Some(q) = self.quality
            && q > 100
        {
            return Err(Error::configuration(format!(
                "quality must be 0-100, got {q}"
            )));
        }

        Ok(AssetDescriptor {
            namespace: self.namespace,
            hash_prefix: self.hash_prefix,
            base_name: self.base_name,
            extension: self.extension,
            size: self.size,
            crop: self.crop,
            flag: self.flag,
            quality: self.quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived() -> AssetDescriptor {
        AssetDescriptor::builder()
            .namespace("products")
            .hash_prefix("9f")
            .base_name("red-shoe")
            .extension("jpg")
            .size(800, 600)
            .crop(CropRect {
                x: 10,
                y: 20,
                width: 300,
                height: 400,
            })
            .flag("fill+stretch")
            .quality(85)
            .build()
            .unwrap()
    }

    #[test]
    fn identifier_serializes_in_canonical_order() {
        assert_eq!(
            derived().identifier(),
            "products/9f/red-shoe.800x600crop10x20x300x400.fill+stretch.85.jpg"
        );
    }

    #[test]
    fn identifier_round_trips() {
        let descriptor = derived();
        let parsed = AssetDescriptor::from_identifier(&descriptor.identifier()).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn original_round_trips() {
        let parsed = AssetDescriptor::from_identifier("gallery/ab/sunset.png").unwrap();
        assert_eq!(parsed.base_name(), "sunset");
        assert_eq!(parsed.extension(), "png");
        assert!(parsed.size().is_none());
        assert_eq!(parsed.identifier(), "gallery/ab/sunset.png");
    }

    #[test]
    fn namespace_may_contain_slashes() {
        let parsed =
            AssetDescriptor::from_identifier("shop/products/ab/item.100x100.fit.85.gif").unwrap();
        assert_eq!(parsed.namespace(), "shop/products");
        assert_eq!(parsed.hash_prefix(), "ab");
        assert_eq!(
            parsed.identifier(),
            "shop/products/ab/item.100x100.fit.85.gif"
        );
    }

    #[test]
    fn leading_slash_is_stripped() {
        let parsed = AssetDescriptor::from_identifier("/gallery/ab/sunset.png").unwrap();
        assert_eq!(parsed.identifier(), "gallery/ab/sunset.png");
    }

    #[test]
    fn unique_name_sibling_is_not_a_variant() {
        // `photo.2.jpg` comes from unique-name allocation; the `.2` must not
        // read as an encode quality.
        let parsed = AssetDescriptor::from_identifier("gallery/ab/photo.2.jpg").unwrap();
        assert_eq!(parsed.base_name(), "photo.2");
        assert!(parsed.quality().is_none());
        assert_eq!(parsed.identifier(), "gallery/ab/photo.2.jpg");
    }

    #[test]
    fn dotted_base_survives_derivation() {
        let descriptor = AssetDescriptor::builder()
            .namespace("gallery")
            .hash_prefix("ab")
            .base_name("photo.2")
            .extension("jpg")
            .size(64, 64)
            .flag("fit")
            .quality(70)
            .build()
            .unwrap();
        let parsed = AssetDescriptor::from_identifier(&descriptor.identifier()).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn zero_size_reads_as_original() {
        let parsed = AssetDescriptor::from_identifier("ns/ab/pic.0x100.png").unwrap();
        assert!(parsed.size().is_none());
        assert_eq!(parsed.base_name(), "pic.0x100");
    }

    #[test]
    fn malformed_identifiers_are_rejected() {
        assert!(AssetDescriptor::from_identifier("bare.png").is_err());
        assert!(AssetDescriptor::from_identifier("ns/toolong/file.png").is_err());
        assert!(AssetDescriptor::from_identifier("ns/ab/noextension").is_err());
    }

    #[test]
    fn from_name_leaves_location_empty() {
        let parsed = AssetDescriptor::from_name("banner.300x100.fit.85.png").unwrap();
        assert_eq!(parsed.namespace(), "");
        assert_eq!(parsed.hash_prefix(), "");
        assert_eq!(parsed.base_name(), "banner");
        assert_eq!(parsed.size(), Some((300, 100)));
        assert_eq!(parsed.identifier(), "banner.300x100.fit.85.png");
    }

    #[test]
    fn webp_identifier_replaces_trailing_extension() {
        assert_eq!(
            derived().webp_identifier(),
            "products/9f/red-shoe.800x600crop10x20x300x400.fill+stretch.85.webp"
        );
    }

    #[test]
    fn original_identifier_strips_transform_segments() {
        assert_eq!(derived().original_identifier(), "products/9f/red-shoe.jpg");
    }

    #[test]
    fn query_form_carries_transform_parameters() {
        assert_eq!(
            derived().to_query(),
            "products/9f/red-shoe.jpg?size=800x600&crop=10x20x300x400&flag=fill+stretch&quality=85"
        );
        let original = AssetDescriptor::from_identifier("gallery/ab/sunset.png").unwrap();
        assert_eq!(original.to_query(), "gallery/ab/sunset.png");
    }

    #[test]
    fn size_spec_parses_dimensions_and_crop() {
        let spec = SizeSpec::parse("800x600crop10x20x300x400").unwrap();
        assert_eq!((spec.width, spec.height), (800, 600));
        assert_eq!(
            spec.crop,
            Some(CropRect {
                x: 10,
                y: 20,
                width: 300,
                height: 400
            })
        );
        let plain = SizeSpec::parse("800x600").unwrap();
        assert!(plain.crop.is_none());
    }

    #[test]
    fn size_spec_requires_both_dimensions() {
        assert!(matches!(
            SizeSpec::parse("x100"),
            Err(Error::SizeSpec { .. })
        ));
        assert!(matches!(
            SizeSpec::parse("100x"),
            Err(Error::SizeSpec { .. })
        ));
        assert!(matches!(
            SizeSpec::parse("0x100"),
            Err(Error::SizeSpec { .. })
        ));
        assert!(matches!(
            SizeSpec::parse("garbage"),
            Err(Error::SizeSpec { .. })
        ));
    }

    #[test]
    fn flag_bits_compose_with_or() {
        assert_eq!(flag_bits("fit").unwrap(), 0);
        assert_eq!(flag_bits("fill+stretch").unwrap(), 6);
        assert_eq!(flag_bits("shrink_only+exact").unwrap(), 9);
        assert!(matches!(
            flag_bits("zoom"),
            Err(Error::UnknownTransformMode { .. })
        ));
        assert!(matches!(
            flag_bits("fill+zoom"),
            Err(Error::UnknownTransformMode { .. })
        ));
    }

    #[test]
    fn match_pattern_covers_variants_but_not_siblings() {
        let pattern = match_pattern("red-shoe");
        assert!(pattern.is_match("red-shoe.jpg"));
        assert!(pattern.is_match("red-shoe.800x600.fit.85.jpg"));
        assert!(pattern.is_match("red-shoe.800x600crop10x20x300x400.fill+stretch.85.webp"));
        assert!(pattern.is_match("red-shoe.800x600.85.jpg"));
        assert!(!pattern.is_match("red-shoe.2.jpg"));
        assert!(!pattern.is_match("blue-shoe.jpg"));
        assert!(!pattern.is_match("red-shoes.jpg"));
    }

    #[test]
    fn builder_rejects_invariant_violations() {
        let base = || {
            AssetDescriptor::builder()
                .namespace("ns")
                .hash_prefix("ab")
                .base_name("pic")
                .extension("png")
        };
        assert!(base().extension("").build().is_err());
        assert!(base().extension("tar.gz").build().is_err());
        assert!(base().hash_prefix("abc").build().is_err());
        assert!(base().size(0, 100).build().is_err());
        assert!(base().quality(50).build().is_err()); // quality without size
        assert!(base().size(10, 10).quality(101).build().is_err());
        assert!(base().build().is_ok());
    }
}
