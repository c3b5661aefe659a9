//! Image-processing capability
//!
//! The resolver only needs decode → crop → resize → sharpen → encode, so
//! that is the whole seam: implement [`ImageProcessor`] to swap the backend.
//! The default backend is the `image` crate. WebP output is attempted with
//! its lossless encoder; backends without WebP support report
//! [`ImagingError::Unsupported`], which callers treat as "skip the WebP
//! sibling", never as a failure.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use pixstore_core::CropRect;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Bit values of the resize modes, matching
/// [`pixstore_core::TransformMode::bits`].
const SHRINK_ONLY: u8 = 1;
const STRETCH: u8 = 2;
const FILL: u8 = 4;
const EXACT: u8 = 8;

/// Errors reported by an imaging backend.
#[derive(Error, Debug)]
pub enum ImagingError {
    /// The source bytes could not be decoded as an image
    #[error("cannot decode {path}: {message}")]
    Decode {
        /// Path of the undecodable file
        path: String,
        /// Backend diagnostic
        message: String,
    },

    /// The backend cannot produce the requested output format
    #[error("unsupported by the imaging backend: {what}")]
    Unsupported {
        /// What was requested
        what: String,
    },

    /// Encoding or writing the output failed
    #[error("cannot encode {path}: {message}")]
    Encode {
        /// Path of the output file
        path: String,
        /// Backend diagnostic
        message: String,
    },
}

/// A decoded image that can be transformed and re-encoded.
pub trait Raster {
    /// Crop to a rectangle, clamped to the image bounds.
    fn crop(&mut self, rect: CropRect);

    /// Resize to the target box under the given mode bitmask.
    fn resize(&mut self, width: u32, height: u32, mode_bits: u8);

    /// Apply a mild sharpening pass.
    fn sharpen(&mut self);

    /// Encode to `path` in the format implied by its extension.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::Encode`] when the file cannot be written or
    /// the format rejects the image.
    fn encode(&self, path: &Path, quality: u8) -> Result<(), ImagingError>;

    /// Encode a WebP rendition to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::Unsupported`] when the backend has no WebP
    /// encoder, [`ImagingError::Encode`] on write failures.
    fn encode_webp(&self, path: &Path, quality: u8) -> Result<(), ImagingError>;
}

/// The image-processing capability: decodes files into [`Raster`]s.
pub trait ImageProcessor {
    /// The raster type this backend produces.
    type Raster: Raster;

    /// Decode the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::Decode`] when the bytes are not a supported
    /// image format.
    fn decode(&self, path: &Path) -> Result<Self::Raster, ImagingError>;
}

/// Default backend over the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelBackend;

impl PixelBackend {
    /// Create the default backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ImageProcessor for PixelBackend {
    type Raster = PixelRaster;

    fn decode(&self, path: &Path) -> Result<PixelRaster, ImagingError> {
        let image = image::open(path).map_err(|e| ImagingError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(PixelRaster { image })
    }
}

/// A decoded image held by [`PixelBackend`].
pub struct PixelRaster {
    image: DynamicImage,
}

impl PixelRaster {
    /// Wrap an already-decoded image, mainly for tests and placeholder
    /// generation.
    #[must_use]
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Current dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

impl Raster for PixelRaster {
    fn crop(&mut self, rect: CropRect) {
        let (width, height) = self.dimensions();
        if rect.x >= width || rect.y >= height {
            return;
        }
        let w = rect.width.min(width - rect.x);
        let h = rect.height.min(height - rect.y);
        if w == 0 || h == 0 {
            return;
        }
        self.image = self.image.crop_imm(rect.x, rect.y, w, h);
    }

    fn resize(&mut self, width: u32, height: u32, mode_bits: u8) {
        let (source_w, source_h) = self.dimensions();
        let shrink_only = mode_bits & SHRINK_ONLY != 0;
        let stretch = mode_bits & STRETCH != 0;
        let exact = mode_bits & EXACT != 0;
        let fill = exact || mode_bits & FILL != 0;

        let (target_w, target_h) = if stretch {
            let w = if shrink_only { width.min(source_w) } else { width };
            let h = if shrink_only { height.min(source_h) } else { height };
            (w, h)
        } else {
            let rx = f64::from(width) / f64::from(source_w);
            let ry = f64::from(height) / f64::from(source_h);
            let mut ratio = if fill { rx.max(ry) } else { rx.min(ry) };
            if shrink_only {
                ratio = ratio.min(1.0);
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let scaled = |dim: u32| ((f64::from(dim) * ratio).round() as u32).max(1);
            (scaled(source_w), scaled(source_h))
        };

        if (target_w, target_h) != (source_w, source_h) {
            self.image = self
                .image
                .resize_exact(target_w, target_h, FilterType::Lanczos3);
        }

        if exact {
            // Trim the covered box to exactly the requested dimensions,
            // centered; a shrink-only scale may leave less than the box.
            let crop_w = width.min(target_w);
            let crop_h = height.min(target_h);
            let x = (target_w - crop_w) / 2;
            let y = (target_h - crop_h) / 2;
            if (crop_w, crop_h) != (target_w, target_h) {
                self.image = self.image.crop_imm(x, y, crop_w, crop_h);
            }
        }
    }

    fn sharpen(&mut self) {
        // 3x3 sharpening kernel, normalized to sum 1.
        let kernel = [
            -1.0 / 16.0,
            -1.0 / 16.0,
            -1.0 / 16.0,
            -1.0 / 16.0,
            24.0 / 16.0,
            -1.0 / 16.0,
            -1.0 / 16.0,
            -1.0 / 16.0,
            -1.0 / 16.0,
        ];
        self.image = self.image.filter3x3(&kernel);
    }

    fn encode(&self, path: &Path, quality: u8) -> Result<(), ImagingError> {
        let encode_error = |message: String| ImagingError::Encode {
            path: path.display().to_string(),
            message,
        };

        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Jpeg) => {
                let file = File::create(path).map_err(|e| encode_error(e.to_string()))?;
                let mut writer = BufWriter::new(file);
                let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.max(1));
                // JPEG carries no alpha channel.
                encoder
                    .encode_image(&self.image.to_rgb8())
                    .map_err(|e| encode_error(e.to_string()))
            }
            _ => self.image.save(path).map_err(|e| match e {
                ImageError::Unsupported(inner) => ImagingError::Unsupported {
                    what: inner.to_string(),
                },
                other => encode_error(other.to_string()),
            }),
        }
    }

    fn encode_webp(&self, path: &Path, _quality: u8) -> Result<(), ImagingError> {
        let encode_error = |message: String| ImagingError::Encode {
            path: path.display().to_string(),
            message,
        };

        let file = File::create(path).map_err(|e| encode_error(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let encoder = WebPEncoder::new_lossless(&mut writer);
        let rgba = self.image.to_rgba8();
        encoder
            .encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| match e {
                ImageError::Unsupported(inner) => ImagingError::Unsupported {
                    what: inner.to_string(),
                },
                other => encode_error(other.to_string()),
            })
    }
}
