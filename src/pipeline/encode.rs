//! Image encoding: `DynamicImage` → bytes in a chosen raster format.
//!
//! The format of an image output is implied by the extension of the path it
//! is written to. Anything we do not recognise (no extension, `.zip`, …)
//! falls back to PNG, which is lossless and keeps rendered text crisp.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Raster formats an image conversion can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl RasterFormat {
    /// Format for a file extension (case-insensitive), if it is a raster one.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(RasterFormat::Png),
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg),
            "bmp" => Some(RasterFormat::Bmp),
            "tif" | "tiff" => Some(RasterFormat::Tiff),
            _ => None,
        }
    }

    /// Format implied by `path`'s extension, if it is a raster one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Format implied by `path`, PNG when the extension is not a raster one.
    pub fn for_output(path: &Path) -> Self {
        Self::from_path(path).unwrap_or(RasterFormat::Png)
    }

    /// Canonical extension used for generated file names.
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Bmp => "bmp",
            RasterFormat::Tiff => "tiff",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            RasterFormat::Png => ImageFormat::Png,
            RasterFormat::Jpeg => ImageFormat::Jpeg,
            RasterFormat::Bmp => ImageFormat::Bmp,
            RasterFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Encode a rasterised page into `format`.
///
/// JPEG has no alpha channel, so pages are flattened to RGB first.
pub fn encode_page(img: &DynamicImage, format: RasterFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format.image_format())?,
        _ => img.write_to(&mut Cursor::new(&mut buf), format.image_format())?,
    }

    debug!("Encoded image → {} bytes {:?}", buf.len(), format);
    Ok(buf)
}
