//! Target geometry: translate rendered pixel sizes into office units.
//!
//! Office formats measure in English Metric Units (EMU, 914 400 per inch).
//! Rendered pages are treated as 96-dpi screen pixels, so one pixel is
//! 914 400 / 96 = 9525 EMU. Word page sizes use twips (1/1440 inch), which
//! is 635 EMU.
//!
//! A deck has one slide size. We take it from the first page only and apply
//! it to every slide; later pages with a different aspect ratio are
//! stretched to fit.

use crate::error::ConvertError;
use crate::pipeline::render::PageImage;
use serde::{Deserialize, Serialize};

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// EMU per rendered pixel at the 96-dpi convention.
pub const EMU_PER_PIXEL: i64 = EMU_PER_INCH / 96;

/// EMU per twip (1/1440 inch).
pub const EMU_PER_TWIP: i64 = EMU_PER_INCH / 1440;

/// Smallest slide side PresentationML accepts (1 inch).
pub const MIN_SLIDE_EMU: i64 = 914_400;

/// Largest slide side PresentationML accepts (56 inches).
pub const MAX_SLIDE_EMU: i64 = 51_206_400;

/// Uniform page/slide size for one composed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGeometry {
    pub width_emu: i64,
    pub height_emu: i64,
    /// Pixel size of the page the geometry was derived from.
    pub source_width_px: u32,
    pub source_height_px: u32,
}

impl TargetGeometry {
    /// Geometry for a page of `width` × `height` rendered pixels.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self {
            width_emu: width as i64 * EMU_PER_PIXEL,
            height_emu: height as i64 * EMU_PER_PIXEL,
            source_width_px: width,
            source_height_px: height,
        }
    }

    /// Whether both sides are within the slide sizes presentation readers
    /// accept. Out-of-range decks are still written as planned.
    pub fn is_valid_slide_size(&self) -> bool {
        let range = MIN_SLIDE_EMU..=MAX_SLIDE_EMU;
        range.contains(&self.width_emu) && range.contains(&self.height_emu)
    }

    pub fn width_twips(&self) -> u32 {
        (self.width_emu / EMU_PER_TWIP) as u32
    }

    pub fn height_twips(&self) -> u32 {
        (self.height_emu / EMU_PER_TWIP) as u32
    }

    pub fn width_inches(&self) -> f64 {
        self.width_emu as f64 / EMU_PER_INCH as f64
    }

    pub fn height_inches(&self) -> f64 {
        self.height_emu as f64 / EMU_PER_INCH as f64
    }
}

/// Plan the geometry shared by every page of the composed document.
///
/// Only the first page is consulted. Fails with
/// [`ConvertError::EmptyDocument`] when there are no pages.
pub fn plan(pages: &[PageImage]) -> Result<TargetGeometry, ConvertError> {
    let first = pages.first().ok_or(ConvertError::EmptyDocument)?;
    Ok(TargetGeometry::from_pixels(
        first.pixel_width(),
        first.pixel_height(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn page(index: usize, w: u32, h: u32) -> PageImage {
        PageImage::new(index, DynamicImage::ImageRgb8(RgbImage::new(w, h)))
    }

    #[test]
    fn pixel_factor_is_96_dpi() {
        assert_eq!(EMU_PER_PIXEL, 9525);
        assert_eq!(EMU_PER_TWIP, 635);
    }

    #[test]
    fn plan_uses_first_page_only() {
        let pages = vec![page(0, 960, 720), page(1, 720, 960), page(2, 100, 100)];
        let g = plan(&pages).unwrap();
        assert_eq!(g.width_emu, 960 * 9525);
        assert_eq!(g.height_emu, 720 * 9525);
        assert_eq!((g.source_width_px, g.source_height_px), (960, 720));
    }

    #[test]
    fn plan_of_nothing_is_empty_document() {
        assert!(matches!(plan(&[]), Err(ConvertError::EmptyDocument)));
    }

    #[test]
    fn slide_size_range() {
        // 40 px is under an inch; 5376 px is exactly 56 inches.
        assert!(!TargetGeometry::from_pixels(40, 300).is_valid_slide_size());
        assert!(TargetGeometry::from_pixels(96, 5376).is_valid_slide_size());
        assert!(!TargetGeometry::from_pixels(5377, 300).is_valid_slide_size());
        assert!(TargetGeometry::from_pixels(1280, 720).is_valid_slide_size());
    }

    #[test]
    fn unit_conversions() {
        // 96 px = 1 inch = 1440 twips
        let g = TargetGeometry::from_pixels(96, 192);
        assert_eq!(g.width_twips(), 1440);
        assert_eq!(g.height_twips(), 2880);
        assert!((g.width_inches() - 1.0).abs() < f64::EPSILON);
        assert!((g.height_inches() - 2.0).abs() < f64::EPSILON);
    }
}
