//! PDF rasterisation: render selected pages to [`PageImage`]s.
//!
//! The [`Rasterizer`] trait is the seam between the conversion core and the
//! PDF engine. [`PdfiumRasterizer`] is the production implementation; tests
//! inject fakes that return canned pages.
//!
//! ## Binding order
//!
//! pdfium is a shared library loaded at runtime. We try, in order:
//! `PDFIUM_LIB_PATH`, a library in the working directory, then the system
//! library search path.

use crate::config::{ConversionConfig, PageSelection};
use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// One rasterised page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based ordinal of the page in the source document.
    pub index: usize,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    /// 1-based page number, as shown to users and used in file names.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }

    pub fn pixel_width(&self) -> u32 {
        self.image.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.image.height()
    }
}

/// Produces the ordered page images of a source document.
///
/// Implementations must return pages in document order.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, source: &Path) -> Result<Vec<PageImage>, ConvertError>;
}

/// Renders pages through pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    dpi: u32,
    max_pixels: u32,
    password: Option<String>,
    pages: PageSelection,
}

impl PdfiumRasterizer {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
            pages: config.pages.clone(),
        }
    }

    fn render_config(&self) -> PdfRenderConfig {
        // PDF user space is 72 units per inch.
        PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32)
    }
}

impl PdfiumRasterizer {
    fn open<'a>(
        &'a self,
        pdfium: &'a Pdfium,
        source: &Path,
    ) -> Result<PdfDocument<'a>, ConvertError> {
        pdfium
            .load_pdf_from_file(source, self.password.as_deref())
            .map_err(|e| load_error(source, self.password.is_some(), e))
    }

    /// Pixel size each page would render at, without rendering.
    ///
    /// Ignores the page selection: every page of the document is measured.
    pub fn measure(&self, source: &Path) -> Result<Vec<(u32, u32)>, ConvertError> {
        let pdfium = bind_pdfium()?;
        let document = self.open(&pdfium, source)?;
        let sizes = document
            .pages()
            .iter()
            .map(|page| self.scaled_size(page.width().value, page.height().value))
            .collect();
        Ok(sizes)
    }

    /// Points to pixels at our DPI, capped at `max_pixels` on the long side.
    fn scaled_size(&self, width_pt: f32, height_pt: f32) -> (u32, u32) {
        let scale = self.dpi as f32 / 72.0;
        let (mut w, mut h) = (width_pt * scale, height_pt * scale);
        let longest = w.max(h);
        if longest > self.max_pixels as f32 {
            let shrink = self.max_pixels as f32 / longest;
            w *= shrink;
            h *= shrink;
        }
        (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, source: &Path) -> Result<Vec<PageImage>, ConvertError> {
        let pdfium = bind_pdfium()?;
        let document = self.open(&pdfium, source)?;

        let total_pages = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let selected = self.pages.to_indices(total_pages);
        if selected.is_empty() && total_pages > 0 {
            return Err(ConvertError::PageOutOfRange {
                page: self.pages.first_requested(),
                total: total_pages,
            });
        }

        let render_config = self.render_config();
        let mut results = Vec::with_capacity(selected.len());

        for (idx, page) in document.pages().iter().enumerate() {
            if selected.binary_search(&idx).is_err() {
                continue;
            }

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ConvertError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );

            results.push(PageImage::new(idx, image));
        }

        if results.len() < selected.len() {
            warn!(
                "Rendered {} of {} selected pages",
                results.len(),
                selected.len()
            );
        }

        Ok(results)
    }
}

/// Bind to the pdfium shared library.
fn bind_pdfium() -> Result<Pdfium, ConvertError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

/// Classify a pdfium load failure.
fn load_error(path: &Path, had_password: bool, e: PdfiumError) -> ConvertError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            ConvertError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ConvertError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn page_image_reports_dimensions_and_number() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 40, Rgba([0, 0, 0, 255])));
        let page = PageImage::new(2, img);
        assert_eq!(page.page_num(), 3);
        assert_eq!(page.pixel_width(), 30);
        assert_eq!(page.pixel_height(), 40);
    }

    #[test]
    fn rasterizer_copies_config() {
        let config = ConversionConfig::builder()
            .dpi(150)
            .password("pw")
            .pages(PageSelection::Single(2))
            .build()
            .unwrap();
        let r = PdfiumRasterizer::new(&config);
        assert_eq!(r.dpi, 150);
        assert_eq!(r.password.as_deref(), Some("pw"));
        assert_eq!(r.pages.to_indices(3), vec![1]);
    }

    #[test]
    fn scaled_size_follows_dpi_and_cap() {
        let config = ConversionConfig::builder()
            .dpi(144)
            .max_rendered_pixels(1000)
            .build()
            .unwrap();
        let r = PdfiumRasterizer::new(&config);
        // US Letter at 144 dpi: 1224 x 1584, capped to 1000 on the long side.
        assert_eq!(r.scaled_size(612.0, 792.0), (773, 1000));
        assert_eq!(r.scaled_size(72.0, 36.0), (144, 72));
    }
}
