//! Word (`.docx`) writer built on `docx-rs`.
//!
//! The page size comes from the first page in twips, margins are zero, and
//! every page image becomes one inline picture in its own paragraph, with a
//! page break before each page after the first. Later pages whose aspect
//! ratio differs are scaled to fit inside the page, not stretched.

use super::WordWriter;
use crate::error::ConvertError;
use crate::pipeline::encode::{encode_page, RasterFormat};
use crate::pipeline::geometry::{self, TargetGeometry};
use crate::pipeline::render::PageImage;
use docx_rs::{BreakType, Docx, PageMargin, Paragraph, Pic, Run};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Writes `.docx` documents with one picture per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl WordWriter for DocxWriter {
    fn write_document(&self, pages: &[PageImage], path: &Path) -> Result<(), ConvertError> {
        let page_geometry = geometry::plan(pages)?;

        let mut docx = Docx::new()
            .page_size(page_geometry.width_twips(), page_geometry.height_twips())
            .page_margin(
                PageMargin::new()
                    .top(0)
                    .bottom(0)
                    .left(0)
                    .right(0)
                    .header(0)
                    .footer(0)
                    .gutter(0),
            );

        for (i, page) in pages.iter().enumerate() {
            let png = encode_page(&page.image, RasterFormat::Png).map_err(|e| {
                ConvertError::RasterEncodingFailed {
                    page: page.page_num(),
                    detail: e.to_string(),
                }
            })?;
            let (cx, cy) = fit_extent(page, &page_geometry);
            let pic = Pic::new(&png).size(cx, cy);

            let mut run = Run::new();
            if i > 0 {
                run = run.add_break(BreakType::Page);
            }
            docx = docx.add_paragraph(Paragraph::new().add_run(run.add_image(pic)));
            debug!("Placed page {} at {}x{} EMU", page.page_num(), cx, cy);
        }

        let file = File::create(path).map_err(|e| ConvertError::CompositionFailed {
            page: None,
            detail: format!("cannot create {}: {}", path.display(), e),
        })?;
        docx.build()
            .pack(file)
            .map_err(|e| ConvertError::CompositionFailed {
                page: None,
                detail: e.to_string(),
            })?;
        Ok(())
    }
}

/// Largest extent with the page's aspect ratio that fits the document page.
fn fit_extent(page: &PageImage, target: &TargetGeometry) -> (u32, u32) {
    let (w, h) = (page.pixel_width().max(1) as f64, page.pixel_height().max(1) as f64);
    let (tw, th) = (target.width_emu as f64, target.height_emu as f64);
    let scale = (tw / w).min(th / h);
    ((w * scale).round() as u32, (h * scale).round() as u32)
}
