//! Document composition: slide decks and Word documents from page images.
//!
//! The writers are collaborators behind narrow traits so the conversion core
//! can be exercised with fakes:
//!
//! * [`SlideWriter`] opens a [`SlideDeck`] sized to a [`TargetGeometry`];
//!   pages are added one by one from scratch image files.
//! * [`WordWriter`] owns layout and pagination of a Word document entirely.
//!
//! [`compose_slides`] and [`compose_word`] drive them and stage the result
//! in scratch space; the caller moves it into place.

pub mod docx;
pub mod pptx;

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::encode::{encode_page, RasterFormat};
use crate::pipeline::geometry::TargetGeometry;
use crate::pipeline::render::PageImage;
use crate::pipeline::scratch::ScratchDir;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use docx::DocxWriter;
pub use pptx::PptxWriter;

/// Opens slide decks.
pub trait SlideWriter: Send + Sync {
    /// Start an empty deck whose slides all measure `geometry`.
    fn begin(&self, geometry: &TargetGeometry) -> Box<dyn SlideDeck>;
}

/// A slide deck under construction.
pub trait SlideDeck {
    /// Append one slide showing the image at `image`, stretched to fill it.
    ///
    /// The image file may be deleted as soon as this returns.
    fn add_slide(&mut self, page_index: usize, image: &Path) -> Result<(), ConvertError>;

    /// Serialise the deck to `path`.
    fn save(self: Box<Self>, path: &Path) -> Result<(), ConvertError>;
}

/// Writes a complete Word document for the given pages.
pub trait WordWriter: Send + Sync {
    fn write_document(&self, pages: &[PageImage], path: &Path) -> Result<(), ConvertError>;
}

/// Build a slide deck from `pages` in scratch space.
///
/// Returns the staged deck path.
pub fn compose_slides(
    pages: &[PageImage],
    geometry: &TargetGeometry,
    writer: &dyn SlideWriter,
    scratch: &ScratchDir,
    config: &ConversionConfig,
) -> Result<PathBuf, ConvertError> {
    let cb = config.progress_callback.as_ref();
    let total = pages.len();
    let mut deck = writer.begin(geometry);

    for page in pages {
        if let Some(cb) = cb {
            cb.on_page_start(page.page_num(), total);
        }

        let bytes = encode_page(&page.image, RasterFormat::Png).map_err(|e| {
            ConvertError::RasterEncodingFailed {
                page: page.page_num(),
                detail: e.to_string(),
            }
        })?;
        let slide_image = scratch.write_file(&format!("temp_slide_{}.png", page.index), &bytes)?;
        deck.add_slide(page.index, slide_image.path())?;
        drop(slide_image);
        debug!("Slide {} composed", page.page_num());

        if let Some(cb) = cb {
            cb.on_page_complete(page.page_num(), total, bytes.len());
        }
    }

    let staged = scratch.staging_path("deck.pptx");
    deck.save(&staged)?;
    info!(
        "Composed {} slides at {:.2}\" x {:.2}\"",
        total,
        geometry.width_inches(),
        geometry.height_inches()
    );
    Ok(staged)
}

/// Build a Word document from `pages` in scratch space.
///
/// Returns the staged document path.
///
/// The writer lays out all pages in one call, so per-page progress is
/// reported after it returns.
pub fn compose_word(
    pages: &[PageImage],
    writer: &dyn WordWriter,
    scratch: &ScratchDir,
    config: &ConversionConfig,
) -> Result<PathBuf, ConvertError> {
    if pages.is_empty() {
        return Err(ConvertError::EmptyDocument);
    }
    let staged = scratch.staging_path("document.docx");
    writer.write_document(pages, &staged)?;
    if let Some(cb) = config.progress_callback.as_ref() {
        for page in pages {
            cb.on_page_start(page.page_num(), pages.len());
            cb.on_page_complete(page.page_num(), pages.len(), 0);
        }
    }
    info!("Composed Word document with {} pages", pages.len());
    Ok(staged)
}
