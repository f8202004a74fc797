//! Output packaging for image conversions.
//!
//! A one-page document becomes one image at the requested path. Anything
//! longer becomes a zip of `page_{n}.{ext}` entries, because a single raster
//! file cannot hold several pages.
//!
//! ## Extension reconciliation
//!
//! The archive's canonical name is the requested path with its extension
//! replaced by `zip`. Under [`ExtensionPolicy::KeepRequested`] a request for
//! a raster name (`out.png`) gets the archive moved onto exactly that name,
//! so callers that only know one output path still find the result there,
//! with zip content under a `.png` extension. [`ExtensionPolicy::ForceArchive`]
//! keeps the `.zip` name instead.
//!
//! Every page and the archive itself are written into scratch space first
//! and only renamed into place once complete.

use crate::config::{ConversionConfig, ExtensionPolicy};
use crate::error::ConvertError;
use crate::output::OutputBundle;
use crate::pipeline::archive::Archiver;
use crate::pipeline::encode::{encode_page, RasterFormat};
use crate::pipeline::render::PageImage;
use crate::pipeline::scratch::{promote, ScratchDir};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Entry name for a page inside the archive.
pub fn member_name(page_num: usize, format: RasterFormat) -> String {
    format!("page_{}.{}", page_num, format.extension())
}

/// Canonical archive path for a requested output: same stem, `.zip`.
pub fn archive_path_for(output: &Path) -> PathBuf {
    output.with_extension("zip")
}

/// Where the archive finally lands under `policy`.
pub fn reconcile_archive_path(output: &Path, policy: ExtensionPolicy) -> PathBuf {
    match policy {
        ExtensionPolicy::KeepRequested if RasterFormat::from_path(output).is_some() => {
            output.to_path_buf()
        }
        _ => archive_path_for(output),
    }
}

/// Package rasterised pages into image output at `output`.
pub fn package_images(
    pages: &[PageImage],
    output: &Path,
    archiver: &dyn Archiver,
    scratch: &ScratchDir,
    config: &ConversionConfig,
) -> Result<OutputBundle, ConvertError> {
    let format = RasterFormat::for_output(output);
    match pages {
        [] => Err(ConvertError::EmptyDocument),
        [page] => write_single(page, output, format, scratch, config),
        _ => write_archive(pages, output, format, archiver, scratch, config),
    }
}

fn write_single(
    page: &PageImage,
    output: &Path,
    format: RasterFormat,
    scratch: &ScratchDir,
    config: &ConversionConfig,
) -> Result<OutputBundle, ConvertError> {
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_page_start(page.page_num(), 1);
    }

    let bytes = encode(page, format)?;
    let staged = scratch.write_file(&member_name(page.page_num(), format), &bytes)?;
    promote(staged.path(), output)?;

    if let Some(cb) = cb {
        cb.on_page_complete(page.page_num(), 1, bytes.len());
    }
    info!("Wrote single image {} ({:?})", output.display(), format);

    Ok(OutputBundle::Single {
        path: output.to_path_buf(),
    })
}

fn write_archive(
    pages: &[PageImage],
    output: &Path,
    format: RasterFormat,
    archiver: &dyn Archiver,
    scratch: &ScratchDir,
    config: &ConversionConfig,
) -> Result<OutputBundle, ConvertError> {
    let cb = config.progress_callback.as_ref();
    let total = pages.len();
    let final_path = reconcile_archive_path(output, config.extension_policy);
    let staged_archive = scratch.staging_path("pages.zip");

    let mut sink = archiver.create(&staged_archive)?;
    let mut members = Vec::with_capacity(total);

    for page in pages {
        if let Some(cb) = cb {
            cb.on_page_start(page.page_num(), total);
        }

        let name = member_name(page.page_num(), format);
        let bytes = encode(page, format)?;
        // Dropped at the end of this iteration, removing the file.
        let member = scratch.write_file(&name, &bytes)?;
        sink.add_member(&name, member.path())?;
        debug!("Packed {}", name);

        if let Some(cb) = cb {
            cb.on_page_complete(page.page_num(), total, bytes.len());
        }
        members.push(name);
    }

    sink.finish()?;
    promote(&staged_archive, &final_path)?;

    if final_path != output {
        info!(
            "Archive of {} pages written to {} instead of {}",
            total,
            final_path.display(),
            output.display()
        );
    } else {
        info!("Archive of {} pages written to {}", total, final_path.display());
    }

    Ok(OutputBundle::Archive {
        members,
        path: final_path,
    })
}

fn encode(page: &PageImage, format: RasterFormat) -> Result<Vec<u8>, ConvertError> {
    encode_page(&page.image, format).map_err(|e| ConvertError::RasterEncodingFailed {
        page: page.page_num(),
        detail: e.to_string(),
    })
}
