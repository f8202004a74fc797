//! Conversion entry points and the mode dispatcher.
//!
//! [`Converter`] owns the configuration and the four collaborators
//! (rasteriser, slide writer, Word writer, archiver) and runs one request at
//! a time through the pipeline:
//!
//! ```text
//! request ─▶ input ─▶ rasterize ─▶ ┬─ pdf-to-word  ─▶ compose_word   ─┐
//!                                  ├─ pdf-to-ppt   ─▶ plan + slides  ─┼─▶ promote
//!                                  └─ pdf-to-image ─▶ package_images ─┘
//! ```
//!
//! Everything is blocking. [`convert`] moves the work onto tokio's blocking
//! pool because pdfium must not run on an async worker thread.

use crate::compose::{self, DocxWriter, PptxWriter, SlideWriter, WordWriter};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, Stage};
use crate::output::{ConversionOutput, ConversionStats, DocumentSummary, OutputBundle};
use crate::pipeline::archive::{Archiver, ZipArchiver};
use crate::pipeline::geometry::{self, TargetGeometry};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::scratch::{promote, ScratchDir};
use crate::pipeline::{input, package};
use crate::request::{ConversionMode, ConversionRequest};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs conversion requests against a fixed set of collaborators.
///
/// # Example
/// ```rust,no_run
/// use pdfshift::{ConversionConfig, Converter};
///
/// let converter = Converter::new(ConversionConfig::default());
/// let output = converter.dispatch("pdf-to-image", "report.pdf", "report.png")?;
/// println!("wrote {}", output.bundle.path().display());
/// # Ok::<(), pdfshift::ConvertError>(())
/// ```
#[derive(Clone)]
pub struct Converter {
    config: ConversionConfig,
    rasterizer: Arc<dyn Rasterizer>,
    slide_writer: Arc<dyn SlideWriter>,
    word_writer: Arc<dyn WordWriter>,
    archiver: Arc<dyn Archiver>,
}

impl Converter {
    /// A converter with the production collaborators: pdfium, `.pptx`,
    /// `.docx` and zip.
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            rasterizer: Arc::new(PdfiumRasterizer::new(&config)),
            slide_writer: Arc::new(PptxWriter),
            word_writer: Arc::new(DocxWriter),
            archiver: Arc::new(ZipArchiver::new()),
            config,
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_slide_writer(mut self, writer: Arc<dyn SlideWriter>) -> Self {
        self.slide_writer = writer;
        self
    }

    pub fn with_word_writer(mut self, writer: Arc<dyn WordWriter>) -> Self {
        self.word_writer = writer;
        self
    }

    pub fn with_archiver(mut self, archiver: Arc<dyn Archiver>) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Parse `mode` and run the conversion.
    ///
    /// An unrecognised mode fails with [`ConvertError::UnsupportedMode`]
    /// before any collaborator is touched.
    pub fn dispatch(
        &self,
        mode: &str,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<ConversionOutput, ConvertError> {
        let request = ConversionRequest::parse(
            mode,
            input.as_ref().to_path_buf(),
            output.as_ref().to_path_buf(),
        )
        .inspect_err(|e| error!(stage = %e.stage(), "Conversion rejected: {}", e))?;
        self.convert(&request)
    }

    /// Run one conversion to completion.
    ///
    /// On failure nothing is left at the destination and the error names
    /// the stage it came from (see [`ConvertError::stage`]).
    pub fn convert(&self, request: &ConversionRequest) -> Result<ConversionOutput, ConvertError> {
        self.run(request).inspect_err(|e| {
            error!(
                stage = %e.stage(),
                mode = %request.mode(),
                "Conversion of {} failed: {}",
                request.input().display(),
                e
            )
        })
    }

    /// Async wrapper running [`Converter::convert`] on the blocking pool.
    pub async fn convert_async(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutput, ConvertError> {
        let converter = self.clone();
        tokio::task::spawn_blocking(move || converter.convert(&request))
            .await
            .map_err(|e| ConvertError::Internal(format!("conversion task failed: {e}")))?
    }

    fn run(&self, request: &ConversionRequest) -> Result<ConversionOutput, ConvertError> {
        let total_start = Instant::now();
        let mode = request.mode();
        let output = request.output();
        info!(
            "Starting {} conversion: {} → {}",
            mode,
            request.input().display(),
            output.display()
        );

        // ── Step 1: Resolve input ────────────────────────────────────────
        let pdf_path = input::resolve_input(request.input())?;

        // ── Step 2: Rasterise ────────────────────────────────────────────
        let render_start = Instant::now();
        let pages = self
            .rasterizer
            .rasterize(&pdf_path)
            .map_err(|e| e.in_stage(Stage::Rasterize))?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        if pages.is_empty() {
            return Err(ConvertError::EmptyDocument);
        }
        info!("Rasterised {} pages in {}ms", pages.len(), render_duration_ms);

        if let Some(cb) = self.config.progress_callback.as_ref() {
            cb.on_conversion_start(mode, pages.len());
        }

        // ── Step 3: Per-mode stage, staged in scratch space ──────────────
        let scratch =
            ScratchDir::for_output(output).map_err(|e| e.in_stage(Stage::Finalize))?;
        let (bundle, slide_geometry) = match mode {
            ConversionMode::PdfToWord => {
                let staged = compose::compose_word(
                    &pages,
                    self.word_writer.as_ref(),
                    &scratch,
                    &self.config,
                )
                .map_err(|e| e.in_stage(Stage::Compose))?;
                promote(&staged, output)?;
                (single(output), None)
            }
            ConversionMode::PdfToSlides => {
                let target: TargetGeometry =
                    geometry::plan(&pages).map_err(|e| e.in_stage(Stage::Plan))?;
                debug!(
                    "Slide size {}x{} EMU from page 1 ({}x{} px)",
                    target.width_emu,
                    target.height_emu,
                    target.source_width_px,
                    target.source_height_px
                );
                if !target.is_valid_slide_size() {
                    warn!(
                        "Slide size {:.2}\" x {:.2}\" is outside the 1\"-56\" range \
                         presentation readers accept",
                        target.width_inches(),
                        target.height_inches()
                    );
                }
                let staged = compose::compose_slides(
                    &pages,
                    &target,
                    self.slide_writer.as_ref(),
                    &scratch,
                    &self.config,
                )
                .map_err(|e| e.in_stage(Stage::Compose))?;
                promote(&staged, output)?;
                (single(output), Some(target))
            }
            ConversionMode::PdfToImage => (
                package::package_images(
                    &pages,
                    output,
                    self.archiver.as_ref(),
                    &scratch,
                    &self.config,
                )
                .map_err(|e| e.in_stage(Stage::Package))?,
                None,
            ),
        };
        drop(scratch);

        // ── Step 4: Stats ────────────────────────────────────────────────
        let output_bytes = artifact_size(bundle.path());
        let stats = ConversionStats {
            total_pages: pages.len(),
            artifacts: bundle.members().len().max(1),
            output_bytes,
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        if let Some(cb) = self.config.progress_callback.as_ref() {
            cb.on_conversion_complete(&bundle);
        }
        info!(
            "Conversion complete: {} pages → {} ({} bytes, {}ms)",
            stats.total_pages,
            bundle.path().display(),
            stats.output_bytes,
            stats.total_duration_ms
        );

        Ok(ConversionOutput {
            mode,
            requested_output: output.to_path_buf(),
            bundle,
            geometry: slide_geometry,
            stats,
        })
    }
}

/// Size of the promoted artifact.
///
/// The artifact is already in place, so a failed stat only loses the stat.
fn artifact_size(path: &Path) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!("Cannot stat {}: {}", path.display(), e);
            0
        }
    }
}

fn single(path: &Path) -> OutputBundle {
    OutputBundle::Single {
        path: path.to_path_buf(),
    }
}

/// Convert `request` with the production collaborators.
///
/// This is the primary async entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use pdfshift::{convert, ConversionConfig, ConversionMode, ConversionRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = ConversionRequest::new(ConversionMode::PdfToSlides, "talk.pdf", "talk.pptx");
/// let output = convert(request, &ConversionConfig::default()).await?;
/// eprintln!("{} slides", output.stats.total_pages);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    request: ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    Converter::new(config.clone()).convert_async(request).await
}

/// Blocking variant of [`convert`]; needs no runtime.
pub fn convert_sync(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    Converter::new(config.clone()).convert(request)
}

/// Page count and planned slide size of a PDF, without converting it.
///
/// Sizes are what a default-DPI conversion would render.
pub async fn inspect(
    source: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentSummary, ConvertError> {
    let source = source.as_ref().to_path_buf();
    let mut builder = ConversionConfig::builder();
    if let Some(pwd) = password {
        builder = builder.password(pwd);
    }
    let config = builder.build()?;

    tokio::task::spawn_blocking(move || {
        let pdf_path = input::resolve_input(&source)?;
        let page_sizes = PdfiumRasterizer::new(&config).measure(&pdf_path)?;
        summarize(page_sizes)
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("inspect task failed: {e}")))?
}

fn summarize(page_sizes: Vec<(u32, u32)>) -> Result<DocumentSummary, ConvertError> {
    let &(w, h) = page_sizes.first().ok_or(ConvertError::EmptyDocument)?;
    Ok(DocumentSummary {
        page_count: page_sizes.len(),
        geometry: TargetGeometry::from_pixels(w, h),
        page_sizes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::PageImage;
    use image::{DynamicImage, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRasterizer {
        calls: AtomicUsize,
        pages: usize,
    }

    impl Rasterizer for CountingRasterizer {
        fn rasterize(&self, _: &Path) -> Result<Vec<PageImage>, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.pages)
                .map(|i| PageImage::new(i, DynamicImage::ImageRgb8(RgbImage::new(12, 9))))
                .collect())
        }
    }

    fn pdf_in(dir: &Path) -> std::path::PathBuf {
        let pdf = dir.join("in.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        pdf
    }

    #[test]
    fn unknown_mode_never_reaches_rasterizer() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Arc::new(CountingRasterizer {
            calls: AtomicUsize::new(0),
            pages: 1,
        });
        let converter =
            Converter::new(ConversionConfig::default()).with_rasterizer(rasterizer.clone());

        let err = converter
            .dispatch("pdf-to-excel", pdf_in(dir.path()), dir.path().join("out.xlsx"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedMode { .. }));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_input_fails_before_rasterizing() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Arc::new(CountingRasterizer {
            calls: AtomicUsize::new(0),
            pages: 1,
        });
        let converter =
            Converter::new(ConversionConfig::default()).with_rasterizer(rasterizer.clone());
        let err = converter
            .dispatch("pdf-to-image", dir.path().join("missing.pdf"), dir.path().join("o.png"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn image_stats_count_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(ConversionConfig::default()).with_rasterizer(Arc::new(
            CountingRasterizer {
                calls: AtomicUsize::new(0),
                pages: 4,
            },
        ));
        let out = converter
            .dispatch("pdf-to-image", pdf_in(dir.path()), dir.path().join("o.png"))
            .unwrap();
        assert_eq!(out.stats.total_pages, 4);
        assert_eq!(out.stats.artifacts, 4);
        assert!(out.stats.output_bytes > 0);
        assert!(out.geometry.is_none());
    }

    #[test]
    fn unreadable_artifact_size_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.bin");
        std::fs::write(&present, b"12345").unwrap();
        assert_eq!(artifact_size(&present), 5);
        assert_eq!(artifact_size(&dir.path().join("gone.bin")), 0);
    }

    #[test]
    fn summarize_uses_first_page() {
        let summary = summarize(vec![(96, 48), (10, 10)]).unwrap();
        assert_eq!(summary.page_count, 2);
        assert_eq!(summary.geometry.width_emu, 96 * 9525);
        assert!(matches!(summarize(vec![]), Err(ConvertError::EmptyDocument)));
    }
}
