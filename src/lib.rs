//! # pdfshift
//!
//! Convert PDF documents into Word documents, slide decks, or page images.
//!
//! Every mode works from rasterised pages: each PDF page is rendered to a
//! bitmap by pdfium, then placed as a full-page picture in a `.docx`, as a
//! full-bleed picture on its own `.pptx` slide, or written out as an image.
//! Text is not reconstructed; the output looks like the PDF, it does not
//! edit like one.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     check the path and the %PDF header
//!  ├─ 2. Render    rasterise pages via pdfium (blocking)
//!  ├─ 3. Plan      slide/page size from page 1 (9525 EMU per pixel)
//!  ├─ 4. Compose   .docx / .pptx, or
//!  │   Package     one image, or a zip of page_{n}.{ext}
//!  └─ 5. Finalize  rename the staged artifact onto the output path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfshift::{convert, ConversionConfig, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConversionRequest::parse("pdf-to-image", "report.pdf", "report.png")?;
//!     let output = convert(request, &ConversionConfig::default()).await?;
//!     // A multi-page report lands as a zip of page_1.png, page_2.png, …
//!     println!("{:?}", output.bundle);
//!     Ok(())
//! }
//! ```
//!
//! ## Multi-page image output
//!
//! A raster file holds one page, so multi-page image conversions produce a
//! zip archive. By default it is written to exactly the requested path even
//! when that path ends in `.png`; set
//! [`ExtensionPolicy::ForceArchive`] to get `report.zip` instead and check
//! [`ConversionOutput::renamed`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfshift` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfshift = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compose;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compose::{DocxWriter, PptxWriter, SlideDeck, SlideWriter, WordWriter};
pub use config::{ConversionConfig, ConversionConfigBuilder, ExtensionPolicy, PageSelection};
pub use convert::{convert, convert_sync, inspect, Converter};
pub use error::{ConvertError, Stage};
pub use output::{ConversionOutput, ConversionStats, DocumentSummary, OutputBundle};
pub use pipeline::archive::{ArchiveSink, Archiver, ZipArchiver};
pub use pipeline::geometry::TargetGeometry;
pub use pipeline::render::{PageImage, PdfiumRasterizer, Rasterizer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{ConversionMode, ConversionRequest};
