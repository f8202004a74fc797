//! Pipeline stages shared by all conversion modes.
//!
//! Each submodule implements one step; the dispatcher in
//! [`crate::convert`] strings them together per mode.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ geometry ──▶ compose (word / slides)
//! (%PDF)   (pdfium)   (EMU plan)  └▶ package (images: single | archive)
//! ```
//!
//! 1. [`input`]: validate the source path and its `%PDF` header
//! 2. [`render`]: rasterise selected pages; pdfium is blocking, so the
//!    async entry point runs the whole pipeline in `spawn_blocking`
//! 3. [`geometry`]: slide/page size from the first page
//! 4. [`encode`]: per-page PNG/JPEG/BMP/TIFF bytes
//! 5. [`package`]: one image, or a zip via [`archive`]
//!
//! [`scratch`] provides the temporary directory every stage stages into.

pub mod archive;
pub mod encode;
pub mod geometry;
pub mod input;
pub mod package;
pub mod render;
pub mod scratch;
