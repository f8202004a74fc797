//! Error types for the pdfshift library.
//!
//! Every failure is fatal: a conversion either produces its final artifact
//! at the destination or nothing at all. There is no partial-success mode,
//! so a single enum, [`ConvertError`], covers the whole pipeline.
//!
//! Each variant belongs to exactly one pipeline [`Stage`]. The dispatcher
//! logs that stage when a conversion aborts and the CLI prints it next to
//! the message, so a user can tell a rasteriser problem from an archive
//! problem without reading a backtrace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Mode selection and request validation.
    Dispatch,
    /// Input file resolution.
    Input,
    /// PDF loading and page rasterisation.
    Rasterize,
    /// Target geometry planning.
    Plan,
    /// Per-page raster encoding.
    Encode,
    /// Slide deck or Word document assembly.
    Compose,
    /// Archive assembly for multi-page image output.
    Package,
    /// Moving the staged artifact to its final path.
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Dispatch => "dispatch",
            Stage::Input => "input",
            Stage::Rasterize => "rasterize",
            Stage::Plan => "plan",
            Stage::Encode => "encode",
            Stage::Compose => "compose",
            Stage::Package => "package",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// All errors returned by the pdfshift library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Dispatch errors ───────────────────────────────────────────────────
    /// The requested conversion mode is not one of the recognised literals.
    #[error("Unsupported conversion mode '{mode}'\nExpected one of: pdf-to-word, pdf-to-ppt, pdf-to-image")]
    UnsupportedMode { mode: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    /// The rasteriser produced no pages, so there is nothing to convert.
    #[error("Document has no pages to convert")]
    EmptyDocument,

    // ── Output errors ─────────────────────────────────────────────────────
    /// A page could not be encoded into the requested raster format.
    #[error("Raster encoding failed for page {page}: {detail}")]
    RasterEncodingFailed { page: usize, detail: String },

    /// The document writer rejected a page or failed to save.
    #[error("Composition failed{}: {detail}", at_page(.page))]
    CompositionFailed { page: Option<usize>, detail: String },

    /// The archive of page images could not be written.
    #[error("Failed to write archive '{path}': {detail}")]
    ArchiveWriteFailed { path: PathBuf, detail: String },

    /// The staged artifact could not be moved onto the destination path.
    #[error("Cannot place output at '{to}' (staged at '{from}'): {source}")]
    RenameCollision {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output or scratch file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Any other error surfaced by an external library call.
    #[error("{stage} stage failed: {cause}")]
    CollaboratorFailure { stage: Stage, cause: String },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn at_page(page: &Option<usize>) -> String {
    match page {
        Some(p) => format!(" at page {p}"),
        None => String::new(),
    }
}

impl ConvertError {
    /// Shorthand for [`ConvertError::CollaboratorFailure`].
    pub fn collaborator(stage: Stage, cause: impl fmt::Display) -> Self {
        ConvertError::CollaboratorFailure {
            stage,
            cause: cause.to_string(),
        }
    }

    /// Attribute a generic failure to the stage that was running.
    ///
    /// `Internal` and `OutputWriteFailed` say nothing about where they came
    /// from, so they become [`ConvertError::CollaboratorFailure`] for
    /// `stage`. Every other variant already names its own stage and is
    /// returned unchanged.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            ConvertError::Internal(cause) => ConvertError::CollaboratorFailure { stage, cause },
            e @ ConvertError::OutputWriteFailed { .. } if stage != Stage::Finalize => {
                ConvertError::collaborator(stage, e)
            }
            other => other,
        }
    }

    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ConvertError::UnsupportedMode { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => Stage::Dispatch,
            ConvertError::FileNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::NotAPdf { .. } => Stage::Input,
            ConvertError::CorruptPdf { .. }
            | ConvertError::PasswordRequired { .. }
            | ConvertError::WrongPassword { .. }
            | ConvertError::PageOutOfRange { .. }
            | ConvertError::RasterisationFailed { .. }
            | ConvertError::PdfiumBindingFailed(_) => Stage::Rasterize,
            ConvertError::EmptyDocument => Stage::Plan,
            ConvertError::RasterEncodingFailed { .. } => Stage::Encode,
            ConvertError::CompositionFailed { .. } => Stage::Compose,
            ConvertError::ArchiveWriteFailed { .. } => Stage::Package,
            ConvertError::RenameCollision { .. } | ConvertError::OutputWriteFailed { .. } => {
                Stage::Finalize
            }
            ConvertError::CollaboratorFailure { stage, .. } => *stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_mode_display() {
        let e = ConvertError::UnsupportedMode {
            mode: "pdf-to-excel".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pdf-to-excel"), "got: {msg}");
        assert!(msg.contains("pdf-to-ppt"));
        assert_eq!(e.stage(), Stage::Dispatch);
    }

    #[test]
    fn composition_failed_with_and_without_page() {
        let with_page = ConvertError::CompositionFailed {
            page: Some(3),
            detail: "bad image".into(),
        };
        assert!(with_page.to_string().contains("page 3"));

        let without = ConvertError::CompositionFailed {
            page: None,
            detail: "disk full".into(),
        };
        let msg = without.to_string();
        assert!(!msg.contains("page"), "got: {msg}");
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn collaborator_failure_keeps_stage() {
        let e = ConvertError::collaborator(Stage::Package, "zip exploded");
        assert_eq!(e.stage(), Stage::Package);
        assert_eq!(e.to_string(), "package stage failed: zip exploded");
    }

    #[test]
    fn rename_collision_is_finalize_stage() {
        let e = ConvertError::RenameCollision {
            from: "/tmp/a.zip".into(),
            to: "/out/a.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"),
        };
        assert_eq!(e.stage(), Stage::Finalize);
        assert!(e.to_string().contains("/out/a.png"));
    }

    #[test]
    fn in_stage_retags_generic_failures_only() {
        let internal = ConvertError::Internal("decoder crashed".into()).in_stage(Stage::Rasterize);
        assert_eq!(internal.stage(), Stage::Rasterize);
        assert!(internal.to_string().contains("decoder crashed"));

        let write = ConvertError::OutputWriteFailed {
            path: "/tmp/s/page_1.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let write = write.in_stage(Stage::Compose);
        assert_eq!(write.stage(), Stage::Compose);
        assert!(write.to_string().contains("page_1.png"));

        let encoding = ConvertError::RasterEncodingFailed {
            page: 2,
            detail: "bad".into(),
        };
        assert_eq!(encoding.in_stage(Stage::Package).stage(), Stage::Encode);
    }

    #[test]
    fn empty_document_belongs_to_planning() {
        assert_eq!(ConvertError::EmptyDocument.stage(), Stage::Plan);
    }
}
