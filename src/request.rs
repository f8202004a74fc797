//! Conversion requests: which target to produce, from which PDF, to where.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The three recognised conversion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionMode {
    /// Word document (`.docx`).
    #[serde(rename = "pdf-to-word")]
    PdfToWord,
    /// Slide deck (`.pptx`), one slide per page.
    #[serde(rename = "pdf-to-ppt")]
    PdfToSlides,
    /// One raster image, or an archive of images for multi-page documents.
    #[serde(rename = "pdf-to-image")]
    PdfToImage,
}

impl ConversionMode {
    /// All modes, in CLI help order.
    pub const ALL: [ConversionMode; 3] = [
        ConversionMode::PdfToWord,
        ConversionMode::PdfToSlides,
        ConversionMode::PdfToImage,
    ];

    /// The literal accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::PdfToWord => "pdf-to-word",
            ConversionMode::PdfToSlides => "pdf-to-ppt",
            ConversionMode::PdfToImage => "pdf-to-image",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConversionMode::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ConvertError::UnsupportedMode {
                mode: s.to_string(),
            })
    }
}

/// One conversion: a mode, a source PDF and the caller's requested output path.
///
/// Immutable once built; the dispatcher borrows it for the whole call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    mode: ConversionMode,
    input: PathBuf,
    output: PathBuf,
}

impl ConversionRequest {
    pub fn new(
        mode: ConversionMode,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode,
            input: input.into(),
            output: output.into(),
        }
    }

    /// Build a request from a raw mode literal.
    ///
    /// Fails with [`ConvertError::UnsupportedMode`] for anything other than
    /// `pdf-to-word`, `pdf-to-ppt` or `pdf-to-image`.
    pub fn parse(
        mode: &str,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(mode.parse()?, input, output))
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}
