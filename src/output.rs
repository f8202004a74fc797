//! Output types: what a conversion produced and where it landed.

use crate::pipeline::geometry::TargetGeometry;
use crate::request::ConversionMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The packaging decision for a conversion.
///
/// Word and slide conversions always yield `Single`. Image conversions yield
/// `Single` for one-page documents and `Archive` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputBundle {
    /// Exactly one file at `path`.
    Single { path: PathBuf },
    /// A zip archive at `path` holding `members` in page order.
    Archive { members: Vec<String>, path: PathBuf },
}

impl OutputBundle {
    /// Final on-disk location of the artifact.
    pub fn path(&self) -> &Path {
        match self {
            OutputBundle::Single { path } | OutputBundle::Archive { path, .. } => path,
        }
    }

    /// Archive entry names, empty for `Single`.
    pub fn members(&self) -> &[String] {
        match self {
            OutputBundle::Single { .. } => &[],
            OutputBundle::Archive { members, .. } => members,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, OutputBundle::Archive { .. })
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub mode: ConversionMode,
    /// The output path the caller asked for.
    pub requested_output: PathBuf,
    pub bundle: OutputBundle,
    /// Uniform slide size; only set for slide conversions.
    pub geometry: Option<TargetGeometry>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// `true` when the artifact landed somewhere other than the requested path.
    pub fn renamed(&self) -> bool {
        self.bundle.path() != self.requested_output
    }
}

/// Timing and size figures for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages rasterised and written.
    pub total_pages: usize,
    /// Files produced: 1, or the number of archive members.
    pub artifacts: usize,
    /// Size of the final artifact in bytes.
    pub output_bytes: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Page count and planned slide size of a PDF, without writing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub page_count: usize,
    /// Pixel size of each rendered page, in document order.
    pub page_sizes: Vec<(u32, u32)>,
    /// Slide size a `pdf-to-ppt` conversion would use.
    pub geometry: TargetGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(bundle: OutputBundle, requested: &str) -> ConversionOutput {
        ConversionOutput {
            mode: ConversionMode::PdfToImage,
            requested_output: PathBuf::from(requested),
            bundle,
            geometry: None,
            stats: ConversionStats::default(),
        }
    }

    #[test]
    fn renamed_only_when_paths_differ() {
        let same = output(
            OutputBundle::Archive {
                members: vec!["page_1.png".into(), "page_2.png".into()],
                path: PathBuf::from("out.png"),
            },
            "out.png",
        );
        assert!(!same.renamed());

        let moved = output(
            OutputBundle::Archive {
                members: vec!["page_1.png".into()],
                path: PathBuf::from("out.zip"),
            },
            "out.png",
        );
        assert!(moved.renamed());
    }

    #[test]
    fn single_has_no_members() {
        let b = OutputBundle::Single {
            path: PathBuf::from("a.png"),
        };
        assert!(b.members().is_empty());
        assert!(!b.is_archive());
    }

    #[test]
    fn bundle_json_is_tagged() {
        let b = OutputBundle::Archive {
            members: vec!["page_1.png".into()],
            path: PathBuf::from("out.zip"),
        };
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["kind"], "archive");
        assert_eq!(json["members"][0], "page_1.png");
    }
}
