//! Archive creation for multi-page image output.
//!
//! [`Archiver`] opens an [`ArchiveSink`] at a path; pages are added one at a
//! time from scratch files so each file can be released right after it is
//! copied in. Entries keep insertion order.

use crate::error::ConvertError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Creates archives.
pub trait Archiver: Send + Sync {
    /// Start a new archive at `path`.
    fn create(&self, path: &Path) -> Result<Box<dyn ArchiveSink>, ConvertError>;
}

/// An archive being written.
pub trait ArchiveSink {
    /// Copy the file at `source` into the archive as entry `name`.
    fn add_member(&mut self, name: &str, source: &Path) -> Result<(), ConvertError>;

    /// Write the central directory and close the archive.
    fn finish(self: Box<Self>) -> Result<(), ConvertError>;
}

/// Zip archiver.
///
/// Entries carry a fixed 1980-01-01 timestamp so identical input yields a
/// byte-identical archive.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiver {
    compression: CompressionMethod,
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }

    /// Store entries uncompressed. Already-compressed formats (PNG, JPEG)
    /// gain almost nothing from deflate.
    pub fn stored() -> Self {
        Self {
            compression: CompressionMethod::Stored,
        }
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver for ZipArchiver {
    fn create(&self, path: &Path) -> Result<Box<dyn ArchiveSink>, ConvertError> {
        let file = File::create(path).map_err(|e| ConvertError::ArchiveWriteFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let options = SimpleFileOptions::default()
            .compression_method(self.compression)
            .last_modified_time(DateTime::default());

        Ok(Box::new(ZipSink {
            path: path.to_path_buf(),
            writer: ZipWriter::new(BufWriter::new(file)),
            options,
        }))
    }
}

struct ZipSink {
    path: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
}

impl ZipSink {
    fn failed(&self, detail: impl ToString) -> ConvertError {
        ConvertError::ArchiveWriteFailed {
            path: self.path.clone(),
            detail: detail.to_string(),
        }
    }
}

impl ArchiveSink for ZipSink {
    fn add_member(&mut self, name: &str, source: &Path) -> Result<(), ConvertError> {
        let bytes = std::fs::read(source).map_err(|e| self.failed(e))?;
        self.writer
            .start_file(name, self.options)
            .map_err(|e| self.failed(e))?;
        self.writer.write_all(&bytes).map_err(|e| self.failed(e))?;
        debug!("Archived {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), ConvertError> {
        let ZipSink { path, writer, .. } = *self;
        let mut inner = writer
            .finish()
            .map_err(|e| ConvertError::ArchiveWriteFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        inner.flush().map_err(|e| ConvertError::ArchiveWriteFailed {
            path,
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_keeps_member_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();

        let archive_path = dir.path().join("out.zip");
        let mut sink = ZipArchiver::new().create(&archive_path).unwrap();
        sink.add_member("page_2.png", &b).unwrap();
        sink.add_member("page_1.png", &a).unwrap();
        sink.finish().unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), "page_2.png");
        assert_eq!(zip.by_index(1).unwrap().name(), "page_1.png");
    }

    #[test]
    fn identical_input_gives_identical_archive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("p.bin");
        std::fs::write(&src, vec![7u8; 4096]).unwrap();

        let build = |name: &str| {
            let path = dir.path().join(name);
            let mut sink = ZipArchiver::stored().create(&path).unwrap();
            sink.add_member("page_1.png", &src).unwrap();
            sink.finish().unwrap();
            std::fs::read(path).unwrap()
        };
        assert_eq!(build("one.zip"), build("two.zip"));
    }

    #[test]
    fn missing_member_source_is_archive_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ZipArchiver::new().create(&dir.path().join("x.zip")).unwrap();
        let err = sink
            .add_member("page_1.png", &dir.path().join("missing.png"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::ArchiveWriteFailed { .. }));
    }

    #[test]
    fn create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZipArchiver::new()
            .create(&dir.path().join("nope/x.zip"))
            .err()
            .expect("should fail");
        assert!(matches!(err, ConvertError::ArchiveWriteFailed { .. }));
    }
}
