//! Scoped scratch space for per-page temporary files.
//!
//! Every conversion gets one [`ScratchDir`] created next to its output, so
//! staged artifacts can be renamed into place on the same filesystem. The
//! directory and everything in it is deleted when the `ScratchDir` drops,
//! on success, error, or panic.
//!
//! Per-page files are [`ScratchFile`] guards: the file is removed as soon as
//! the guard drops, so at most one page image sits on disk at a time.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Temporary directory owned by one conversion.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a hidden scratch directory inside `parent`.
    pub fn new_in(parent: &Path) -> Result<Self, ConvertError> {
        let dir = tempfile::Builder::new()
            .prefix(".pdfshift-")
            .tempdir_in(parent)
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        debug!("Scratch directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a scratch directory next to `output`, creating its parent
    /// directories first.
    pub fn for_output(output: &Path) -> Result<Self, ConvertError> {
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| ConvertError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;
        Self::new_in(&parent)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a staged artifact; nothing is created.
    pub fn staging_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bytes` to a file named `name` and return its guard.
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> Result<ScratchFile, ConvertError> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).map_err(|e| ConvertError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
        Ok(ScratchFile { path })
    }
}

/// A temporary file removed when the guard drops.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove scratch file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Move a staged artifact onto `dest`.
///
/// Both paths are on the same filesystem, so this is an atomic rename: the
/// destination either keeps its previous content or gets the whole artifact.
pub fn promote(staged: &Path, dest: &Path) -> Result<(), ConvertError> {
    if dest.is_dir() {
        return Err(ConvertError::RenameCollision {
            from: staged.to_path_buf(),
            to: dest.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination is a directory",
            ),
        });
    }
    std::fs::rename(staged, dest).map_err(|e| ConvertError::RenameCollision {
        from: staged.to_path_buf(),
        to: dest.to_path_buf(),
        source: e,
    })?;
    debug!("Placed {} → {}", staged.display(), dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new_in(root.path()).unwrap();
        let path = {
            let f = scratch.write_file("page_1.png", b"data").unwrap();
            assert!(f.path().exists());
            f.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let dir_path = {
            let scratch = ScratchDir::new_in(root.path()).unwrap();
            std::fs::write(scratch.staging_path("leftover"), b"x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!dir_path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn for_output_creates_missing_parents() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("nested/deeper/out.png");
        let scratch = ScratchDir::for_output(&out).unwrap();
        assert!(scratch.path().starts_with(root.path().join("nested/deeper")));
    }

    #[test]
    fn promote_renames_into_place() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new_in(root.path()).unwrap();
        let staged = scratch.staging_path("staged.bin");
        std::fs::write(&staged, b"payload").unwrap();
        let dest = root.path().join("final.bin");
        promote(&staged, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert!(!staged.exists());
    }

    #[test]
    fn promote_onto_directory_is_rename_collision() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new_in(root.path()).unwrap();
        let staged = scratch.staging_path("staged.bin");
        std::fs::write(&staged, b"payload").unwrap();
        let dest = root.path().join("taken");
        std::fs::create_dir(&dest).unwrap();
        let err = promote(&staged, &dest).unwrap_err();
        assert!(matches!(err, ConvertError::RenameCollision { .. }));
    }
}
