//! Input resolution: validate the caller's source path before pdfium sees it.
//!
//! pdfium reports a missing file, an unreadable file and a non-PDF file with
//! the same opaque load error, so we check these ourselves and fail with a
//! precise [`ConvertError`] instead.

use crate::error::ConvertError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Resolve `input` to a readable local PDF file.
///
/// Checks that the path exists, is a regular file, can be opened for
/// reading, and starts with `%PDF`. Files shorter than four bytes are
/// rejected as [`ConvertError::NotAPdf`].
pub fn resolve_input(input: &Path) -> Result<PathBuf, ConvertError> {
    let path = input.to_path_buf();

    if !path.is_file() {
        return Err(ConvertError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied { path });
        }
        Err(_) => return Err(ConvertError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(ConvertError::PermissionDenied { path });
            }
            Err(e) => {
                return Err(ConvertError::CollaboratorFailure {
                    stage: crate::error::Stage::Input,
                    cause: format!("cannot read {}: {}", path.display(), e),
                })
            }
        }
    }
    if &magic != PDF_MAGIC {
        return Err(ConvertError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
