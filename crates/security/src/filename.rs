//! Filename validation — the workspace sandbox invariant.
//!
//! File tools accept bare filenames, never paths. Anything containing a
//! path separator or a parent reference is rejected *before* the
//! filesystem is touched, so nothing can be created or read outside the
//! designated workspace root.

use std::path::{Path, PathBuf};

/// Error returned when filename validation fails.
#[derive(Debug, thiserror::Error)]
pub enum FilenameError {
    #[error("Invalid filename '{name}': path separators are not allowed")]
    ContainsSeparator { name: String },

    #[error("Invalid filename '{name}': parent references are not allowed")]
    ParentReference { name: String },

    #[error("Invalid filename: empty")]
    Empty,
}

/// Validate that a filename is a plain name with no path components.
///
/// Rejects:
/// - empty or whitespace-only names
/// - `/` or `\` anywhere in the name
/// - any `..` sequence (parent reference)
pub fn validate_filename(filename: &str) -> Result<(), FilenameError> {
    if filename.trim().is_empty() {
        return Err(FilenameError::Empty);
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(FilenameError::ContainsSeparator {
            name: filename.into(),
        });
    }
    if filename.contains("..") {
        return Err(FilenameError::ParentReference {
            name: filename.into(),
        });
    }
    Ok(())
}

/// Validate a filename and join it onto the workspace root.
pub fn safe_join(workspace: &Path, filename: &str) -> Result<PathBuf, FilenameError> {
    validate_filename(filename)?;
    Ok(workspace.join(filename))
}
