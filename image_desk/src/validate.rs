use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Returns `true` if `path` is non-empty and names an existing
/// filesystem entry right now.
///
/// The answer can go stale before the path is used; the operation's
/// own failure is what counts.
pub fn validate(path: &str) -> bool {
    !path.is_empty() && Path::new(path).exists()
}

/// Checked form of [`validate`].
///
/// # Errors
///
/// Returns `AppError::InvalidPath` if `path` is empty or missing.
pub fn require_existing(path: &str) -> Result<PathBuf, AppError> {
    if validate(path) {
        Ok(PathBuf::from(path))
    } else {
        Err(AppError::InvalidPath {
            path: PathBuf::from(path),
        })
    }
}
