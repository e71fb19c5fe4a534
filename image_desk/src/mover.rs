use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{AppError, OperationResult};
use crate::transform::parent_dir;

/// Relocates a file into a destination directory, keeping its name.
pub trait FileMover {
    /// Places `source` inside `destination_dir` and returns the new path.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination is unusable or the
    /// filesystem refuses the operation. The source is left untouched
    /// on failure.
    fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
    ) -> OperationResult;
}

/// Moves by linking the file under its new name and unlinking the old
/// one, falling back to copy-and-delete when a link is not possible
/// (another filesystem, or one without hard links). An occupied target
/// is never replaced, even if it appears after the initial checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameMover;

/// Copies into the destination and keeps the source in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyMover;

impl FileMover for RenameMover {
    fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
    ) -> OperationResult {
        let target = target_path(source, destination_dir)?;

        log::info!("Moving {} -> {}", source.display(), target.display());

        relocate(source, &target)?;
        Ok(target)
    }
}

impl FileMover for CopyMover {
    fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
    ) -> OperationResult {
        let target = target_path(source, destination_dir)?;

        log::info!("Copying {} -> {}", source.display(), target.display());

        copy_into_place(source, &target)?;
        Ok(target)
    }
}

fn move_error(from: &Path, to: &Path) -> impl FnOnce(io::Error) -> AppError {
    let (from, to) = (from.to_path_buf(), to.to_path_buf());
    move |source| AppError::Move { from, to, source }
}

/// Resolves `destination_dir/basename(source)` and checks that the
/// move can start: the source is a regular file, the destination is a
/// directory, and nothing already occupies the target.
fn target_path(
    source: &Path,
    destination_dir: &Path,
) -> Result<PathBuf, AppError> {
    if !source.is_file() {
        return Err(AppError::InvalidPath {
            path: source.to_path_buf(),
        });
    }
    if !destination_dir.is_dir() {
        return Err(AppError::NotADirectory {
            path: destination_dir.to_path_buf(),
        });
    }

    let name = source.file_name().ok_or_else(|| AppError::InvalidPath {
        path: source.to_path_buf(),
    })?;
    let target = destination_dir.join(name);

    if target.symlink_metadata().is_ok() {
        return Err(AppError::TargetExists { path: target });
    }
    Ok(target)
}

/// Copies `source` into a temporary file beside `target` and links it
/// into place only if `target` is still free.
fn copy_into_place(source: &Path, target: &Path) -> Result<(), AppError> {
    let map_err = |err| move_error(source, target)(err);

    let dir = parent_dir(target);
    let mut tmp = NamedTempFile::new_in(dir).map_err(map_err)?;
    let mut reader = File::open(source).map_err(map_err)?;

    let copied = io::copy(&mut reader, tmp.as_file_mut()).map_err(map_err)?;
    tmp.as_file().sync_all().map_err(map_err)?;

    let permissions = reader.metadata().map_err(map_err)?.permissions();
    fs::set_permissions(tmp.path(), permissions).map_err(map_err)?;

    log::debug!("Copied {copied} bytes into {}", tmp.path().display());

    tmp.persist_noclobber(target).map_err(|err| {
        if err.error.kind() == io::ErrorKind::AlreadyExists {
            AppError::TargetExists {
                path: target.to_path_buf(),
            }
        } else {
            map_err(err.error)
        }
    })?;
    Ok(())
}

/// Puts `source` at `target` without replacing an existing file there.
fn relocate(source: &Path, target: &Path) -> Result<(), AppError> {
    match fs::hard_link(source, target) {
        Ok(()) => remove_or_roll_back(source, target, |p: &Path| fs::remove_file(p)),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            Err(AppError::TargetExists {
                path: target.to_path_buf(),
            })
        }
        Err(err) => {
            log::debug!("Hard link failed ({err}), copying instead");
            copy_then_remove(source, target)
        }
    }
}

fn copy_then_remove(source: &Path, target: &Path) -> Result<(), AppError> {
    copy_then_remove_with(source, target, |p: &Path| fs::remove_file(p))
}

/// Copies `source` to `target`, then deletes the source with `remove`.
fn copy_then_remove_with(
    source: &Path,
    target: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<(), AppError> {
    copy_into_place(source, target)?;
    remove_or_roll_back(source, target, remove)
}

/// Removes `source` now that `target` holds its content. If that fails,
/// `target` is removed again so the filesystem looks as it did before.
fn remove_or_roll_back(
    source: &Path,
    target: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<(), AppError> {
    if let Err(err) = remove(source) {
        if let Err(cleanup) = fs::remove_file(target) {
            log::warn!(
                "Failed to remove partial copy {}: {cleanup}",
                target.display()
            );
        }
        return Err(move_error(source, target)(err));
    }
    Ok(())
}
