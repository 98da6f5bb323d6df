//! Writing output files without leaving partial results behind.
use std::fs::create_dir_all;
use std::path::Path;

use crate::error::SirError;

/// Runs `write` against a temporary file in the destination directory and moves the result to
/// `path` only if `write` succeeds. The temporary file is removed on every failure path, and an
/// existing file at `path` is left untouched.
///
/// The temporary file keeps the extension of `path`, since encoders pick their format from it.
///
/// # Errors
///
/// Returns the error of `write`, or a `SirError::IoError` if the directory or the temporary
/// file cannot be created or the result cannot be moved into place.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<(), SirError>
where
    F: FnOnce(&Path) -> Result<(), SirError>,
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dir_all(directory)?;
    let suffix = path
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix(".sirsim-")
        .suffix(&suffix)
        .tempfile_in(directory)?;
    write(temp.path())?;
    temp.persist(path).map_err(|error| error.error)?;
    Ok(())
}
