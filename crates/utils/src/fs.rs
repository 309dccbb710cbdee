//! Filesystem helpers with error context

use ledgerprep_core::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Create a directory and its parents; an existing directory is fine
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::file_system(path, "create directory", e))
}

/// Copy `source` into `directory`, keeping its file name. Overwrites an
/// existing file of the same name and returns the destination path.
pub fn copy_into(source: &Path, directory: &Path) -> Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        Error::invalid_input("source", format!("{source:?} has no file name"))
    })?;
    let destination = directory.join(file_name);
    fs::copy(source, &destination).map_err(|e| Error::file_system(source, "copy file", e))?;
    Ok(destination)
}

/// Remove a file. Returns `false` when it was already gone.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::file_system(path, "remove file", e)),
    }
}

/// Remove a directory only if it is empty.
///
/// Returns `false` when the directory is missing or still has entries.
pub fn remove_dir_if_empty(path: &Path) -> bool {
    match fs::remove_dir(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Directory left in place");
            false
        }
    }
}
