//! Data-sample archive handling
//!
//! Data samples travel as zip archives. Registration refuses anything that
//! is not a readable zip; staging copies the archive next to its
//! destination, unpacks it in place and removes it.

use ledgerprep_core::{Error, Result};
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

fn open_archive(archive: &Path) -> Result<ZipArchive<File>> {
    let file =
        File::open(archive).map_err(|e| Error::file_system(archive, "open archive", e))?;
    ZipArchive::new(file).map_err(|e| Error::archive(archive, e.to_string()))
}

/// Fail unless `archive` is a zip whose central directory can be read
pub fn ensure_zip_archive(archive: &Path) -> Result<()> {
    open_archive(archive).map(|_| ())
}

/// Unpack a zip archive into `destination`, overwriting existing files
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<()> {
    open_archive(archive)?
        .extract(destination)
        .map_err(|e| Error::archive(archive, e.to_string()))
}

/// Unpack an archive next to itself and delete the archive afterwards
pub fn extract_in_place(archive: &Path) -> Result<()> {
    let destination = archive.parent().ok_or_else(|| {
        Error::archive(archive, "archive has no parent directory")
    })?;

    extract_archive(archive, destination)?;

    std::fs::remove_file(archive).map_err(|e| Error::file_system(archive, "remove archive", e))
}
