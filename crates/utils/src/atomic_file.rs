//! Crash-safe writes into the blob store
//!
//! Blobs live under their content hash, so a path must never expose a
//! partially written file. Every writer fills a hidden temp file in the
//! destination directory, syncs it, renames it over the destination and then
//! syncs the directory so the rename itself survives a crash.

use ledgerprep_core::{Error, Result};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Hidden temp file next to `path`, removed on drop unless committed
struct PendingFile {
    temp_path: PathBuf,
    file: File,
    committed: bool,
}

impl PendingFile {
    fn create(path: &Path) -> Result<Self> {
        let parent = parent_of(path)?;
        fs::create_dir_all(parent)
            .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

        let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        Ok(Self {
            temp_path,
            file,
            committed: false,
        })
    }

    fn commit(mut self, path: &Path) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| Error::file_system(&self.temp_path, "sync temporary file", e))?;
        fs::rename(&self.temp_path, path)
            .map_err(|e| Error::file_system(path, "atomic rename", e))?;
        self.committed = true;
        sync_directory(parent_of(path)?)
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

fn parent_of(path: &Path) -> Result<&Path> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .ok_or_else(|| Error::configuration(format!("Invalid file path {path:?}: no parent directory")))
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|e| Error::file_system(dir, "sync directory", e))
}

// Directory handles cannot be synced on this platform; the rename is already durable
#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Replace `path` with `content`
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let mut pending = PendingFile::create(path)?;
    pending
        .file
        .write_all(content)
        .map_err(|e| Error::file_system(&pending.temp_path, "write to temporary file", e))?;
    pending.commit(path)
}

/// Stream `source` into `path` without holding it in memory. Returns the
/// number of bytes copied.
pub fn copy_atomic(source: &Path, path: &Path) -> Result<u64> {
    let mut reader =
        File::open(source).map_err(|e| Error::file_system(source, "open source file", e))?;
    let mut pending = PendingFile::create(path)?;
    let copied = io::copy(&mut reader, &mut pending.file)
        .map_err(|e| Error::file_system(source, "copy into temporary file", e))?;
    pending.commit(path)?;
    Ok(copied)
}

/// Replace `path` with the pretty-printed JSON of `value`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("models").join("abc").join("model");

        write_atomic(&file_path, b"weights").unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), b"weights");
    }

    #[test]
    fn test_write_overwrites_existing_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("metrics.py");
        fs::write(&file_path, "old").unwrap();

        write_atomic(&file_path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new");
        assert_eq!(temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_copy_streams_source_into_place() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("0024700.zip");
        let content = vec![7u8; 64 * 1024 + 3];
        fs::write(&source, &content).unwrap();
        let blob = temp_dir.path().join("data").join("h").join("0024700.zip");

        let copied = copy_atomic(&source, &blob).unwrap();

        assert_eq!(copied, content.len() as u64);
        assert_eq!(fs::read(&blob).unwrap(), content);
        assert!(source.exists());
    }

    #[test]
    fn test_failed_copy_leaves_neither_blob_nor_temp() {
        let temp_dir = TempDir::new().unwrap();
        let blob_dir = temp_dir.path().join("data");
        fs::create_dir_all(&blob_dir).unwrap();
        let blob = blob_dir.join("sample.zip");

        let err = copy_atomic(&temp_dir.path().join("missing.zip"), &blob).unwrap_err();

        assert!(matches!(err, Error::FileSystem { .. }));
        assert!(!blob.exists());
        assert_eq!(temp_files(&blob_dir), 0);
    }

    #[test]
    fn test_json_index_is_pretty_printed() {
        let temp_dir = TempDir::new().unwrap();
        let index = temp_dir.path().join(".index").join("algos.json");

        write_json_atomic(&index, &serde_json::json!([{"validated": true}])).unwrap();

        let content = fs::read_to_string(&index).unwrap();
        assert!(content.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["validated"], true);
    }

    #[test]
    fn test_path_without_parent_is_rejected() {
        assert!(matches!(
            write_atomic(Path::new("blob"), b"x"),
            Err(Error::Configuration { .. })
        ));
    }
}
