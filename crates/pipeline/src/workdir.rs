use ledgerprep_core::{
    constants::{DATA_DIR, MODEL_DIR, OPENER_DIR, PRED_DIR, TASK_ROOT_DIR},
    Error, Result,
};
use ledgerprep_utils::fs::create_directory;
use std::path::{Component, Path, PathBuf};

/// `<media_root>/traintuple/<task_key>/{opener,data,model,pred}`
///
/// Creating it again for the same key reuses the existing directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    root: PathBuf,
}

impl WorkingDirectory {
    /// Path of the working directory for `task_key`, without touching disk
    pub fn path_for(media_root: &Path, task_key: &str) -> Result<PathBuf> {
        let mut components = Path::new(task_key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(media_root.join(TASK_ROOT_DIR).join(task_key)),
            _ => Err(Error::invalid_input(
                "task_key",
                format!("'{task_key}' is not a single path component"),
            )),
        }
    }

    pub fn create(media_root: &Path, task_key: &str) -> Result<Self> {
        let root = Self::path_for(media_root, task_key)?;
        let dir = Self { root };
        for sub in [dir.opener(), dir.data(), dir.model(), dir.pred()] {
            create_directory(&sub)?;
        }
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn opener(&self) -> PathBuf {
        self.root.join(OPENER_DIR)
    }

    pub fn data(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn model(&self) -> PathBuf {
        self.root.join(MODEL_DIR)
    }

    /// Left empty for the executor's predictions
    pub fn pred(&self) -> PathBuf {
        self.root.join(PRED_DIR)
    }
}
