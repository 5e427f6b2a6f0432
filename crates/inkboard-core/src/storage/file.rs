//! Filesystem document store.

use super::{DocumentStore, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores documents as files. Relative paths resolve under `base_path`.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Store in the platform data directory.
    ///
    /// On Linux: `~/.local/share/inkboard/documents/`
    /// On Windows: `%LOCALAPPDATA%\inkboard\documents\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkboard").join("documents"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

impl DocumentStore for FileStore {
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(full.display().to_string()),
            _ => StorageError::Io(format!("Failed to read {}: {}", full.display(), e)),
        })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        // Stage next to the target, then rename over it.
        let mut staging = full.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, bytes)
            .and_then(|_| fs::rename(&staging, &full))
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", full.display(), e)))
    }

    fn exists(&self, path: &Path) -> StorageResult<bool> {
        Ok(self.resolve(path).exists())
    }

    fn delete(&self, path: &Path) -> StorageResult<()> {
        let full = self.resolve(path);
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!("Failed to delete {}: {}", full.display(), e))),
        }
    }
}
