//! Byte storage for persisted documents.
//!
//! Stores deal in raw bytes addressed by path; encoding is the job of a
//! [`DocumentCodec`](crate::document::DocumentCodec).

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::document::{DocumentCodec, LoadWarning};
use crate::scene::Scene;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Codec error: {0}")]
    Codec(#[from] crate::document::CodecError),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend that reads and writes whole documents as bytes.
pub trait DocumentStore: Send + Sync {
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()>;

    fn exists(&self, path: &Path) -> StorageResult<bool>;

    fn delete(&self, path: &Path) -> StorageResult<()>;
}

/// Read and decode the scene at `path`. A missing document is an empty scene.
pub fn load_scene(
    store: &dyn DocumentStore,
    codec: &dyn DocumentCodec,
    path: &Path,
) -> StorageResult<(Scene, Vec<LoadWarning>)> {
    match store.read(path) {
        Ok(bytes) => Ok(codec.decode(&bytes)?),
        Err(StorageError::NotFound(_)) => {
            log::info!("{} does not exist yet, starting empty", path.display());
            Ok((Scene::new(), Vec::new()))
        }
        Err(e) => Err(e),
    }
}

/// Encode `scene` and write it to `path`.
pub fn save_scene(
    store: &dyn DocumentStore,
    codec: &dyn DocumentCodec,
    path: &Path,
    scene: &Scene,
) -> StorageResult<()> {
    let bytes = codec.encode(scene)?;
    store.write(path, &bytes)?;
    log::info!("saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
