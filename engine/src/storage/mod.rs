//! Filesystem collaborator.
//!
//! The pipeline persists projects and documents through `BlobStore`, a
//! path-keyed blob store. Paths are always relative to the store root;
//! absolute paths and `..` components are rejected before any I/O.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::path::{Component, Path, PathBuf};

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Path-keyed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `content` at `path`, creating parent directories and
    /// overwriting any existing file.
    async fn write(&self, path: &Path, content: &str) -> Result<(), EngineError>;

    /// Whether a file or directory exists at `path`
    async fn exists(&self, path: &Path) -> Result<bool, EngineError>;

    /// Create a directory (and its parents) at `path`
    async fn mkdir(&self, path: &Path) -> Result<(), EngineError>;

    /// Read the file at `path`; `None` when it does not exist
    async fn read(&self, path: &Path) -> Result<Option<String>, EngineError>;
}

/// Reject paths that could escape the store root.
pub(crate) fn validate_relative(path: &Path) -> Result<(), EngineError> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::Storage("empty path".to_string()));
    }

    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(EngineError::PathOutsideWorkspace(path.to_path_buf()));
    }

    Ok(())
}

/// Normalize a relative path into a map key (drops `.` components).
pub(crate) fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
