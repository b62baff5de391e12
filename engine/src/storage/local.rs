//! Local filesystem store rooted at the workspace directory.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::{validate_relative, BlobStore};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, EngineError> {
        validate_relative(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn write(&self, path: &Path, content: &str) -> Result<(), EngineError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                EngineError::Storage(format!(
                    "Failed to create directories {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        info!("Writing {} bytes to: {}", content.len(), target.display());

        fs::write(&target, content).await.map_err(|e| {
            EngineError::Storage(format!("Failed to write {}: {}", target.display(), e))
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool, EngineError> {
        let target = self.resolve(path)?;
        Ok(fs::try_exists(&target).await?)
    }

    async fn mkdir(&self, path: &Path) -> Result<(), EngineError> {
        let target = self.resolve(path)?;
        debug!("Creating directory: {}", target.display());
        fs::create_dir_all(&target).await.map_err(|e| {
            EngineError::Storage(format!(
                "Failed to create directory {}: {}",
                target.display(),
                e
            ))
        })
    }

    async fn read(&self, path: &Path) -> Result<Option<String>, EngineError> {
        let target = self.resolve(path)?;
        match fs::read_to_string(&target).await {
            Ok(content) => {
                debug!("Read {} bytes from {}", content.len(), target.display());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::Storage(format!(
                "Failed to read {}: {}",
                target.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parents_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let path = Path::new("TodoApp/.kiro/requirements.md");

        store.write(path, "first").await.unwrap();
        store.write(path, "second").await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join(path)).unwrap();
        assert_eq!(on_disk, "second");
        assert_eq!(store.read(path).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_mkdir_and_exists() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(!store.exists(Path::new("TodoApp")).await.unwrap());
        store.mkdir(Path::new("TodoApp")).await.unwrap();
        assert!(store.exists(Path::new("TodoApp")).await.unwrap());
        assert!(tmp.path().join("TodoApp").is_dir());
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        assert_eq!(store.read(Path::new("nope.txt")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let err = store
            .write(Path::new("../escape.txt"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PathOutsideWorkspace(_)));
        assert!(!tmp.path().parent().unwrap().join("escape.txt").exists());
    }
}
