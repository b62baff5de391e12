//! In-memory store for tests and dry runs.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{normalize, validate_relative, BlobStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    /// Every write in order, including overwrites
    write_log: Vec<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of a stored file
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        let key = normalize(path.as_ref());
        self.lock().ok()?.files.get(&key).cloned()
    }

    /// All stored file paths, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All created directories, sorted
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.lock()
            .map(|inner| inner.dirs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Paths in the order they were written
    pub fn write_log(&self) -> Vec<PathBuf> {
        self.lock()
            .map(|inner| inner.write_log.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, EngineError> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Storage("memory store lock poisoned".to_string()))
    }
}

fn add_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors() {
        if !ancestor.as_os_str().is_empty() {
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn write(&self, path: &Path, content: &str) -> Result<(), EngineError> {
        validate_relative(path)?;
        let key = normalize(path);
        let mut inner = self.lock()?;
        if let Some(parent) = key.parent() {
            add_ancestors(&mut inner.dirs, parent);
        }
        inner.write_log.push(key.clone());
        inner.files.insert(key, content.to_string());
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, EngineError> {
        validate_relative(path)?;
        let key = normalize(path);
        let inner = self.lock()?;
        Ok(inner.files.contains_key(&key) || inner.dirs.contains(&key))
    }

    async fn mkdir(&self, path: &Path) -> Result<(), EngineError> {
        validate_relative(path)?;
        let key = normalize(path);
        let mut inner = self.lock()?;
        add_ancestors(&mut inner.dirs, &key);
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Option<String>, EngineError> {
        validate_relative(path)?;
        let key = normalize(path);
        Ok(self.lock()?.files.get(&key).cloned())
    }
}
