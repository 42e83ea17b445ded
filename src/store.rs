//! Keyed text storage for recorded steps, curl logs and generated documents

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::errors::Result;

/// Text store with whole-value writes and line appends
pub trait Store: Send + Sync {
    /// Read a value, `None` if the key was never written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value of `key`
    fn write(&self, key: &str, data: &str) -> Result<()>;

    /// Append to the value of `key`, creating it if needed
    fn append(&self, key: &str, data: &str) -> Result<()>;

    /// Human readable location of `key`, used in log messages
    fn locate(&self, key: &str) -> String;

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }
}

/// Store backed by files in one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Store for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        let path = self.path(key);
        debug!("Writing {} bytes to {}", data.len(), path.display());
        fs::write(path, data)?;
        Ok(())
    }

    fn append(&self, key: &str, data: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(key))?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }

    fn locate(&self, key: &str) -> String {
        self.path(key).display().to_string()
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path(key).exists())
    }
}

/// In-memory store for library callers and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still consistent: every operation is a single insert.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        self.entries().insert(key.to_string(), data.to_string());
        Ok(())
    }

    fn append(&self, key: &str, data: &str) -> Result<()> {
        self.entries()
            .entry(key.to_string())
            .or_default()
            .push_str(data);
        Ok(())
    }

    fn locate(&self, key: &str) -> String {
        format!("memory:{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert_eq!(store.read("steps.json").unwrap(), None);
        assert!(!store.exists("steps.json").unwrap());

        store.write("steps.json", "[]").unwrap();
        assert_eq!(store.read("steps.json").unwrap().as_deref(), Some("[]"));

        store.append("log.txt", "one\n").unwrap();
        store.append("log.txt", "two\n").unwrap();
        assert_eq!(store.read("log.txt").unwrap().as_deref(), Some("one\ntwo\n"));
    }

    #[test]
    fn test_memory_store_append_creates_key() {
        let store = MemoryStore::new();
        store.append("a", "x").unwrap();
        store.append("a", "y").unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("xy"));
        assert!(store.exists("a").unwrap());
        assert!(!store.exists("b").unwrap());
    }
}
