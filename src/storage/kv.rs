use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::debug;

use super::KeyValueStore;
use crate::Result;

/// Ephemeral store, lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory backed store; every key is kept in its own `<key>.json` file
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let path = self.key_path(key);
        debug!("writing {} bytes to {}", value.len(), path.display());
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("tables").unwrap(), None);

        store.set("tables", "{}".into()).unwrap();
        assert_eq!(store.get("tables").unwrap().as_deref(), Some("{}"));

        store.remove("tables").unwrap();
        store.remove("tables").unwrap();
        assert_eq!(store.get("tables").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = assert_fs::TempDir::new().unwrap();

        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("session", r#"{"usuarioId":1}"#.into()).unwrap();
        assert!(dir.path().join("session.json").exists());

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("session").unwrap().as_deref(),
            Some(r#"{"usuarioId":1}"#)
        );
        assert_eq!(store.get("tables").unwrap(), None);
    }

    #[test]
    fn file_store_remove_missing_key() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path().join("nested")).unwrap();

        store.remove("tables").unwrap();
        store.set("tables", "{}".into()).unwrap();
        store.remove("tables").unwrap();
        assert_eq!(store.get("tables").unwrap(), None);
    }
}
