use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat key/value store of strings kept in a single JSON file.
///
/// Every `set_item` rewrites the whole file; values are opaque to the store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl LocalStorage {
    pub fn open(home: &Path) -> Result<Self> {
        let path = home.join("local_storage.json");
        let items = if path.exists() {
            let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            match serde_json::from_str(&text) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "local storage unreadable; starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(|s| s.as_str())
    }

    pub fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = LocalStorage::open(tmp.path()).unwrap();
        assert_eq!(s.get_item("k"), None);
        s.set_item("k", "v1".into()).unwrap();
        s.set_item("k", "v2".into()).unwrap();
        let s2 = LocalStorage::open(tmp.path()).unwrap();
        assert_eq!(s2.get_item("k"), Some("v2"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("local_storage.json"), "{not json").unwrap();
        let s = LocalStorage::open(tmp.path()).unwrap();
        assert_eq!(s.get_item("chatSettings"), None);
    }
}
