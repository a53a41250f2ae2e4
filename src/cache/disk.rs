//! Disk Tier Module
//!
//! Persistent string-to-string key/value stores backing the memory tier.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{CacheError, Result};

// == Disk Store Trait ==
/// String-keyed persistent store. The cache enforces no size bound on it.
pub trait DiskStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
    /// Removes a batch of keys. Stores that can should apply it atomically.
    fn remove_many(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
    fn keys(&self) -> Result<Vec<String>>;
    fn clear(&mut self) -> Result<()>;
    /// Persists any buffered state. Called on dispose.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

// == File Store ==
/// Write-through store backed by a SQLite table at `<dir>/<namespace>.db`.
///
/// One row per key. Each write is its own statement; batch removals run in a
/// single transaction.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    conn: Connection,
}

impl FileStore {
    /// Opens (or creates) the store for `namespace` under `dir`.
    ///
    /// A file that is not a SQLite database is reported as an error and left
    /// untouched.
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        if namespace.is_empty() || namespace.contains(['/', '\\']) {
            return Err(CacheError::InvalidRequest(format!(
                "Invalid storage namespace: '{}'",
                namespace
            )));
        }

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.db", namespace));

        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        info!("Opened cache store {} ({} keys)", path.display(), count);
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiskStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM cache_entries WHERE key = ?1")?;
        let value = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR REPLACE INTO cache_entries (key, value) VALUES (?1, ?2)")?;
        stmt.execute(params![key, value])?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM cache_entries WHERE key = ?1")?;
        stmt.execute(params![key])?;
        Ok(())
    }

    fn remove_many(&mut self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM cache_entries WHERE key = ?1")?;
            for key in keys {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;

        debug!("Removed {} keys from {}", keys.len(), self.path.display());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key FROM cache_entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }
}

// == Memory Store ==
/// Volatile store for tests and ephemeral runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiskStore for MemoryStore {
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

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_ops() {
        let mut store = MemoryStore::new();

        store.set("food:1", "a".to_string()).unwrap();
        assert_eq!(store.get("food:1").unwrap(), Some("a".to_string()));

        store.remove("food:1").unwrap();
        store.remove("food:1").unwrap();
        assert_eq!(store.get("food:1").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = FileStore::open(dir.path(), "app-cache").unwrap();
            store.set("food:1", "one".to_string()).unwrap();
            store.set("food:2", "two".to_string()).unwrap();
            store.remove("food:2").unwrap();
        }

        let store = FileStore::open(dir.path(), "app-cache").unwrap();
        assert_eq!(store.get("food:1").unwrap(), Some("one".to_string()));
        assert_eq!(store.keys().unwrap(), vec!["food:1".to_string()]);
        assert_eq!(store.path(), dir.path().join("app-cache.db"));
    }

    #[test]
    fn test_file_store_namespaces_are_separate() {
        let dir = tempfile::tempdir().unwrap();

        let mut a = FileStore::open(dir.path(), "a").unwrap();
        a.set("k", "v".to_string()).unwrap();

        let b = FileStore::open(dir.path(), "b").unwrap();
        assert!(b.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_clear() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = FileStore::open(dir.path(), "app-cache").unwrap();
        store.set("k", "v".to_string()).unwrap();
        store.clear().unwrap();

        let reopened = FileStore::open(dir.path(), "app-cache").unwrap();
        assert!(reopened.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app-cache.db"), vec![b'x'; 8192]).unwrap();

        let result = FileStore::open(dir.path(), "app-cache");
        assert!(matches!(result, Err(CacheError::Sqlite(_))));
    }

    #[test]
    fn test_file_store_remove_many() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path(), "app-cache").unwrap();
        for i in 0..500 {
            store.set(&format!("food:{}", i), i.to_string()).unwrap();
        }

        let doomed: Vec<String> = (0..500).filter(|i| i % 2 == 0).map(|i| format!("food:{}", i)).collect();
        store.remove_many(&doomed).unwrap();
        // Absent keys and an empty batch are fine
        store.remove_many(&doomed).unwrap();
        store.remove_many(&[]).unwrap();

        let reopened = FileStore::open(dir.path(), "app-cache").unwrap();
        let keys = reopened.keys().unwrap();
        assert_eq!(keys.len(), 250);
        assert_eq!(reopened.get("food:0").unwrap(), None);
        assert_eq!(reopened.get("food:1").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_file_store_overwrite_keeps_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path(), "app-cache").unwrap();

        store.set("k", "old".to_string()).unwrap();
        store.set("k", "new".to_string()).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
        assert_eq!(store.get("k").unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_memory_store_remove_many() {
        let mut store = MemoryStore::new();
        store.set("a", "1".to_string()).unwrap();
        store.set("b", "2".to_string()).unwrap();

        store.remove_many(&["a".to_string(), "missing".to_string()]).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_file_store_rejects_bad_namespace() {
        let dir = tempfile::tempdir().unwrap();

        let result = FileStore::open(dir.path(), "../escape");
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert!(FileStore::open(dir.path(), "").is_err());
    }
}
