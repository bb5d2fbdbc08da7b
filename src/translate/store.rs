//! Key-value store seam for the persistent cache tier.
//! Implementations report entries oldest-inserted first; the cache relies on
//! that order for FIFO batch eviction.

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistent key-value store collaborator. Every operation may fail with I/O.
pub trait KeyValueStore: Send + Sync {
    /// All entries, oldest-inserted first.
    fn read_all(&self) -> Result<Vec<(String, String)>, StoreError>;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite. Overwriting keeps the original insertion position.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove several keys in one operation.
    fn remove_many(&self, keys: &[String]) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_all()?.len())
    }
}

/// Process-local store. Loses its contents on drop; used for ephemeral
/// sessions and tests.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<Vec<(String, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn read_all(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self.entries.lock().clone())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[String]) -> Result<(), StoreError> {
        self.entries.lock().retain(|(k, _)| !keys.contains(k));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_insertion_position() {
        let store = InMemoryStore::new();
        store.write("a", "1").unwrap();
        store.write("b", "2").unwrap();
        store.write("a", "3").unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all, vec![("a".into(), "3".into()), ("b".into(), "2".into())]);
    }

    #[test]
    fn remove_many_and_clear() {
        let store = InMemoryStore::new();
        for k in ["a", "b", "c"] {
            store.write(k, k).unwrap();
        }
        store.remove_many(&["a".into(), "c".into()]).unwrap();
        assert_eq!(store.get("b").unwrap().as_deref(), Some("b"));
        assert_eq!(store.len().unwrap(), 1);

        store.clear().unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }
}
