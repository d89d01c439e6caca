//! Embedded sled-backed key-value storage for vault rows.

use std::path::Path;

use thiserror::Error;

const SESSIONS_TREE: &str = "sessions";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
}

/// Process-wide, `Clone`-able handle onto the embedded session store.
#[derive(Clone)]
pub struct VaultStorage {
    db: sled::Db,
    sessions: sled::Tree,
}

impl VaultStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        let sessions = db.open_tree(SESSIONS_TREE)?;
        Ok(Self { db, sessions })
    }

    /// In-memory store, for tests and ephemeral deployments.
    pub fn open_temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        let sessions = db.open_tree(SESSIONS_TREE)?;
        Ok(Self { db, sessions })
    }

    /// Replace-on-conflict insert; sled linearizes writes to the same key.
    pub fn put(&self, session_id: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.sessions.insert(session_id, bytes)?;
        self.sessions.flush()?;
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.sessions.get(session_id)?.map(|ivec| ivec.to_vec()))
    }

    /// Returns whether a row existed and was removed.
    pub fn remove(&self, session_id: &str) -> Result<bool, StorageError> {
        let removed = self.sessions.remove(session_id)?.is_some();
        self.sessions.flush()?;
        Ok(removed)
    }

    /// Clears every row, returning the number removed.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let count = self.sessions.len();
        self.sessions.clear()?;
        self.sessions.flush()?;
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Exposed for diagnostics (e.g. the CLI `status` subcommand).
    pub fn disk_size_bytes(&self) -> Result<u64, StorageError> {
        Ok(self.db.size_on_disk()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let storage = VaultStorage::open_temporary().unwrap();
        storage.put("session-1", b"payload").unwrap();
        assert_eq!(storage.get("session-1").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn remove_reports_whether_row_existed() {
        let storage = VaultStorage::open_temporary().unwrap();
        storage.put("session-1", b"payload").unwrap();
        assert!(storage.remove("session-1").unwrap());
        assert!(!storage.remove("session-1").unwrap());
    }

    #[test]
    fn clear_empties_store_and_counts_removed() {
        let storage = VaultStorage::open_temporary().unwrap();
        storage.put("a", b"1").unwrap();
        storage.put("b", b"2").unwrap();
        assert_eq!(storage.clear().unwrap(), 2);
        assert!(storage.is_empty());
    }

    #[test]
    fn put_is_idempotent_replace_on_conflict() {
        let storage = VaultStorage::open_temporary().unwrap();
        storage.put("session-1", b"first").unwrap();
        storage.put("session-1", b"second").unwrap();
        assert_eq!(storage.get("session-1").unwrap(), Some(b"second".to_vec()));
        assert_eq!(storage.len(), 1);
    }
}
