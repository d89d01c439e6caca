//! `SessionVault`: the (session_id -> SwapMap) store used to restore PII
//! on egress after a process restart or across proxy replicas.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aegis_core::AegisError;
use aegis_shield::SwapMap;
use tracing::warn;

use crate::crypto::VaultCipher;
use crate::storage::VaultStorage;

/// Process-wide, `Clone`-able handle. Writes to the same `session_id`
/// are linearized by the underlying storage's own transaction semantics.
#[derive(Clone)]
pub struct SessionVault {
    storage: VaultStorage,
    cipher: Arc<VaultCipher>,
    warned_plaintext: Arc<AtomicBool>,
}

impl SessionVault {
    pub fn new(storage: VaultStorage, cipher: VaultCipher) -> Self {
        Self {
            storage,
            cipher: Arc::new(cipher),
            warned_plaintext: Arc::new(AtomicBool::new(false)),
        }
    }

    fn warn_plaintext_once(&self) {
        if !self.cipher.is_encrypting() && !self.warned_plaintext.swap(true, Ordering::Relaxed) {
            warn!("vault key not configured, session PII maps are stored unencrypted");
        }
    }

    fn validate_session_id(session_id: &str) -> Result<(), AegisError> {
        if session_id.trim().is_empty() {
            return Err(AegisError::Validation("session_id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Idempotent: an existing row for `session_id` is replaced.
    pub fn store(&self, session_id: &str, swap_map: &SwapMap) -> Result<(), AegisError> {
        Self::validate_session_id(session_id)?;
        self.warn_plaintext_once();

        let json = serde_json::to_vec(swap_map)
            .map_err(|e| AegisError::Vault(format!("failed to serialize swap map: {e}")))?;
        let payload = self
            .cipher
            .encrypt(&json)
            .map_err(|e| AegisError::Vault(format!("failed to encrypt vault row: {e}")))?;

        self.storage
            .put(session_id, &payload)
            .map_err(|e| AegisError::Vault(format!("failed to write vault row: {e}")))
    }

    /// Returns `None` if no row exists for `session_id`. Any decryption
    /// or deserialization failure is a hard error, never a partial map.
    pub fn retrieve(&self, session_id: &str) -> Result<Option<SwapMap>, AegisError> {
        Self::validate_session_id(session_id)?;

        let Some(payload) = self
            .storage
            .get(session_id)
            .map_err(|e| AegisError::Vault(format!("failed to read vault row: {e}")))?
        else {
            return Ok(None);
        };

        let json = self
            .cipher
            .decrypt(&payload)
            .map_err(|e| AegisError::Vault(format!("failed to decrypt vault row: {e}")))?;
        let swap_map = serde_json::from_slice(&json)
            .map_err(|e| AegisError::Vault(format!("failed to deserialize swap map: {e}")))?;
        Ok(Some(swap_map))
    }

    /// Returns whether a row existed for `session_id`.
    pub fn purge(&self, session_id: &str) -> Result<bool, AegisError> {
        Self::validate_session_id(session_id)?;
        self.storage
            .remove(session_id)
            .map_err(|e| AegisError::Vault(format!("failed to purge vault row: {e}")))
    }

    /// Returns the number of rows removed.
    pub fn purge_all(&self) -> Result<usize, AegisError> {
        self.storage
            .clear()
            .map_err(|e| AegisError::Vault(format!("failed to purge vault: {e}")))
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_shield::PiiKind;

    fn sample_map() -> SwapMap {
        let mut map = SwapMap::new();
        map.add("alice@example.com", "synthetic1@example.com", PiiKind::Email);
        map
    }

    fn plaintext_vault() -> SessionVault {
        SessionVault::new(VaultStorage::open_temporary().unwrap(), VaultCipher::plaintext())
    }

    fn encrypted_vault() -> SessionVault {
        SessionVault::new(VaultStorage::open_temporary().unwrap(), VaultCipher::with_key(&[4u8; 32]).unwrap())
    }

    #[test]
    fn store_then_retrieve_round_trips() {
        let vault = plaintext_vault();
        let map = sample_map();
        vault.store("session-1", &map).unwrap();
        let retrieved = vault.retrieve("session-1").unwrap().unwrap();
        assert_eq!(retrieved.synthetic_for("alice@example.com"), map.synthetic_for("alice@example.com"));
    }

    #[test]
    fn retrieve_missing_session_returns_none() {
        let vault = plaintext_vault();
        assert!(vault.retrieve("never-stored").unwrap().is_none());
    }

    #[test]
    fn purge_removes_entry_and_reports_existence() {
        let vault = plaintext_vault();
        vault.store("session-1", &sample_map()).unwrap();
        assert!(vault.purge("session-1").unwrap());
        assert!(vault.retrieve("session-1").unwrap().is_none());
        assert!(!vault.purge("session-1").unwrap());
    }

    #[test]
    fn purge_all_clears_everything() {
        let vault = plaintext_vault();
        vault.store("a", &sample_map()).unwrap();
        vault.store("b", &sample_map()).unwrap();
        assert_eq!(vault.purge_all().unwrap(), 2);
        assert!(vault.is_empty());
    }

    #[test]
    fn empty_session_id_is_rejected() {
        let vault = plaintext_vault();
        assert!(vault.store("", &sample_map()).is_err());
        assert!(vault.retrieve("  ").is_err());
        assert!(vault.purge("").is_err());
    }

    #[test]
    fn store_is_idempotent_replace_on_conflict() {
        let vault = plaintext_vault();
        let mut first = sample_map();
        vault.store("session-1", &first).unwrap();
        first.add("555-0100", "555-0199", PiiKind::Phone);
        vault.store("session-1", &first).unwrap();
        let retrieved = vault.retrieve("session-1").unwrap().unwrap();
        assert_eq!(retrieved.len(), 2);
    }

    #[test]
    fn encrypted_vault_round_trips_and_hides_plaintext() {
        let vault = encrypted_vault();
        let map = sample_map();
        vault.store("session-1", &map).unwrap();
        let retrieved = vault.retrieve("session-1").unwrap().unwrap();
        assert_eq!(retrieved.synthetic_for("alice@example.com"), map.synthetic_for("alice@example.com"));
    }
}
