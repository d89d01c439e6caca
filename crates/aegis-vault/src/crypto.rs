//! AES-256-GCM encryption for vault rows. Each write generates a fresh
//! random 96-bit nonce, prepended to the ciphertext. With no key
//! configured, values pass through unencrypted and a warning is logged
//! once by the caller.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use thiserror::Error;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("vault key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("ciphertext too short to contain a nonce")]
    Truncated,
    #[error("decryption failed: integrity check did not pass")]
    DecryptionFailed,
}

/// Holds the operator-provided symmetric key, zeroized on drop.
pub struct VaultCipher {
    key: Option<Zeroizing<[u8; 32]>>,
}

impl VaultCipher {
    /// No key configured: writes pass through as plaintext.
    pub fn plaintext() -> Self {
        Self { key: None }
    }

    /// `key_bytes` must be exactly 32 bytes (AES-256).
    pub fn with_key(key_bytes: &[u8]) -> Result<Self, CryptoError> {
        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(key_bytes.len()));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(key_bytes);
        Ok(Self {
            key: Some(Zeroizing::new(key)),
        })
    }

    pub fn is_encrypting(&self) -> bool {
        self.key.is_some()
    }

    /// Encrypts `plaintext`, prepending a fresh random nonce to the
    /// ciphertext. Passes through unmodified when no key is configured.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let Some(key_bytes) = &self.key else {
            return Ok(plaintext.to_vec());
        };

        let key = Key::<Aes256Gcm>::from_slice(key_bytes.as_slice());
        let cipher = Aes256Gcm::new(key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Reverses [`VaultCipher::encrypt`]. Passes through unmodified when
    /// no key is configured. Never returns a partial result: any
    /// integrity failure is a hard error.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let Some(key_bytes) = &self.key else {
            return Ok(data.to_vec());
        };

        if data.len() < NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let key = Key::<Aes256Gcm>::from_slice(key_bytes.as_slice());
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_key() {
        let cipher = VaultCipher::with_key(&[7u8; 32]).unwrap();
        let plaintext = b"{\"real_to_synthetic\":{}}";
        let encrypted = cipher.encrypt(plaintext).unwrap();
        assert_ne!(encrypted, plaintext);
        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn distinct_nonces_per_write() {
        let cipher = VaultCipher::with_key(&[3u8; 32]).unwrap();
        let a = cipher.encrypt(b"same plaintext").unwrap();
        let b = cipher.encrypt(b"same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn plaintext_mode_is_passthrough() {
        let cipher = VaultCipher::plaintext();
        let data = b"unencrypted";
        assert_eq!(cipher.encrypt(data).unwrap(), data);
        assert_eq!(cipher.decrypt(data).unwrap(), data);
    }

    #[test]
    fn rejects_wrong_key_length() {
        assert!(VaultCipher::with_key(&[1u8; 16]).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_integrity_check() {
        let cipher = VaultCipher::with_key(&[9u8; 32]).unwrap();
        let mut encrypted = cipher.encrypt(b"secret").unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0xFF;
        assert!(cipher.decrypt(&encrypted).is_err());
    }
}
