//! # Aegis Vault
//!
//! An embedded, optionally encrypted key-value store of
//! `session_id -> SwapMap`. The Shield Pipeline swaps PII on ingress and
//! needs the mapping back on egress to restore it; the vault is what
//! makes that mapping survive a process restart or get shared across
//! proxy replicas rather than living only in request-scoped memory.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        AEGIS VAULT                         │
//! ├───────────────────────────────────────────────────────────┤
//! │   SessionVault                                             │
//! │     store/retrieve/purge/purge_all                         │
//! │        │                       │                           │
//! │        ▼                       ▼                           │
//! │   VaultCipher              VaultStorage                    │
//! │   AES-256-GCM               sled "sessions" tree            │
//! │   (optional)                                                │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! With no key configured, rows are written as plaintext JSON and a
//! warning is logged once per process. With a key configured, each
//! write is encrypted under AES-256-GCM with a fresh random 96-bit
//! nonce prepended to the ciphertext.

mod crypto;
mod storage;
mod vault;

pub use crypto::{CryptoError, VaultCipher};
pub use storage::{StorageError, VaultStorage};
pub use vault::SessionVault;
