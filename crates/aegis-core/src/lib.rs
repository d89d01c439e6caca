//! # Aegis Core
//!
//! Shared configuration, error, and report types for the Aegis security
//! sidecar. Every other `aegis-*` crate depends on this one for the
//! vocabulary that crosses crate boundaries: [`AegisConfig`],
//! [`AegisError`], [`SecurityVerdict`], and [`SecurityReport`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         AEGIS CORE                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   AegisConfig          AegisError          SecurityReport        │
//! │   (env + defaults)     (thiserror enum)    (pass/warn/block)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                    ▲              ▲                ▲
//!          aegis-shield     aegis-guardrail     aegis-proxy
//! ```
//!
//! The core itself does no request processing — it is the vocabulary
//! every other component shares, so that a swap map produced by
//! `aegis-shield` and a classification produced by `aegis-guardrail`
//! can both be summarized into one report by `aegis-proxy` without
//! circular crate dependencies.

mod config;
mod error;
mod report;

pub use config::{AegisConfig, GuardrailBackendPreference};
pub use error::AegisError;
pub use report::{SecurityReport, SecurityVerdict};

/// Core result type for Aegis operations.
pub type Result<T> = std::result::Result<T, AegisError>;
