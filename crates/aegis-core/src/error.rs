//! Error types crossing the Aegis request/response boundary.

use thiserror::Error;

/// Unified error type for the Aegis sidecar.
///
/// Each variant documents the HTTP status it maps to at the `axum`
/// boundary (see `aegis-proxy`'s `IntoResponse` impl); this crate stays
/// framework-agnostic and only carries the classification.
#[derive(Debug, Error)]
pub enum AegisError {
    /// Caller's fault: malformed or out-of-range request fields. Maps to 422.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Operator's fault: missing or invalid configuration. Maps to 502 at
    /// runtime, or a fatal startup error (exit code 1) during `check`/`start`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Remote provider's fault: HTTP error status, connection failure, or
    /// malformed body from the upstream LLM. Maps to 502. Never retried.
    #[error("upstream LLM error: {0}")]
    Upstream(String),

    /// Vault encryption/decryption or storage failure. Maps to 500.
    #[error("vault error: {0}")]
    Vault(String),

    /// Anything else. Maps to 500; full detail goes to logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AegisError {
    /// The HTTP status code this error maps to, as a bare `u16` so that
    /// `aegis-core` never depends on an HTTP framework directly.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::Configuration(_) => 502,
            Self::Upstream(_) => 502,
            Self::Vault(_) => 500,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422() {
        assert_eq!(AegisError::Validation("bad".into()).status_code(), 422);
    }

    #[test]
    fn upstream_maps_to_502() {
        assert_eq!(AegisError::Upstream("timeout".into()).status_code(), 502);
    }
}
