//! Operator configuration for the Aegis sidecar.
//!
//! Loaded once at process start from environment variables (prefix
//! `AEGIS_`), with an optional `.env` file loaded via `dotenvy`,
//! layered over hard-coded defaults. Validated before the HTTP
//! listener binds; see [`AegisConfig::validate`].

use serde::{Deserialize, Serialize};

/// Central configuration for the Aegis sidecar.
///
/// Immutable after construction. Shared read-only (`Arc<AegisConfig>`)
/// across request tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AegisConfig {
    // ── Proxy ──────────────────────────────────────────────
    /// Listen host for the HTTP surface.
    pub host: String,
    /// Listen port for the HTTP surface.
    pub port: u16,
    /// Upstream OpenAI-compatible chat-completions URL.
    pub upstream_url: String,
    /// Bearer token for the upstream LLM provider.
    pub upstream_api_key: String,

    // ── Vault ──────────────────────────────────────────────
    /// Symmetric key (hex-encoded, 32 bytes) used to encrypt swap maps.
    pub vault_key: String,
    /// Path to the embedded vault database.
    pub vault_db_path: String,

    // ── Logging ────────────────────────────────────────────
    /// Minimum `tracing` log level.
    pub log_level: String,

    // ── Canary ─────────────────────────────────────────────
    /// Prefix prepended to every generated canary token.
    pub canary_prefix: String,

    // ── Guardrail ──────────────────────────────────────────
    /// Which guardrail backend family to prefer.
    pub guardrail_backend: GuardrailBackendPreference,
    /// Model identifier passed to the resolved backend.
    pub guardrail_model: String,
    /// API key for the remote guardrail backend.
    pub guardrail_remote_key: String,
    /// API key for a local-accelerated backend that requires one.
    pub guardrail_local_key: String,
    /// Score at/above which an `injection` label blocks.
    pub injection_threshold: f64,
    /// Score at/above which a `jailbreak` label blocks.
    pub jailbreak_threshold: f64,

    // ── Output safety ──────────────────────────────────────
    /// API key for the optional ML output-safety classifier.
    pub output_safety_key: String,

    // ── Feature flags ──────────────────────────────────────
    /// Enable the OCR collaborator (no bundled implementation; no-op).
    pub enable_ocr: bool,
    /// Enable the adversarial red-team runner (no bundled implementation; no-op).
    pub enable_adversarial_runner: bool,
    /// Enable the threat-intelligence scanner (no bundled implementation; no-op).
    pub enable_threat_intel: bool,
}

impl Default for AegisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            upstream_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            upstream_api_key: String::new(),
            vault_key: String::new(),
            vault_db_path: "aegis_vault.sled".to_string(),
            log_level: "info".to_string(),
            canary_prefix: "AEGIS-CANARY".to_string(),
            guardrail_backend: GuardrailBackendPreference::Auto,
            guardrail_model: "meta-llama/Prompt-Guard-86M".to_string(),
            guardrail_remote_key: String::new(),
            guardrail_local_key: String::new(),
            injection_threshold: 0.90,
            jailbreak_threshold: 0.85,
            output_safety_key: String::new(),
            enable_ocr: false,
            enable_adversarial_runner: false,
            enable_threat_intel: false,
        }
    }
}

/// Preference order for resolving the ingress guardrail backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardrailBackendPreference {
    /// Try remote, then local-accelerated, then local-reference.
    Auto,
    /// A hosted inference API (e.g. Groq).
    RemoteApi,
    /// A locally-accelerated runtime (e.g. ONNX Runtime).
    LocalAccelerated,
    /// A local reference implementation (e.g. a HuggingFace pipeline).
    LocalReference,
}

impl std::str::FromStr for GuardrailBackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "remote-api" | "remote" | "groq" => Ok(Self::RemoteApi),
            "local-accelerated" | "onnx" => Ok(Self::LocalAccelerated),
            "local-reference" | "huggingface" => Ok(Self::LocalReference),
            other => Err(format!("unknown guardrail backend preference '{other}'")),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

impl AegisConfig {
    /// Load configuration from environment variables, falling back to
    /// [`AegisConfig::default`] for anything unset. Auto-loads a `.env`
    /// file from the working directory first (no-op if missing).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let guardrail_backend = std::env::var("AEGIS_GUARDRAIL_BACKEND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.guardrail_backend);

        Self {
            host: env_or("AEGIS_HOST", &defaults.host),
            port: std::env::var("AEGIS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            upstream_url: env_or("AEGIS_UPSTREAM_URL", &defaults.upstream_url),
            upstream_api_key: std::env::var("AEGIS_UPSTREAM_API_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .unwrap_or(defaults.upstream_api_key),
            vault_key: env_or("AEGIS_VAULT_KEY", &defaults.vault_key),
            vault_db_path: env_or("AEGIS_VAULT_DB_PATH", &defaults.vault_db_path),
            log_level: env_or("AEGIS_LOG_LEVEL", &defaults.log_level),
            canary_prefix: env_or("AEGIS_CANARY_PREFIX", &defaults.canary_prefix),
            guardrail_backend,
            guardrail_model: env_or("AEGIS_GUARDRAIL_MODEL", &defaults.guardrail_model),
            guardrail_remote_key: std::env::var("AEGIS_GUARDRAIL_GROQ_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .unwrap_or(defaults.guardrail_remote_key),
            guardrail_local_key: std::env::var("AEGIS_GUARDRAIL_HF_TOKEN")
                .or_else(|_| std::env::var("HUGGINGFACEHUB_API_TOKEN"))
                .unwrap_or(defaults.guardrail_local_key),
            injection_threshold: std::env::var("AEGIS_INJECTION_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.injection_threshold),
            jailbreak_threshold: std::env::var("AEGIS_JAILBREAK_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.jailbreak_threshold),
            output_safety_key: std::env::var("AEGIS_OUTPUT_SAFETY_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .unwrap_or(defaults.output_safety_key),
            enable_ocr: env_bool("AEGIS_ENABLE_OCR", defaults.enable_ocr),
            enable_adversarial_runner: env_bool(
                "AEGIS_ENABLE_ADVERSARIAL_RUNNER",
                defaults.enable_adversarial_runner,
            ),
            enable_threat_intel: env_bool(
                "AEGIS_ENABLE_THREAT_INTEL",
                defaults.enable_threat_intel,
            ),
        }
    }

    /// Validate the configuration, returning a description of the first
    /// problem found. Called once at startup before the listener binds.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.upstream_url.trim().is_empty() {
            return Err("AEGIS_UPSTREAM_URL must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.injection_threshold) {
            return Err("AEGIS_INJECTION_THRESHOLD must be in [0,1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.jailbreak_threshold) {
            return Err("AEGIS_JAILBREAK_THRESHOLD must be in [0,1]".to_string());
        }
        if !self.vault_key.is_empty() && hex::decode(&self.vault_key).is_err() {
            return Err("AEGIS_VAULT_KEY must be hex-encoded".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_thresholds() {
        let config = AegisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.guardrail_backend, GuardrailBackendPreference::Auto);
    }

    #[test]
    fn rejects_empty_upstream_url() {
        let mut config = AegisConfig::default();
        config.upstream_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = AegisConfig::default();
        config.injection_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_backend_preference_aliases() {
        assert_eq!(
            "groq".parse::<GuardrailBackendPreference>().unwrap(),
            GuardrailBackendPreference::RemoteApi
        );
        assert!("bogus".parse::<GuardrailBackendPreference>().is_err());
    }
}
