//! Pluggable inference backends for the prompt-guard classifier.
//!
//! The remote-api backend calls Groq's hosted Prompt Guard model over
//! HTTP. The local-accelerated and local-reference backends represent
//! an ONNX Runtime / HuggingFace-transformers pipeline respectively;
//! no model runtime is bundled here, so both report unavailable and
//! the factory falls through to the next preference, exactly like the
//! no-backend-available path.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

/// A single label/score pair from a backend, before normalization.
#[derive(Debug, Clone)]
pub struct RawScore {
    pub label: String,
    pub score: f64,
}

impl RawScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A pluggable guardrail inference backend.
#[async_trait]
pub trait GuardrailBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn classify(&self, text: &str) -> Vec<RawScore>;
}

/// Groq-hosted Prompt Guard 2 86M, called via chat completions.
pub struct GroqBackend {
    model: String,
    api_key: String,
    http: reqwest::Client,
}

const GROQ_MODEL: &str = "meta-llama/llama-prompt-guard-2-86m";
const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

impl GroqBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            model: GROQ_MODEL.to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client builds"),
        }
    }

    pub fn is_available(api_key: &str) -> bool {
        !api_key.is_empty()
    }

    fn parse_label(raw_label: &str) -> Vec<RawScore> {
        let trimmed = raw_label.trim();

        if let Ok(unsafe_score) = trimmed.parse::<f64>() {
            let safe_score = 1.0 - unsafe_score;
            return vec![
                RawScore::new("benign", safe_score),
                RawScore::new("injection", unsafe_score * 0.4),
                RawScore::new("jailbreak", unsafe_score),
            ];
        }

        let lower = trimmed.to_ascii_lowercase();
        let detected = if lower.contains("injection") {
            "injection"
        } else if lower.contains("unsafe") || lower.contains("jailbreak") {
            "jailbreak"
        } else {
            "benign"
        };

        match detected {
            "injection" => vec![
                RawScore::new("benign", 0.02),
                RawScore::new("injection", 0.95),
                RawScore::new("jailbreak", 0.03),
            ],
            "jailbreak" => vec![
                RawScore::new("benign", 0.02),
                RawScore::new("injection", 0.03),
                RawScore::new("jailbreak", 0.95),
            ],
            _ => vec![
                RawScore::new("benign", 0.95),
                RawScore::new("injection", 0.03),
                RawScore::new("jailbreak", 0.02),
            ],
        }
    }
}

#[async_trait]
impl GuardrailBackend for GroqBackend {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn classify(&self, text: &str) -> Vec<RawScore> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": text}],
            "temperature": 0.0,
            "max_tokens": 10,
        });

        let response = self
            .http
            .post(GROQ_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        let raw_label = match response {
            Ok(resp) => match resp.json::<serde_json::Value>().await {
                Ok(json) => json["choices"][0]["message"]["content"]
                    .as_str()
                    .unwrap_or("benign")
                    .to_string(),
                Err(err) => {
                    warn!(error = %err, "groq guardrail response parse failed");
                    "benign".to_string()
                }
            },
            Err(err) => {
                warn!(error = %err, "groq guardrail inference failed");
                return vec![RawScore::new("benign", 1.0)];
            }
        };

        Self::parse_label(&raw_label)
    }
}

/// ONNX Runtime-backed local inference. No runtime is bundled in this
/// build; always reports unavailable.
pub struct LocalAcceleratedBackend;

impl LocalAcceleratedBackend {
    pub fn is_available() -> bool {
        false
    }
}

#[async_trait]
impl GuardrailBackend for LocalAcceleratedBackend {
    fn name(&self) -> &'static str {
        "local-accelerated"
    }

    async fn classify(&self, _text: &str) -> Vec<RawScore> {
        vec![RawScore::new("benign", 1.0)]
    }
}

/// HuggingFace-transformers-backed local inference. No runtime is
/// bundled in this build; always reports unavailable.
pub struct LocalReferenceBackend;

impl LocalReferenceBackend {
    pub fn is_available() -> bool {
        false
    }
}

#[async_trait]
impl GuardrailBackend for LocalReferenceBackend {
    fn name(&self) -> &'static str {
        "local-reference"
    }

    async fn classify(&self, _text: &str) -> Vec<RawScore> {
        vec![RawScore::new("benign", 1.0)]
    }
}

/// Resolve a backend for the given preference, trying `auto` in
/// remote-api → local-accelerated → local-reference order.
pub fn resolve_backend(
    preference: &str,
    groq_api_key: &str,
) -> Option<Box<dyn GuardrailBackend>> {
    match preference {
        "remote-api" => {
            if GroqBackend::is_available(groq_api_key) {
                Some(Box::new(GroqBackend::new(groq_api_key)))
            } else {
                warn!("remote-api backend requested but unavailable");
                None
            }
        }
        "local-accelerated" => {
            if LocalAcceleratedBackend::is_available() {
                Some(Box::new(LocalAcceleratedBackend))
            } else {
                warn!("local-accelerated backend requested but unavailable");
                None
            }
        }
        "local-reference" => {
            if LocalReferenceBackend::is_available() {
                Some(Box::new(LocalReferenceBackend))
            } else {
                warn!("local-reference backend requested but unavailable");
                None
            }
        }
        "auto" => {
            if GroqBackend::is_available(groq_api_key) {
                info!("auto-selected guardrail backend: remote-api");
                return Some(Box::new(GroqBackend::new(groq_api_key)));
            }
            if LocalAcceleratedBackend::is_available() {
                info!("auto-selected guardrail backend: local-accelerated");
                return Some(Box::new(LocalAcceleratedBackend));
            }
            if LocalReferenceBackend::is_available() {
                info!("auto-selected guardrail backend: local-reference");
                return Some(Box::new(LocalReferenceBackend));
            }
            warn!("no guardrail backend available, classifier disabled");
            None
        }
        other => {
            warn!(preference = other, "unknown backend preference, falling back to auto");
            resolve_backend("auto", groq_api_key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_unsafe_score() {
        let scores = GroqBackend::parse_label("0.97");
        let jailbreak = scores.iter().find(|s| s.label == "jailbreak").unwrap();
        assert!((jailbreak.score - 0.97).abs() < 1e-9);
    }

    #[test]
    fn parse_text_label_injection() {
        let scores = GroqBackend::parse_label("injection");
        let top = scores.iter().max_by(|a, b| a.score.total_cmp(&b.score)).unwrap();
        assert_eq!(top.label, "injection");
    }

    #[test]
    fn resolve_unknown_preference_falls_back_to_auto() {
        let backend = resolve_backend("nonsense", "");
        assert!(backend.is_none());
    }

    #[test]
    fn resolve_remote_api_without_key_is_none() {
        assert!(resolve_backend("remote-api", "").is_none());
    }
}
