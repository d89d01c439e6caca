//! Forwards a hardened request to the upstream OpenAI-compatible LLM
//! provider and extracts the assistant's reply text.

use std::time::Duration;

use aegis_shield::ChatMessage as ShieldMessage;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream LLM returned HTTP {0}")]
    Status(u16),
    #[error("failed to connect to upstream LLM: {0}")]
    Connection(String),
    #[error("upstream LLM response was malformed: {0}")]
    Malformed(String),
}

pub async fn forward_to_upstream(
    upstream_url: &str,
    api_key: &str,
    messages: &[ShieldMessage],
    model: &str,
    temperature: f64,
    max_tokens: Option<u32>,
) -> Result<String, UpstreamError> {
    let client = reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .build()
        .map_err(|e| UpstreamError::Connection(e.to_string()))?;

    let wire_messages: Vec<_> = messages
        .iter()
        .map(|m| {
            json!({
                "role": role_str(m.role),
                "content": m.content,
            })
        })
        .collect();

    let mut payload = json!({
        "model": model,
        "messages": wire_messages,
        "temperature": temperature,
    });
    if let Some(max_tokens) = max_tokens {
        payload["max_tokens"] = json!(max_tokens);
    }

    let mut request = client.post(upstream_url).json(&payload);
    if !api_key.is_empty() {
        request = request.bearer_auth(api_key);
    }

    let response = request.send().await.map_err(|e| {
        error!(error = %e, "upstream connection error");
        UpstreamError::Connection(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(status = status.as_u16(), "upstream HTTP error");
        return Err(UpstreamError::Status(status.as_u16()));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    let text = body["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string);

    match text {
        Some(text) => Ok(text),
        None => {
            warn!("upstream response contained no choices");
            Ok(String::new())
        }
    }
}

fn role_str(role: aegis_shield::Role) -> &'static str {
    match role {
        aegis_shield::Role::System => "system",
        aegis_shield::Role::User => "user",
        aegis_shield::Role::Assistant => "assistant",
    }
}
