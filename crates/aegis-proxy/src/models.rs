//! OpenAI-compatible wire types for the chat-completions surface, plus
//! the non-standard `security` report attached to every response.

use aegis_core::SecurityReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

fn default_model() -> String {
    "default".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

/// Incoming chat completion request. Mirrors the OpenAI-compatible API
/// shape used by most self-hosted and hosted providers alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default = "default_model")]
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("messages must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be in [0.0, 2.0]".to_string());
        }
        if let Some(max_tokens) = self.max_tokens {
            if max_tokens == 0 {
                return Err("max_tokens must be greater than 0".to_string());
            }
        }
        Ok(())
    }

    pub fn latest_user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Outgoing chat completion response. Extends the standard OpenAI
/// format with the `security` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub security: SecurityReport,
}

impl ChatCompletionResponse {
    pub fn from_text(
        text: impl Into<String>,
        model: impl Into<String>,
        response_id: impl Into<String>,
        security: SecurityReport,
    ) -> Self {
        Self {
            id: response_id.into(),
            object: "chat.completion".to_string(),
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage {
                    role: Role::Assistant,
                    content: text.into(),
                },
                finish_reason: "stop".to_string(),
            }],
            security,
        }
    }

    pub fn blocked(reason: impl std::fmt::Display, mut security: SecurityReport) -> Self {
        security.mark_blocked();
        Self {
            id: String::new(),
            object: "chat.completion".to_string(),
            model: "default".to_string(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage {
                    role: Role::Assistant,
                    content: format!("[BLOCKED] {reason}"),
                },
                finish_reason: "content_filter".to_string(),
            }],
            security,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub components: std::collections::HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_user_content_picks_last_user_message() {
        let request = ChatCompletionRequest {
            model: "default".to_string(),
            messages: vec![
                ChatMessage { role: Role::User, content: "first".to_string() },
                ChatMessage { role: Role::Assistant, content: "reply".to_string() },
                ChatMessage { role: Role::User, content: "second".to_string() },
            ],
            temperature: 0.7,
            max_tokens: None,
            stream: false,
        };
        assert_eq!(request.latest_user_content(), "second");
    }

    #[test]
    fn rejects_empty_messages() {
        let request = ChatCompletionRequest {
            model: "default".to_string(),
            messages: vec![],
            temperature: 0.7,
            max_tokens: None,
            stream: false,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let request = ChatCompletionRequest {
            model: "default".to_string(),
            messages: vec![ChatMessage { role: Role::User, content: "hi".to_string() }],
            temperature: 3.0,
            max_tokens: None,
            stream: false,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn blocked_response_marks_security_report() {
        let response = ChatCompletionResponse::blocked("test reason", SecurityReport::new());
        assert!(response.choices[0].message.content.starts_with("[BLOCKED]"));
        assert_eq!(response.security.verdict, aegis_core::SecurityVerdict::Block);
    }
}
