//! ML-based egress guardrail using LLaMA Guard: classifies LLM
//! responses against 13 safety categories. Catches cases where the
//! ingress classifier misses but the model generates harmful output
//! anyway. Fails open on any error.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use tracing::{debug, warn};

const LLAMA_GUARD_MODEL: &str = "meta-llama/llama-guard-4-12b";
const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

static CATEGORY_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("S1", "Violent Crimes"),
        ("S2", "Non-Violent Crimes"),
        ("S3", "Sex-Related Crimes"),
        ("S4", "Child Exploitation"),
        ("S5", "Defamation"),
        ("S6", "Specialized Advice"),
        ("S7", "Privacy Violations"),
        ("S8", "Intellectual Property"),
        ("S9", "Weapons / Dangerous Substances"),
        ("S10", "Hate Speech"),
        ("S11", "Suicide & Self-Harm"),
        ("S12", "Sexual Content"),
        ("S13", "Elections"),
    ]
    .into_iter()
    .collect()
});

/// Result of ML-based output safety classification.
#[derive(Debug, Clone)]
pub struct OutputSafetyResult {
    pub safe: bool,
    pub categories: Vec<String>,
    pub category_names: Vec<String>,
    pub raw_response: String,
}

impl OutputSafetyResult {
    fn safe_with(raw_response: impl Into<String>) -> Self {
        Self {
            safe: true,
            categories: Vec::new(),
            category_names: Vec::new(),
            raw_response: raw_response.into(),
        }
    }
}

pub struct OutputSafetyClassifier {
    api_key: String,
    http: reqwest::Client,
}

impl OutputSafetyClassifier {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client builds"),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Classify an LLM response for dangerous content. `user_prompt`
    /// supplies conversational context, when available.
    pub async fn classify_async(&self, response_text: &str, user_prompt: &str) -> OutputSafetyResult {
        if !self.is_available() {
            return OutputSafetyResult::safe_with("classifier_unavailable");
        }
        if response_text.trim().is_empty() {
            return OutputSafetyResult::safe_with("empty_input");
        }

        let mut messages = Vec::new();
        if !user_prompt.is_empty() {
            messages.push(serde_json::json!({"role": "user", "content": user_prompt}));
        }
        messages.push(serde_json::json!({"role": "assistant", "content": response_text}));

        let body = serde_json::json!({
            "model": LLAMA_GUARD_MODEL,
            "messages": messages,
            "temperature": 0.0,
            "max_tokens": 50,
        });

        let response = self
            .http
            .post(GROQ_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) => match resp.json::<serde_json::Value>().await {
                Ok(json) => {
                    let raw = json["choices"][0]["message"]["content"]
                        .as_str()
                        .unwrap_or("safe")
                        .trim()
                        .to_string();
                    self.parse_result(&raw)
                }
                Err(err) => {
                    warn!(error = %err, "llama guard response parse failed");
                    OutputSafetyResult::safe_with(format!("error: {err}"))
                }
            },
            Err(err) => {
                warn!(error = %err, "llama guard classification failed");
                OutputSafetyResult::safe_with(format!("error: {err}"))
            }
        }
    }

    fn parse_result(&self, raw: &str) -> OutputSafetyResult {
        let mut lines = raw.lines();
        let is_safe = lines
            .next()
            .map(|l| l.trim().eq_ignore_ascii_case("safe"))
            .unwrap_or(true);

        let mut categories = Vec::new();
        if !is_safe {
            if let Some(category_line) = lines.next() {
                for part in category_line.split(',') {
                    let code = part.trim().to_ascii_uppercase();
                    if code.starts_with('S') && code.len() <= 3 {
                        categories.push(code);
                    }
                }
            }
        }

        let category_names: Vec<String> = categories
            .iter()
            .map(|c| {
                CATEGORY_NAMES
                    .get(c.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("Unknown ({c})"))
            })
            .collect();

        if !is_safe {
            warn!(?categories, ?category_names, "output flagged unsafe by llama guard");
        } else {
            debug!("output classified as safe by llama guard");
        }

        OutputSafetyResult {
            safe: is_safe,
            categories,
            category_names,
            raw_response: raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_classifier_fails_open() {
        let classifier = OutputSafetyClassifier::new("");
        let result = classifier.classify_async("anything", "").await;
        assert!(result.safe);
        assert_eq!(result.raw_response, "classifier_unavailable");
    }

    #[tokio::test]
    async fn empty_response_is_safe() {
        let classifier = OutputSafetyClassifier::new("fake-key");
        let result = classifier.classify_async("   ", "").await;
        assert!(result.safe);
        assert_eq!(result.raw_response, "empty_input");
    }

    #[test]
    fn parse_unsafe_response_extracts_categories() {
        let classifier = OutputSafetyClassifier::new("fake-key");
        let result = classifier.parse_result("unsafe\nS1,S9");
        assert!(!result.safe);
        assert_eq!(result.categories, vec!["S1", "S9"]);
        assert_eq!(result.category_names, vec!["Violent Crimes", "Weapons / Dangerous Substances"]);
    }

    #[test]
    fn parse_safe_response() {
        let classifier = OutputSafetyClassifier::new("fake-key");
        let result = classifier.parse_result("safe");
        assert!(result.safe);
        assert!(result.categories.is_empty());
    }
}
