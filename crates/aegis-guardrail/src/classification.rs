//! Classification labels and results shared across backends.

use std::collections::HashMap;

/// Label predicted by the ingress prompt-guard model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardrailLabel {
    Benign,
    Injection,
    Jailbreak,
}

impl GuardrailLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Benign => "benign",
            Self::Injection => "injection",
            Self::Jailbreak => "jailbreak",
        }
    }
}

/// Result of classifying a single piece of text. Frozen once built.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub label: GuardrailLabel,
    pub score: f64,
    pub scores: HashMap<String, f64>,
    pub threshold_exceeded: bool,
    pub model_name: String,
}

impl ClassificationResult {
    pub fn benign_fallback() -> Self {
        let mut scores = HashMap::new();
        scores.insert("benign".to_string(), 1.0);
        Self {
            label: GuardrailLabel::Benign,
            score: 1.0,
            scores,
            threshold_exceeded: false,
            model_name: "fallback".to_string(),
        }
    }
}
