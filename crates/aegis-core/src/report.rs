//! [`SecurityReport`] — the non-standard object attached to every
//! chat-completions response, summarizing what the ingress/egress
//! chains did to a request.

use serde::{Deserialize, Serialize};

/// Final security disposition of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityVerdict {
    /// No alerts, nothing blocked.
    Pass,
    /// Processing completed but one or more alerts were recorded.
    Warn,
    /// The request or response was suppressed.
    Block,
}

impl Default for SecurityVerdict {
    fn default() -> Self {
        Self::Pass
    }
}

/// Security processing report attached to each chat-completions response.
///
/// A frozen value object: built once via [`SecurityReport::builder`] (or
/// mutated field-by-field by the single owner assembling it — the
/// Security Middleware — and never touched again afterward).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Overall disposition.
    pub verdict: SecurityVerdict,
    /// Number of PII entities swapped during ingress.
    pub pii_entities_swapped: usize,
    /// Whether a canary token was injected into the system prompt.
    pub canary_injected: bool,
    /// Whether a canary leak was detected at egress.
    pub canary_leaked: bool,
    /// Invisible/zero-width characters removed by the Lens.
    pub lens_invisible_chars: usize,
    /// Executable code constructs neutralized by the Lens.
    pub lens_code_constructs: usize,
    /// Label assigned by the ingress guardrail classifier.
    pub input_guardrail_label: String,
    /// Top score assigned by the ingress guardrail classifier.
    pub input_guardrail_score: f64,
    /// Score assigned by the rules-based output moderator, in [1,5].
    pub output_moderation_score: u8,
    /// Whether the output moderator flagged the response.
    pub output_moderation_flagged: bool,
    /// Human-readable alerts accumulated across the pipeline.
    pub alerts: Vec<String>,
}

impl SecurityReport {
    /// A fresh report with defaults: verdict `pass`, no counters set.
    pub fn new() -> Self {
        Self {
            input_guardrail_label: "benign".to_string(),
            output_moderation_score: 1,
            ..Default::default()
        }
    }

    /// Append an alert and, unless already blocked, downgrade the verdict
    /// to `warn`. Mirrors the middleware's "alerts imply warn unless a
    /// block already happened" rule.
    pub fn add_alert(&mut self, alert: impl Into<String>) {
        self.alerts.push(alert.into());
        if self.verdict == SecurityVerdict::Pass {
            self.verdict = SecurityVerdict::Warn;
        }
    }

    /// Mark the report as blocked. Idempotent.
    pub fn mark_blocked(&mut self) {
        self.verdict = SecurityVerdict::Block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_report_defaults_to_pass() {
        let report = SecurityReport::new();
        assert_eq!(report.verdict, SecurityVerdict::Pass);
        assert_eq!(report.input_guardrail_label, "benign");
    }

    #[test]
    fn alert_downgrades_to_warn_not_block() {
        let mut report = SecurityReport::new();
        report.add_alert("something odd");
        assert_eq!(report.verdict, SecurityVerdict::Warn);
    }

    #[test]
    fn mark_blocked_overrides_warn() {
        let mut report = SecurityReport::new();
        report.add_alert("odd");
        report.mark_blocked();
        assert_eq!(report.verdict, SecurityVerdict::Block);
    }
}
