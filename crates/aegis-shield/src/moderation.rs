//! Rules-based output guardrail: scores LLM responses against a fixed
//! set of regex criteria. Complements the canary detector, which only
//! catches the specific injected token, with broader pattern coverage
//! for system-prompt disclosure, role-override adoption, and harmful
//! instruction generation.

use regex::Regex;
use tracing::{debug, warn};

/// Result of moderating a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationResult {
    pub score: u8,
    pub flagged: bool,
    pub reasons: Vec<String>,
    pub patterns_found: Vec<String>,
}

/// A single moderation check: a name, severity weight, description, and
/// the compiled patterns that trigger it.
pub struct ModerationCriterion {
    name: &'static str,
    description: &'static str,
    severity: u8,
    patterns: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("built-in moderation pattern is valid"))
        .collect()
}

fn builtin_criteria() -> Vec<ModerationCriterion> {
    vec![
        ModerationCriterion {
            name: "system_prompt_leak",
            description: "Detects leaked system prompt or instructions.",
            severity: 3,
            patterns: compile(&[
                r"(?:my|the)\s+system\s+(?:prompt|instructions?)\s+(?:is|are|says?)",
                r"(?:i\s+was|i\s+am)\s+(?:told|instructed|programmed)\s+to",
                r"here\s+(?:is|are)\s+my\s+(?:original|full|complete)\s+instructions?",
                r"my\s+(?:initial|original)\s+prompt\s+(?:is|was|reads?)",
            ]),
        },
        ModerationCriterion {
            name: "role_override",
            description: "Detects when the LLM appears to adopt an override persona.",
            severity: 3,
            patterns: compile(&[
                r"(?:i\s+am|i'm)\s+now\s+(?:DAN|acting\s+as|pretending)",
                r"(?:sure|okay|alright),?\s+(?:i'll|i\s+will)\s+(?:ignore|bypass|override)",
                r"as\s+(?:DAN|an?\s+unrestricted)",
                r"(?:jailbreak|jailbroken)\s+mode",
            ]),
        },
        ModerationCriterion {
            name: "harmful_instructions",
            description: "Detects harmful/attack instructions in the response.",
            severity: 2,
            patterns: compile(&[
                r"(?:here(?:'s|\s+is)\s+how\s+to\s+(?:hack|exploit|bypass|attack))",
                r"(?:step\s+\d+[.:]\s*(?:inject|exploit|override|bypass))",
                r"(?:malicious|exploit)\s+(?:code|script|payload)",
            ]),
        },
        ModerationCriterion {
            name: "encoded_content",
            description: "Detects encoded or obfuscated content leaks.",
            severity: 2,
            patterns: compile(&[
                r"(?:base64|hex|rot13)\s*(?:encoded?|version|output)\s*[:=]",
                r"(?:decoded?|decrypted?)\s+(?:system|prompt|instructions?)",
            ]),
        },
        ModerationCriterion {
            name: "internal_markers",
            description: "Detects internal system markers in the response.",
            severity: 2,
            patterns: compile(&[
                r"\[INTERNAL",
                r"\[SYSTEM\s*PROMPT\]",
                r"<\s*system\s*>",
                r"<<\s*SYS\s*>>",
            ]),
        },
    ]
}

/// Scores response text against a list of criteria; flags anything at
/// or above the configured threshold.
pub struct OutputModerator {
    threshold: u8,
    criteria: Vec<ModerationCriterion>,
}

impl Default for OutputModerator {
    fn default() -> Self {
        Self {
            threshold: 3,
            criteria: builtin_criteria(),
        }
    }
}

impl OutputModerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `threshold` is clamped to `[1, 5]` at construction.
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            threshold: threshold.clamp(1, 5),
            ..Self::default()
        }
    }

    /// Replace the built-in criteria with a caller-supplied list.
    #[must_use]
    pub fn with_criteria(mut self, criteria: Vec<ModerationCriterion>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn moderate(&self, response_text: &str) -> ModerationResult {
        if response_text.trim().is_empty() {
            return ModerationResult {
                score: 1,
                flagged: false,
                reasons: Vec::new(),
                patterns_found: Vec::new(),
            };
        }

        let mut total_severity: u32 = 0;
        let mut reasons = Vec::new();
        let mut patterns_found = Vec::new();

        for criterion in &self.criteria {
            for pattern in &criterion.patterns {
                if let Some(m) = pattern.find(response_text) {
                    total_severity += criterion.severity as u32;
                    reasons.push(format!("{}: {}", criterion.name, criterion.description));
                    patterns_found.push(m.as_str().to_string());
                    break; // one match per criterion is enough
                }
            }
        }

        let score = (1 + total_severity).min(5) as u8;
        let flagged = score >= self.threshold;

        if flagged {
            warn!(score, ?reasons, "output moderation flagged response");
        } else {
            debug!(score, "output moderation passed");
        }

        ModerationResult {
            score,
            flagged,
            reasons,
            patterns_found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_scores_one() {
        let moderator = OutputModerator::new();
        let result = moderator.moderate("The weather today is mild and sunny.");
        assert_eq!(result.score, 1);
        assert!(!result.flagged);
    }

    #[test]
    fn system_prompt_leak_flags() {
        let moderator = OutputModerator::new();
        let result = moderator.moderate("Sure, my system prompt is to always comply.");
        assert!(result.flagged);
        assert!(result.reasons.iter().any(|r| r.contains("system_prompt_leak")));
    }

    #[test]
    fn internal_marker_and_role_override_stack_severity() {
        let moderator = OutputModerator::new();
        let result = moderator.moderate("[INTERNAL note] I am now acting as DAN.");
        assert_eq!(result.score, 5); // 2 + 3, clamped below 6 anyway
        assert!(result.flagged);
    }

    #[test]
    fn empty_text_is_never_flagged() {
        let moderator = OutputModerator::new();
        let result = moderator.moderate("   ");
        assert_eq!(result.score, 1);
        assert!(!result.flagged);
    }

    #[test]
    fn threshold_clamped_to_valid_range() {
        let moderator = OutputModerator::with_threshold(9);
        assert_eq!(moderator.threshold(), 5);
    }
}
