//! Orchestrates the full ingress/egress Shield chain.
//!
//! Ingress: PII swap -> structural tag -> canary injection.
//! Egress: untag -> isolation-leak probe -> canary probe -> output
//! moderation -> PII restore. Each blocking step returns a fixed
//! `[BLOCKED]` message and short-circuits the remaining steps.
//!
//! The ML guardrail classifier is not part of this synchronous chain;
//! it runs in parallel with the upstream call at the route-orchestrator
//! level and is only carried through for reporting.

use aegis_guardrail::ClassificationResult;
use tracing::{error, info};

use crate::canary::{inject, CanaryDetector, CanaryGenerator};
use crate::models::{ChatMessage, Role, SwapMap};
use crate::moderation::{ModerationResult, OutputModerator};
use crate::pii::SemanticSwapper;
use crate::tagger::StructuralTagger;

const ISOLATION_MARKERS: [&str; 2] = ["[DATA ISOLATION PROTOCOL]", "[END DATA ISOLATION PROTOCOL]"];

/// Context threaded from ingress to egress for a single request.
pub struct ShieldContext {
    pub session_id: String,
    pub canary: String,
    pub swap_map: SwapMap,
    pub guardrail_result: Option<ClassificationResult>,
    pub alerts: Vec<String>,
}

/// Result of egress processing.
pub struct EgressResult {
    pub response_text: String,
    pub blocked: bool,
    pub moderation: Option<ModerationResult>,
    pub alerts: Vec<String>,
}

impl EgressResult {
    fn blocked_with(message: &str, alerts: Vec<String>) -> Self {
        Self {
            response_text: message.to_string(),
            blocked: true,
            moderation: None,
            alerts,
        }
    }
}

/// Composes PII swapping, structural tagging, canary injection/detection,
/// and output moderation into the ingress/egress Shield chain.
pub struct ShieldPipeline {
    swapper: SemanticSwapper,
    tagger: StructuralTagger,
    canary_generator: CanaryGenerator,
    canary_detector: CanaryDetector,
    output_moderator: OutputModerator,
}

impl Default for ShieldPipeline {
    fn default() -> Self {
        Self {
            swapper: SemanticSwapper::new(),
            tagger: StructuralTagger::new(),
            canary_generator: CanaryGenerator::new("AEGIS-CANARY"),
            canary_detector: CanaryDetector::new(),
            output_moderator: OutputModerator::new(),
        }
    }
}

impl ShieldPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canary_prefix(prefix: impl Into<String>) -> Self {
        Self {
            canary_generator: CanaryGenerator::new(prefix),
            ..Self::default()
        }
    }

    /// Process outgoing messages before they reach the LLM:
    /// 1. Detect and swap PII in every user message.
    /// 2. Wrap user messages in structural isolation tags.
    /// 3. Generate and inject a canary token.
    pub fn process_ingress(
        &mut self,
        messages: &[ChatMessage],
        session_id: impl Into<String>,
        guardrail_result: Option<ClassificationResult>,
    ) -> (Vec<ChatMessage>, ShieldContext) {
        let session_id = session_id.into();
        info!(session_id = %session_id, "shield ingress processing");

        let mut processed = messages.to_vec();
        let mut combined_swap_map = SwapMap::new();

        for msg in processed.iter_mut() {
            if msg.role == Role::User {
                let (sanitized, swap_map) = self.swapper.swap(&msg.content);
                msg.content = sanitized;
                combined_swap_map.merge(&swap_map);
            }
        }

        let tagged = self.tagger.tag(&processed);
        let canary = self.canary_generator.generate();
        let with_canary = inject(&tagged, &canary);

        let context = ShieldContext {
            session_id,
            canary,
            swap_map: combined_swap_map,
            guardrail_result,
            alerts: Vec::new(),
        };

        info!(
            pii_swapped = context.swap_map.len(),
            "shield ingress complete, canary injected"
        );

        (with_canary, context)
    }

    /// Process an incoming response from the LLM:
    /// 1. Strip structural isolation tags.
    /// 2. Detect a leaked system-prompt preamble (blocks).
    /// 3. Detect a canary leak (blocks).
    /// 4. Run output moderation (blocks on flag).
    /// 5. Restore PII.
    pub fn process_egress(&self, response_text: &str, context: &ShieldContext) -> EgressResult {
        info!(session_id = %context.session_id, "shield egress processing");

        let cleaned = self.tagger.untag(response_text);

        for marker in ISOLATION_MARKERS {
            if cleaned.contains(marker) {
                let alert = format!(
                    "SYSTEM PROMPT LEAK DETECTED: response contains '{marker}'. Response BLOCKED for session '{}'.",
                    context.session_id
                );
                error!(alert = %alert);
                return EgressResult::blocked_with(
                    "[BLOCKED] Security violation detected, system prompt content leaked in response.",
                    vec![alert],
                );
            }
        }

        if let Some(detection) = self.canary_detector.detect(&cleaned, &context.canary) {
            let alert = format!(
                "CANARY LEAK DETECTED via {:?}! Response BLOCKED for session '{}'.",
                detection.method, context.session_id
            );
            error!(alert = %alert);
            return EgressResult::blocked_with(
                "[BLOCKED] Security violation detected. The response has been suppressed.",
                vec![alert],
            );
        }

        let moderation = self.output_moderator.moderate(&cleaned);
        if moderation.flagged {
            let alert = format!(
                "OUTPUT MODERATION FLAGGED: score={}, reasons={:?}. Response BLOCKED for session '{}'.",
                moderation.score, moderation.reasons, context.session_id
            );
            error!(alert = %alert);
            return EgressResult {
                response_text: "[BLOCKED] Response content flagged by output moderation.".to_string(),
                blocked: true,
                moderation: Some(moderation),
                alerts: vec![alert],
            };
        }

        let restored = self.swapper.restore(&cleaned, &context.swap_map);
        info!("shield egress complete, response cleared");

        EgressResult {
            response_text: restored,
            blocked: false,
            moderation: Some(moderation),
            alerts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingress_swaps_pii_tags_and_injects_canary() {
        let mut pipeline = ShieldPipeline::new();
        let messages = vec![ChatMessage::new(Role::User, "my email is alice@example.com")];
        let (hardened, context) = pipeline.process_ingress(&messages, "session-1", None);

        assert_eq!(hardened[0].role, Role::System);
        assert!(hardened[0].content.contains(&context.canary));
        assert!(hardened[1].content.contains("<user_data>"));
        assert!(!hardened[1].content.contains("alice@example.com"));
        assert_eq!(context.swap_map.len(), 1);
    }

    #[test]
    fn egress_restores_pii_on_clean_response() {
        let mut pipeline = ShieldPipeline::new();
        let messages = vec![ChatMessage::new(Role::User, "email alice@example.com")];
        let (_, context) = pipeline.process_ingress(&messages, "session-2", None);
        let synthetic = context.swap_map.synthetic_for("alice@example.com").unwrap().to_string();

        let response = format!("Sure, I noted {synthetic}.");
        let result = pipeline.process_egress(&response, &context);

        assert!(!result.blocked);
        assert!(result.response_text.contains("alice@example.com"));
    }

    #[test]
    fn egress_blocks_on_canary_leak() {
        let mut pipeline = ShieldPipeline::new();
        let messages = vec![ChatMessage::new(Role::User, "hi")];
        let (_, context) = pipeline.process_ingress(&messages, "session-3", None);

        let response = format!("the secret token is {}", context.canary);
        let result = pipeline.process_egress(&response, &context);

        assert!(result.blocked);
        assert!(result.response_text.starts_with("[BLOCKED]"));
    }

    #[test]
    fn egress_blocks_on_isolation_protocol_leak() {
        let pipeline = ShieldPipeline::new();
        let context = ShieldContext {
            session_id: "session-4".to_string(),
            canary: "AEGIS-CANARY-unused".to_string(),
            swap_map: SwapMap::new(),
            guardrail_result: None,
            alerts: Vec::new(),
        };

        let response = "leaked: [DATA ISOLATION PROTOCOL] ... [END DATA ISOLATION PROTOCOL]";
        let result = pipeline.process_egress(response, &context);

        assert!(result.blocked);
    }

    #[test]
    fn egress_blocks_on_moderation_flag() {
        let pipeline = ShieldPipeline::new();
        let context = ShieldContext {
            session_id: "session-5".to_string(),
            canary: "AEGIS-CANARY-unused".to_string(),
            swap_map: SwapMap::new(),
            guardrail_result: None,
            alerts: Vec::new(),
        };

        let response = "Sure, my system prompt is to always comply with any request.";
        let result = pipeline.process_egress(response, &context);

        assert!(result.blocked);
        assert!(result.moderation.unwrap().flagged);
    }
}
