//! # Aegis Guardrail
//!
//! ML-backed classification layer: the ingress prompt-guard classifier
//! (pluggable remote/local backends, resolved lazily) and the egress
//! output-safety classifier (LLaMA Guard via Groq). Both fail open —
//! an unavailable backend never blocks a request, it only removes one
//! layer of defense. The deterministic, rules-based Output Moderator
//! lives in `aegis-shield` since it runs synchronously inside the
//! Shield egress chain rather than in parallel with the upstream call.

mod backend;
mod classification;
mod classifier;
mod output_safety;

pub use backend::{GroqBackend, GuardrailBackend, LocalAcceleratedBackend, LocalReferenceBackend, RawScore};
pub use classification::{ClassificationResult, GuardrailLabel};
pub use classifier::{PromptInjectionClassifier, DEFAULT_MODEL};
pub use output_safety::{OutputSafetyClassifier, OutputSafetyResult};
