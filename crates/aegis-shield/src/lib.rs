//! # Aegis Shield
//!
//! The synchronous ingress/egress security pipeline: sanitizes user
//! content (Lens), detects and reversibly swaps PII, wraps messages in
//! structural isolation tags, and manages the canary token lifecycle.
//!
//! ## Threat coverage
//!
//! | Layer | Module | Threats blocked |
//! |-------|--------|------------------|
//! | Lens | [`lens`] | Homoglyph evasion, invisible characters, hidden HTML/JS |
//! | PII | [`pii`] | PII exfiltration to the upstream LLM provider |
//! | Canary | [`canary`] | System-prompt leakage, prompt exfiltration |
//! | Tagger | [`tagger`] | Instruction/data confusion (prompt injection) |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         AEGIS SHIELD                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │               ┌──────────────────┐                              │
//! │               │  ShieldPipeline  │  ← ingress/egress facade     │
//! │               └────────┬─────────┘                              │
//! │                        │                                        │
//! │      ┌─────────────────┼─────────────────┐                      │
//! │      ▼                 ▼                 ▼                      │
//! │ ┌──────────┐    ┌─────────────┐   ┌─────────────┐                │
//! │ │   pii    │    │   tagger    │   │   canary    │                │
//! │ └──────────┘    └─────────────┘   └─────────────┘                │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Lens module is stateless and idempotent; it normalizes content
//! *before* the Shield ingress chain ever sees it (wired together by
//! `aegis-proxy`'s Security Middleware). The Shield's own ingress and
//! egress chains are purely synchronous and deterministic — no network
//! or ML calls happen here. The guardrail classifier and output-safety
//! classifier live in `aegis-guardrail` and are invoked by the Route
//! Orchestrator, not by this crate.

pub mod canary;
pub mod lens;
pub mod models;
pub mod moderation;
pub mod pii;
pub mod pipeline;
pub mod tagger;

pub use models::{ChatMessage, PiiKind, PiiMatch, Role, SwapMap};
pub use moderation::{ModerationResult, OutputModerator};
pub use pipeline::{EgressResult, ShieldContext, ShieldPipeline};
