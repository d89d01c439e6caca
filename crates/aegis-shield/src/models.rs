//! Shared data types for the Shield pipeline: chat messages, PII matches,
//! and the bidirectional swap map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a chat message, mirroring the OpenAI-compatible wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message. The shape threaded through the entire ingress
/// and egress chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Kind of PII a [`PiiMatch`] or synthetic value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
    DateOfBirth,
    Person,
    Org,
    Gpe,
}

impl PiiKind {
    /// All regex-backed structured kinds, in detection order.
    pub fn structured_kinds() -> &'static [PiiKind] {
        &[
            PiiKind::Email,
            PiiKind::Phone,
            PiiKind::Ssn,
            PiiKind::CreditCard,
            PiiKind::IpAddress,
            PiiKind::DateOfBirth,
        ]
    }
}

/// A single detected PII span over the original text.
///
/// Invariant: `0 <= start < end <= text.len()` (byte offsets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiMatch {
    pub kind: PiiKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl PiiMatch {
    pub fn new(kind: PiiKind, value: impl Into<String>, start: usize, end: usize) -> Self {
        debug_assert!(start < end, "PiiMatch span must be non-empty");
        Self {
            kind,
            value: value.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True if this match's span overlaps `other`'s.
    pub fn overlaps(&self, other: &PiiMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Bidirectional mapping between real PII values and their synthetic
/// stand-ins, plus a kind annotation for each real value.
///
/// Invariants: injective in both directions — a real value maps to
/// exactly one synthetic value for the lifetime of the map, and vice
/// versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapMap {
    pub real_to_synthetic: HashMap<String, String>,
    pub synthetic_to_real: HashMap<String, String>,
    pub entity_types: HashMap<String, PiiKind>,
}

impl SwapMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.real_to_synthetic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real_to_synthetic.is_empty()
    }

    /// Look up an existing synthetic for a real value, if one was
    /// already registered (reuse path in the swap algorithm).
    pub fn synthetic_for(&self, real: &str) -> Option<&str> {
        self.real_to_synthetic.get(real).map(String::as_str)
    }

    /// Register a new real<->synthetic pair. Idempotent: re-registering
    /// the same real value with the same synthetic is a no-op.
    pub fn add(&mut self, real: impl Into<String>, synthetic: impl Into<String>, kind: PiiKind) {
        let real = real.into();
        let synthetic = synthetic.into();
        self.entity_types.insert(real.clone(), kind);
        self.synthetic_to_real
            .insert(synthetic.clone(), real.clone());
        self.real_to_synthetic.insert(real, synthetic);
    }

    /// Merge another map's entries into this one. Used by the Shield
    /// ingress chain to combine per-message swap maps into a session-wide
    /// one.
    pub fn merge(&mut self, other: &SwapMap) {
        for (real, synthetic) in &other.real_to_synthetic {
            let kind = other
                .entity_types
                .get(real)
                .copied()
                .unwrap_or(PiiKind::Person);
            self.add(real.clone(), synthetic.clone(), kind);
        }
    }
}
