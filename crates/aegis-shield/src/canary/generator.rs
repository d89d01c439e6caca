//! Canary token generation and format validation.

use uuid::Uuid;

/// Produces `"{PREFIX}-{v4-UUID}"` canary tokens.
pub struct CanaryGenerator {
    prefix: String,
}

impl CanaryGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn generate(&self) -> String {
        format!("{}-{}", self.prefix, Uuid::new_v4())
    }

    /// True if `candidate` matches this generator's `PREFIX-UUID` shape.
    pub fn validate_format(&self, candidate: &str) -> bool {
        let Some(rest) = candidate.strip_prefix(&format!("{}-", self.prefix)) else {
            return false;
        };
        Uuid::parse_str(rest).is_ok()
    }
}
