//! Reversible PII swap: replaces detected spans with synthetic
//! stand-ins, and restores them later.

use tracing::warn;

use super::detector::PiiDetector;
use super::generator::SyntheticGenerator;
use crate::models::SwapMap;

pub struct SemanticSwapper {
    detector: PiiDetector,
    generator: SyntheticGenerator,
}

impl Default for SemanticSwapper {
    fn default() -> Self {
        Self {
            detector: PiiDetector::new(),
            generator: SyntheticGenerator::new(),
        }
    }
}

impl SemanticSwapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            detector: PiiDetector::new(),
            generator: SyntheticGenerator::from_seed(seed),
        }
    }

    /// Detect PII, replace each span with a synthetic value, and return
    /// the swapped text plus the map recording every substitution.
    ///
    /// Spans are spliced in reverse start-offset order so earlier
    /// offsets stay valid as the string shrinks or grows.
    pub fn swap(&mut self, text: &str) -> (String, SwapMap) {
        let mut matches = self.detector.detect(text);
        matches.sort_by_key(|m| std::cmp::Reverse(m.start));

        let mut map = SwapMap::new();
        let mut output = text.to_string();

        for m in &matches {
            let synthetic = match map.synthetic_for(&m.value) {
                Some(existing) => existing.to_string(),
                None => self.generator.generate(m.kind),
            };
            map.add(m.value.clone(), synthetic.clone(), m.kind);
            output.replace_range(m.start..m.end, &synthetic);
        }

        (output, map)
    }

    /// Replace every synthetic value in `text` with its real counterpart.
    /// Synthetics the model mutated (no longer present verbatim) are
    /// logged and skipped rather than corrupting the text.
    pub fn restore(&self, text: &str, map: &SwapMap) -> String {
        let mut output = text.to_string();
        for (synthetic, real) in &map.synthetic_to_real {
            if output.contains(synthetic.as_str()) {
                output = output.replace(synthetic.as_str(), real);
            } else {
                warn!(synthetic = %synthetic, "synthetic PII value missing from output, skipping restore");
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_then_restore_round_trips() {
        let mut swapper = SemanticSwapper::with_seed(99);
        let original = "email me at alice@example.com about the contract";
        let (swapped, map) = swapper.swap(original);
        assert!(!swapped.contains("alice@example.com"));
        let restored = swapper.restore(&swapped, &map);
        assert_eq!(restored, original);
    }

    #[test]
    fn repeated_real_value_reuses_synthetic() {
        let mut swapper = SemanticSwapper::with_seed(3);
        let original = "bob@acme.io emailed bob@acme.io twice";
        let (swapped, map) = swapper.swap(original);
        assert_eq!(map.len(), 1);
        let synthetic = map.synthetic_for("bob@acme.io").unwrap();
        assert_eq!(swapped.matches(synthetic).count(), 2);
    }

    #[test]
    fn restore_skips_missing_synthetic_gracefully() {
        let swapper = SemanticSwapper::new();
        let map = SwapMap::new();
        let text = "nothing to restore here";
        assert_eq!(swapper.restore(text, &map), text);
    }
}
