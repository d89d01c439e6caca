//! The Lens: stateless content-sanitization layer applied to user
//! messages before they reach the Shield's ingress chain.

mod code_flattener;
mod ocr;
mod unicode_normalizer;

pub use code_flattener::{CodeCounts, CodeFlattener};
pub use ocr::{NoopOcrScanner, OcrAlert, OcrScanner};
pub use unicode_normalizer::{SuspicionCounts, UnicodeNormalizer};

use std::sync::Arc;

/// Aggregate stats and sanitized output from a single Lens pass.
#[derive(Debug, Clone, Default)]
pub struct LensResult {
    pub sanitized_text: String,
    pub invisible_chars_found: usize,
    pub homoglyphs_found: usize,
    pub code_constructs_found: usize,
    pub ocr_alerts: Vec<OcrAlert>,
}

/// Composes the Unicode Normalizer and Code Flattener, plus an optional
/// OCR collaborator, into a single sanitization pass.
pub struct LensPipeline {
    normalizer: UnicodeNormalizer,
    flattener: CodeFlattener,
    ocr: Arc<dyn OcrScanner>,
}

impl Default for LensPipeline {
    fn default() -> Self {
        Self {
            normalizer: UnicodeNormalizer::new(),
            flattener: CodeFlattener::new(),
            ocr: Arc::new(NoopOcrScanner),
        }
    }
}

impl LensPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a non-default OCR collaborator (out of scope by default;
    /// callers may wire in a real implementation).
    #[must_use]
    pub fn with_ocr_scanner(mut self, scanner: Arc<dyn OcrScanner>) -> Self {
        self.ocr = scanner;
        self
    }

    /// Measure suspicious counts, normalize Unicode, measure code-construct
    /// counts, flatten code. Stateless and idempotent.
    pub fn process(&self, text: &str) -> LensResult {
        let suspicion = self.normalizer.detect_suspicious(text);
        let normalized = self.normalizer.normalize(text);
        let code_counts = self.flattener.detect_code(&normalized);
        let flattened = self.flattener.flatten(&normalized);

        LensResult {
            sanitized_text: flattened.into_owned(),
            invisible_chars_found: suspicion.invisible_count,
            homoglyphs_found: suspicion.homoglyph_count,
            code_constructs_found: code_counts.total(),
            ocr_alerts: Vec::new(),
        }
    }

    /// As [`LensPipeline::process`], but also scans an attached image
    /// blob via the OCR collaborator. Its alerts are appended; the text
    /// is unaffected.
    pub fn process_with_image(&self, text: &str, image_bytes: &[u8]) -> LensResult {
        let mut result = self.process(text);
        result.ocr_alerts = self.ocr.scan(image_bytes);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_reports_both_stats() {
        let pipeline = LensPipeline::new();
        let result = pipeline.process("Hеllo\u{200B} world <script>x()</script>");
        assert!(result.homoglyphs_found >= 1);
        assert!(result.invisible_chars_found >= 1);
        assert!(result.code_constructs_found >= 1);
        assert!(!result.sanitized_text.contains("script"));
    }

    #[test]
    fn process_is_idempotent() {
        let pipeline = LensPipeline::new();
        let once = pipeline.process("plain text, nothing to see");
        let twice = pipeline.process(&once.sanitized_text);
        assert_eq!(once.sanitized_text, twice.sanitized_text);
    }
}
