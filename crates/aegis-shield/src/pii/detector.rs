//! Regex-backed PII detection plus an optional NER collaborator stub.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{PiiKind, PiiMatch};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap()
});
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\+1[\s.-]?)?(\(\d{3}\)[\s.-]?|\d{3}[\s.-])\d{3}[\s.-]\d{4}\b").unwrap()
});
static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static CREDIT_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(4\d{3}|5[1-5]\d{2}|3[47]\d{2}|6011|65\d{2})([\s-]?\d{4}){2}[\s-]?\d{1,4}\b")
        .unwrap()
});
static IP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(25[0-5]|2[0-4]\d|1?\d?\d)(\.(25[0-5]|2[0-4]\d|1?\d?\d)){3}\b").unwrap()
});
static DATE_OF_BIRTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4}|\d{4}-\d{2}-\d{2})\b").unwrap()
});

fn pattern_for(kind: PiiKind) -> Option<&'static Regex> {
    match kind {
        PiiKind::Email => Some(&EMAIL),
        PiiKind::Phone => Some(&PHONE),
        PiiKind::Ssn => Some(&SSN),
        PiiKind::CreditCard => Some(&CREDIT_CARD),
        PiiKind::IpAddress => Some(&IP_ADDRESS),
        PiiKind::DateOfBirth => Some(&DATE_OF_BIRTH),
        PiiKind::Person | PiiKind::Org | PiiKind::Gpe => None,
    }
}

/// Entity span surfaced by an NER collaborator.
#[derive(Debug, Clone)]
pub struct NerSpan {
    pub kind: PiiKind,
    pub start: usize,
    pub end: usize,
}

/// Narrow collaborator interface for named-entity recognition. No
/// implementation is bundled; an implementer may plug in a remote or
/// local NER service.
pub trait NerCollaborator: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<NerSpan>;
}

/// Regex-only PII detector. `enabled_kinds` restricts which structured
/// patterns run; `extra_patterns` appends additional (kind, pattern) pairs.
pub struct PiiDetector {
    enabled_kinds: Vec<PiiKind>,
    extra_patterns: Vec<(PiiKind, Regex)>,
    ner: Option<Box<dyn NerCollaborator>>,
}

impl Default for PiiDetector {
    fn default() -> Self {
        Self {
            enabled_kinds: PiiKind::structured_kinds().to_vec(),
            extra_patterns: Vec::new(),
            ner: None,
        }
    }
}

impl PiiDetector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_enabled_kinds(mut self, kinds: Vec<PiiKind>) -> Self {
        self.enabled_kinds = kinds;
        self
    }

    #[must_use]
    pub fn with_extra_pattern(mut self, kind: PiiKind, pattern: Regex) -> Self {
        self.extra_patterns.push((kind, pattern));
        self
    }

    #[must_use]
    pub fn with_ner(mut self, ner: Box<dyn NerCollaborator>) -> Self {
        self.ner = Some(ner);
        self
    }

    /// Detect all PII spans, deduplicated (longest span wins at a given
    /// start, first-seen tiebreak), sorted by start offset.
    pub fn detect(&self, text: &str) -> Vec<PiiMatch> {
        let mut matches = Vec::new();

        for &kind in &self.enabled_kinds {
            if let Some(pattern) = pattern_for(kind) {
                for m in pattern.find_iter(text) {
                    matches.push(PiiMatch::new(kind, m.as_str(), m.start(), m.end()));
                }
            }
        }
        for (kind, pattern) in &self.extra_patterns {
            for m in pattern.find_iter(text) {
                matches.push(PiiMatch::new(*kind, m.as_str(), m.start(), m.end()));
            }
        }
        if let Some(ner) = &self.ner {
            for span in ner.recognize(text) {
                if span.end.saturating_sub(span.start) < 2 {
                    continue;
                }
                let value = &text[span.start..span.end];
                matches.push(PiiMatch::new(span.kind, value, span.start, span.end));
            }
        }

        dedup_overlaps(matches)
    }
}

/// Sort by `(start, -(end-start))` then greedily keep the first match at
/// each covered offset, discarding any later match that overlaps an
/// already-kept one.
fn dedup_overlaps(mut matches: Vec<PiiMatch>) -> Vec<PiiMatch> {
    matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

    let mut kept: Vec<PiiMatch> = Vec::with_capacity(matches.len());
    for candidate in matches {
        if kept.iter().any(|existing| existing.overlaps(&candidate)) {
            continue;
        }
        kept.push(candidate);
    }
    kept.sort_by_key(|m| m.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_email() {
        let detector = PiiDetector::new();
        let matches = detector.detect("contact me at alice@example.com please");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, PiiKind::Email);
    }

    #[test]
    fn detects_ssn_not_bare_digit_run() {
        let detector = PiiDetector::new();
        let matches = detector.detect("SSN 123-45-6789 but not 123456789");
        assert!(matches.iter().any(|m| m.kind == PiiKind::Ssn));
        assert_eq!(matches.iter().filter(|m| m.kind == PiiKind::Ssn).count(), 1);
    }

    #[test]
    fn detects_ipv4() {
        let detector = PiiDetector::new();
        let matches = detector.detect("connect to 192.168.1.1 now");
        assert!(matches.iter().any(|m| m.kind == PiiKind::IpAddress));
    }

    #[test]
    fn dedup_keeps_longest_overlapping_span() {
        let matches = vec![
            PiiMatch::new(PiiKind::Email, "a@b.com", 0, 7),
            PiiMatch::new(PiiKind::Person, "a@b.c", 0, 5),
        ];
        let deduped = dedup_overlaps(matches);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].kind, PiiKind::Email);
    }

    #[test]
    fn results_sorted_by_start() {
        let detector = PiiDetector::new();
        let matches = detector.detect("192.168.1.1 then email bob@acme.io later");
        assert!(matches.windows(2).all(|w| w[0].start <= w[1].start));
    }
}
