//! NFKC normalization, invisible-character stripping, and homoglyph
//! flattening.

use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_normalization::{is_nfkc_quick, IsNormalized, UnicodeNormalization};

/// Zero-width, bidi-control, and formatting code points stripped when
/// `strip_invisible` is enabled.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' // ZWSP
        | '\u{200C}' // ZWNJ
        | '\u{200D}' // ZWJ
        | '\u{FEFF}' // BOM
        | '\u{00AD}' // soft hyphen
        | '\u{200E}' | '\u{200F}' // LRM / RLM
        | '\u{202A}'..='\u{202E}' // LRE RLE PDF LRO RLO
        | '\u{2060}' // WJ
        | '\u{2061}'..='\u{2064}' // invisible math operators
        | '\u{2066}'..='\u{2069}' // LRI RLI FSI PDI
        | '\u{180E}' // Mongolian vowel separator
    )
}

/// Cyrillic/Greek homoglyphs and exotic spaces, flattened to ASCII.
static HOMOGLYPH_MAP: LazyLock<std::collections::HashMap<char, char>> = LazyLock::new(|| {
    let pairs: &[(char, char)] = &[
        // Cyrillic -> Latin
        ('А', 'A'), ('В', 'B'), ('С', 'C'), ('Е', 'E'), ('Н', 'H'), ('К', 'K'),
        ('М', 'M'), ('О', 'O'), ('Р', 'P'), ('Т', 'T'), ('Х', 'X'),
        ('а', 'a'), ('е', 'e'), ('о', 'o'), ('р', 'p'), ('с', 'c'), ('х', 'x'),
        ('у', 'y'), ('і', 'i'),
        // Greek -> Latin
        ('Α', 'A'), ('Β', 'B'), ('Ε', 'E'), ('Ζ', 'Z'), ('Η', 'H'), ('Ι', 'I'),
        ('Κ', 'K'), ('Μ', 'M'), ('Ν', 'N'), ('Ο', 'O'), ('Ρ', 'P'), ('Τ', 'T'),
        ('Υ', 'Y'), ('Χ', 'X'), ('ο', 'o'),
        // exotic spaces -> U+0020
        ('\u{00A0}', ' '), ('\u{1680}', ' '), ('\u{2000}', ' '), ('\u{2001}', ' '),
        ('\u{2002}', ' '), ('\u{2003}', ' '), ('\u{2004}', ' '), ('\u{2005}', ' '),
        ('\u{2006}', ' '), ('\u{2007}', ' '), ('\u{2008}', ' '), ('\u{2009}', ' '),
        ('\u{200A}', ' '), ('\u{202F}', ' '), ('\u{205F}', ' '), ('\u{3000}', ' '),
    ];
    pairs.iter().copied().collect()
});

/// Counts of suspicious code points found, without mutating the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuspicionCounts {
    pub invisible_count: usize,
    pub homoglyph_count: usize,
}

/// Stateless Unicode normalizer. Default configuration strips invisible
/// characters and flattens homoglyphs in addition to NFKC folding.
#[derive(Debug, Clone, Copy)]
pub struct UnicodeNormalizer {
    strip_invisible: bool,
    flatten_homoglyphs: bool,
}

impl Default for UnicodeNormalizer {
    fn default() -> Self {
        Self {
            strip_invisible: true,
            flatten_homoglyphs: true,
        }
    }
}

impl UnicodeNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strip_invisible(mut self, enabled: bool) -> Self {
        self.strip_invisible = enabled;
        self
    }

    #[must_use]
    pub fn with_flatten_homoglyphs(mut self, enabled: bool) -> Self {
        self.flatten_homoglyphs = enabled;
        self
    }

    /// Count suspicious code points without mutating `text`.
    pub fn detect_suspicious(&self, text: &str) -> SuspicionCounts {
        let mut counts = SuspicionCounts::default();
        for c in text.chars() {
            if is_invisible(c) {
                counts.invisible_count += 1;
            }
            if HOMOGLYPH_MAP.contains_key(&c) {
                counts.homoglyph_count += 1;
            }
        }
        counts
    }

    /// Apply NFKC folding, invisible-character stripping, and homoglyph
    /// flattening. Idempotent.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let nfkc = nfkc_fold(text);
        let after_invisible = if self.strip_invisible {
            strip_invisible_chars(&nfkc)
        } else {
            nfkc.clone()
        };
        if self.flatten_homoglyphs {
            flatten_homoglyphs(&after_invisible)
        } else {
            after_invisible
        }
        .into_owned()
        .into()
    }
}

fn nfkc_fold(input: &str) -> Cow<'_, str> {
    if is_nfkc_quick(input.chars()) == IsNormalized::Yes {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.nfkc().collect())
    }
}

fn strip_invisible_chars(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_invisible) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.chars().filter(|c| !is_invisible(*c)).collect())
}

fn flatten_homoglyphs(input: &str) -> Cow<'_, str> {
    if !input.chars().any(|c| HOMOGLYPH_MAP.contains_key(&c)) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(
        input
            .chars()
            .map(|c| HOMOGLYPH_MAP.get(&c).copied().unwrap_or(c))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_zero_width_space() {
        let normalizer = UnicodeNormalizer::new();
        let out = normalizer.normalize("hello\u{200B}world");
        assert_eq!(out, "helloworld");
    }

    #[test]
    fn flattens_cyrillic_homoglyphs() {
        let normalizer = UnicodeNormalizer::new();
        let out = normalizer.normalize("Hеllo"); // Cyrillic е
        assert_eq!(out, "Hello");
    }

    #[test]
    fn detect_suspicious_does_not_mutate() {
        let normalizer = UnicodeNormalizer::new();
        let input = "Hеllo\u{200B} world";
        let counts = normalizer.detect_suspicious(input);
        assert_eq!(counts.homoglyph_count, 1);
        assert_eq!(counts.invisible_count, 1);
    }

    #[test]
    fn normalize_is_idempotent() {
        let normalizer = UnicodeNormalizer::new();
        let once = normalizer.normalize("Hеllo\u{200B} world");
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn plain_ascii_is_borrowed_fast_path() {
        let normalizer = UnicodeNormalizer::new();
        let out = normalizer.normalize("plain ascii text");
        assert_eq!(out, "plain ascii text");
    }
}
