//! Narrow collaborator interface for scanning attached image blobs for
//! hidden text. No implementation is bundled; this stays out of scope.
//! A [`NoopOcrScanner`] satisfies the trait and always returns no alerts.

/// An OCR finding surfaced alongside the Lens result. Text is never
/// altered by OCR; alerts are informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrAlert {
    pub message: String,
}

/// Scans an image blob for embedded or hidden text instructions.
pub trait OcrScanner: Send + Sync {
    fn scan(&self, image_bytes: &[u8]) -> Vec<OcrAlert>;
}

/// Always-empty scanner; the default collaborator when OCR is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOcrScanner;

impl OcrScanner for NoopOcrScanner {
    fn scan(&self, _image_bytes: &[u8]) -> Vec<OcrAlert> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_scanner_returns_no_alerts() {
        let scanner = NoopOcrScanner;
        assert!(scanner.scan(b"fake-image-bytes").is_empty());
    }
}
