//! Strips executable HTML/JS constructs from user text: `<script>`,
//! `<style>`, comments, inline event handlers, and data URIs.

use std::borrow::Cow;
use std::sync::LazyLock;

use lol_html::{element, HtmlRewriter, Settings};
use regex::Regex;

static HTML_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*\w+[\s>]|<!--").unwrap());
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\son\w+\s*=\s*("[^"]*"|'[^']*')"#).unwrap());
static DATA_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:\w+/[\w.+-]+;base64,[A-Za-z0-9+/=]+").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\n]+").unwrap());

const DATA_URI_PLACEHOLDER: &str = "[DATA_URI_REMOVED]";

/// Counts of code constructs neutralized, without mutating the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeCounts {
    pub script_tags: usize,
    pub style_tags: usize,
    pub html_comments: usize,
    pub event_handlers: usize,
    pub data_uris: usize,
}

impl CodeCounts {
    pub fn total(&self) -> usize {
        self.script_tags + self.style_tags + self.html_comments + self.event_handlers + self.data_uris
    }
}

/// Stateless HTML/JS flattener.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeFlattener;

impl CodeFlattener {
    pub fn new() -> Self {
        Self
    }

    fn looks_like_html(text: &str) -> bool {
        HTML_LIKE.is_match(text)
    }

    /// Count constructs without mutating `text`.
    pub fn detect_code(&self, text: &str) -> CodeCounts {
        let mut counts = CodeCounts {
            event_handlers: EVENT_HANDLER.find_iter(text).count(),
            data_uris: DATA_URI.find_iter(text).count(),
            ..Default::default()
        };
        if Self::looks_like_html(text) {
            counts.html_comments = text.matches("<!--").count();
            counts.script_tags = count_tag(text, "script");
            counts.style_tags = count_tag(text, "style");
        }
        counts
    }

    /// Decompose dangerous HTML/JS, strip event handlers, neutralize data
    /// URIs. Leaves non-HTML-like prose untouched.
    pub fn flatten<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let stage1 = if Self::looks_like_html(text) {
            match strip_html(text) {
                Ok(stripped) => Cow::Owned(collapse_whitespace(&stripped).into_owned()),
                Err(_) => Cow::Borrowed(text),
            }
        } else {
            Cow::Borrowed(text)
        };

        let stage2 = strip_event_handlers(&stage1);
        let stage3 = neutralize_data_uris(&stage2);
        stage3.into_owned().into()
    }
}

fn count_tag(text: &str, tag: &str) -> usize {
    let open = format!("<{tag}");
    text.to_ascii_lowercase().matches(&open).count()
}

fn strip_html(input: &str) -> Result<String, String> {
    let mut output = Vec::with_capacity(input.len());
    {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element!("*", |el| {
                    let tag = el.tag_name();
                    if tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style") {
                        el.remove();
                    } else {
                        el.remove_and_keep_content();
                    }
                    Ok(())
                })],
                ..Settings::default()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );
        rewriter.write(input.as_bytes()).map_err(|e| e.to_string())?;
        rewriter.end().map_err(|e| e.to_string())?;
    }
    let text = String::from_utf8(output).map_err(|e| e.to_string())?;
    Ok(strip_html_comments(&text))
}

fn strip_html_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("<!--") {
        result.push_str(&rest[..start]);
        rest = &rest[start..];
        if let Some(end) = rest.find("-->") {
            rest = &rest[end + 3..];
        } else {
            rest = "";
            break;
        }
    }
    result.push_str(rest);
    result
}

fn strip_event_handlers(input: &str) -> Cow<'_, str> {
    EVENT_HANDLER.replace_all(input, "")
}

fn neutralize_data_uris(input: &str) -> Cow<'_, str> {
    DATA_URI.replace_all(input, DATA_URI_PLACEHOLDER)
}

fn collapse_whitespace(input: &str) -> Cow<'_, str> {
    WHITESPACE_RUN.replace_all(input.trim(), " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tag() {
        let flattener = CodeFlattener::new();
        let out = flattener.flatten("hello <script>alert(1)</script> world");
        assert!(!out.contains("script"));
        assert!(out.contains("hello"));
        assert!(out.contains("world"));
    }

    #[test]
    fn strips_event_handler_attribute() {
        let flattener = CodeFlattener::new();
        let out = flattener.flatten(r#"<img src=x onerror="alert(1)">"#);
        assert!(!out.to_lowercase().contains("onerror"));
    }

    #[test]
    fn neutralizes_data_uri() {
        let flattener = CodeFlattener::new();
        let out = flattener.flatten("data:text/html;base64,PHNjcmlwdD4=");
        assert_eq!(out, "[DATA_URI_REMOVED]");
    }

    #[test]
    fn leaves_plain_prose_untouched() {
        let flattener = CodeFlattener::new();
        let text = "just plain prose, no markup here at all";
        let out = flattener.flatten(text);
        assert_eq!(out, text);
    }

    #[test]
    fn detect_code_counts_without_mutating() {
        let flattener = CodeFlattener::new();
        let text = "<script>x()</script><!-- hi --><style>a{}</style>";
        let counts = flattener.detect_code(text);
        assert_eq!(counts.script_tags, 1);
        assert_eq!(counts.style_tags, 1);
        assert_eq!(counts.html_comments, 1);
    }
}
