//! Markup to plain-text projection.
//!
//! Editor content is stored as an HTML-like string and passed through storage
//! untouched. Titles and previews need a plain-text view of it, which is what
//! this module produces. It is not an HTML parser: it only needs to be good
//! enough to find the first visible line of text.

use once_cell::sync::Lazy;
use regex::Regex;

static INVISIBLE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<head\b.*?</head\s*>|<style\b.*?</style\s*>|<script\b.*?</script\s*>")
        .expect("valid invisible block regex")
});
static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|tr|blockquote|pre)\s*>")
        .expect("valid line break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Converts editor markup into plain text, keeping line structure.
///
/// Content without any markup characters is returned unchanged.
pub fn to_plain_text(content: &str) -> String {
    if !content.contains('<') && !content.contains('&') {
        return content.to_string();
    }

    let visible = INVISIBLE_BLOCK_RE.replace_all(content, "");
    let with_breaks = LINE_BREAK_RE.replace_all(&visible, "\n");
    let without_tags = TAG_RE.replace_all(&with_breaks, "");
    decode_entities(&without_tags)
}

/// Returns the first line of `content` that has visible text, trimmed.
pub fn first_visible_line(content: &str) -> Option<String> {
    to_plain_text(content)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Collapses all whitespace in the plain-text view and keeps `max_chars`.
pub fn summarize(content: &str, max_chars: usize) -> Option<String> {
    let plain = to_plain_text(content);
    let collapsed = WHITESPACE_RE.replace_all(&plain, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(max_chars).collect())
    }
}

fn decode_entities(value: &str) -> String {
    // `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
