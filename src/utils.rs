//! Text and URL helpers shared by the pipeline stages.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip markup and collapse whitespace before text goes to the
/// generative-text service.
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Drop trailing publisher suffixes (" - Publisher", "| Section") that feed
/// aggregators append to headlines.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title;
    if let Some(idx) = cleaned.find(" - ") {
        cleaned = &cleaned[..idx];
    }
    if let Some(idx) = cleaned.find('|') {
        cleaned = &cleaned[..idx];
    }
    cleaned.trim().to_string()
}

/// Truncate to at most `max_chars` characters, never splitting a code
/// point. Devanagari text makes byte-index slicing unsafe here.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncated fallback text used when a rewrite call fails: the original
/// content capped to `max_chars` with a trailing ellipsis.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() == text.len() {
        text.to_string()
    } else {
        format!("{}...", cut)
    }
}

/// True for absolute http(s) URLs.
pub fn is_valid_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_entities() {
        let html = "<p>Hello&nbsp;<b>world</b> &amp; friends</p>";
        assert_eq!(strip_html(html), "Hello world & friends");
    }

    #[test]
    fn cleans_publisher_suffix() {
        assert_eq!(clean_title("Headline - Divya Marathi"), "Headline");
        assert_eq!(clean_title("Headline | Sports"), "Headline");
        assert_eq!(clean_title("Plain headline"), "Plain headline");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        let text = "\u{092a}\u{0941}\u{0923}\u{0947} shahar";
        assert_eq!(truncate_chars(text, 2), "\u{092a}\u{0941}");
        assert_eq!(truncate_chars(text, 100), text);
    }

    #[test]
    fn validates_urls() {
        assert!(is_valid_url("https://example.com/a.jpg"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("not a url"));
    }
}
