//! Cleaning and validation of untrusted form text.
//!
//! None of these functions fail: unsafe content is dropped and the caller
//! receives whatever survives, possibly an empty string.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Tags that survive [`clean_html`].
pub const ALLOWED_TAGS: [&str; 14] = [
    "a", "b", "i", "u", "em", "strong", "p", "br", "ul", "ol", "li", "h2", "h3", "img",
];

const LINK_ATTRIBUTES: [&str; 4] = ["href", "title", "rel", "target"];
const IMAGE_ATTRIBUTES: [&str; 4] = ["src", "alt", "width", "height"];

/// Longest file name produced by [`sanitize_filename`].
pub const MAX_FILENAME_LEN: usize = 120;

static IFRAME_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src=["']([^"']+)["']"#).expect("valid iframe src pattern"));

static FILENAME_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid filename pattern"));

fn policy() -> ammonia::Builder<'static> {
    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", LINK_ATTRIBUTES.into_iter().collect::<HashSet<_>>());
    tag_attributes.insert("img", IMAGE_ATTRIBUTES.into_iter().collect::<HashSet<_>>());

    let mut builder = ammonia::Builder::new();
    builder
        .tags(ALLOWED_TAGS.into_iter().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        // `rel` is user-controlled here, so ammonia must not inject its own.
        .link_rel(None);
    builder
}

/// Strip `text` down to the allowlisted tags and attributes.
///
/// Disallowed tags are removed but their text is kept; `script` and `style`
/// are removed together with their content.
pub fn clean_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    policy().clean(text).to_string()
}

/// Rebuild a Google Maps embed from pasted iframe markup.
///
/// Only the `src` attribute of the input is kept, and only when it points at
/// a Google host or path. Anything else yields an empty string.
pub fn clean_iframe(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || !raw.contains("<iframe") {
        return String::new();
    }

    let Some(src) = IFRAME_SRC.captures(raw).and_then(|c| c.get(1)) else {
        return String::new();
    };
    let src = src.as_str();

    if !is_google_embed(src) {
        return String::new();
    }

    format!(
        r#"<iframe src="{src}" width="600" height="450" style="border:0;" loading="lazy" referrerpolicy="no-referrer-when-downgrade" allowfullscreen></iframe>"#
    )
}

fn is_google_embed(src: &str) -> bool {
    let parsed = if src.starts_with("//") {
        Url::parse(&format!("https:{src}"))
    } else {
        Url::parse(src)
    };
    let Ok(url) = parsed else {
        return false;
    };

    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    host.contains("google") || url.path().contains("google")
}

/// Whether `text` is an absolute http(s) URL with a host.
///
/// Only used to warn about a suspicious production URL.
pub fn validate_url(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Append a `/` unless `text` is empty or already ends with one.
pub fn ensure_trailing_slash(text: &str) -> String {
    if text.is_empty() || text.ends_with('/') {
        text.to_string()
    } else {
        format!("{text}/")
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    FILENAME_UNSAFE
        .replace_all(name, "_")
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAPS_SRC: &str = "https://www.google.com/maps/embed?pb=!1m18!1m12";

    #[test]
    fn test_clean_html_empty() {
        assert_eq!(clean_html(""), "");
    }

    #[test]
    fn test_clean_html_drops_script() {
        let cleaned = clean_html("<script>alert('x')</script><p>Hello</p>");
        assert_eq!(cleaned, "<p>Hello</p>");
        assert!(!cleaned.contains("<script"));
    }

    #[test]
    fn test_clean_html_keeps_text_of_disallowed_tags() {
        assert_eq!(clean_html("<div><b>Bold</b> move</div>"), "<b>Bold</b> move");
    }

    #[test]
    fn test_clean_html_strips_event_handlers() {
        assert_eq!(
            clean_html(r#"<a href="https://example.com" onclick="steal()">Go</a>"#),
            r#"<a href="https://example.com">Go</a>"#
        );
    }

    #[test]
    fn test_clean_html_keeps_link_rel() {
        let cleaned = clean_html(r#"<a href="https://example.com" rel="nofollow">Go</a>"#);
        assert!(cleaned.contains(r#"rel="nofollow""#));
    }

    #[test]
    fn test_clean_html_restricts_image_attributes() {
        let cleaned = clean_html(r#"<img src="https://example.com/a.png" alt="A" class="hero">"#);
        assert!(cleaned.contains(r#"src="https://example.com/a.png""#));
        assert!(cleaned.contains(r#"alt="A""#));
        assert!(!cleaned.contains("class"));
    }

    #[test]
    fn test_clean_iframe_rebuilds_google_embed() {
        let raw = format!(
            r#"<iframe src="{MAPS_SRC}" width="100" height="100" onload="evil()"></iframe>"#
        );
        let cleaned = clean_iframe(&raw);
        assert!(cleaned.starts_with(&format!(r#"<iframe src="{MAPS_SRC}""#)));
        assert!(cleaned.contains(r#"width="600""#));
        assert!(cleaned.contains(r#"height="450""#));
        assert!(cleaned.contains(r#"loading="lazy""#));
        assert!(!cleaned.contains("onload"));
    }

    #[test]
    fn test_clean_iframe_accepts_single_quotes() {
        let cleaned = clean_iframe(&format!("<iframe src='{MAPS_SRC}'></iframe>"));
        assert!(cleaned.contains(MAPS_SRC));
    }

    #[test]
    fn test_clean_iframe_rejects_non_google() {
        assert_eq!(
            clean_iframe(r#"<iframe src="https://evil.example/embed"></iframe>"#),
            ""
        );
    }

    #[test]
    fn test_clean_iframe_rejects_missing_iframe_or_src() {
        assert_eq!(clean_iframe(""), "");
        assert_eq!(clean_iframe(MAPS_SRC), "");
        assert_eq!(clean_iframe("<iframe></iframe>"), "");
    }

    #[test]
    fn test_clean_iframe_rejects_script_scheme() {
        assert_eq!(
            clean_iframe(r#"<iframe src="javascript:google()"></iframe>"#),
            ""
        );
    }

    #[test]
    fn test_clean_iframe_protocol_relative() {
        let cleaned = clean_iframe(r#"<iframe src="//maps.google.com/maps?q=x"></iframe>"#);
        assert!(cleaned.contains(r#"src="//maps.google.com/maps?q=x""#));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com"));
        assert!(validate_url("http://example.com/site/"));
        assert!(!validate_url("not a url"));
        assert!(!validate_url("ftp://example.com"));
        assert!(!validate_url(""));
    }

    #[test]
    fn test_ensure_trailing_slash() {
        assert_eq!(ensure_trailing_slash(""), "");
        assert_eq!(ensure_trailing_slash("https://a.io"), "https://a.io/");
        assert_eq!(ensure_trailing_slash("https://a.io/"), "https://a.io/");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("red hippo/(planners).zip"), "red_hippo__planners_.zip");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), MAX_FILENAME_LEN);
    }
}
