//! Session token extraction
//!
//! The admin portal does not return the token in a structured form: it is
//! embedded in the HTML of the page served after login. Extraction sits
//! behind `TokenExtractor` so the scraping strategy can change without
//! touching the session itself.

use std::sync::LazyLock;

use regex::Regex;

/// Pulls a session token out of a login response body
pub trait TokenExtractor: Send + Sync {
    /// Return the token, or `None` if the body does not carry one
    fn extract(&self, body: &str) -> Option<String>;
}

static TOKEN_DIV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\s+id\s*=\s*["']token["'][^>]*>\s*([^<]*?)\s*</div>"#)
        .expect("Invalid regex")
});

/// Reads the token from the `<div id="token">` element of the admin page
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTokenExtractor;

impl TokenExtractor for HtmlTokenExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        TOKEN_DIV
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .find(|token| !token.is_empty())
            .map(str::to_string)
    }
}
