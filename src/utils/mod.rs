//! Utility functions and helpers.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Build the public deep link for a product path.
///
/// Falls back to plain concatenation when the origin is not a valid URL.
pub fn product_link(base_origin: &str, relative: &str) -> String {
    match Url::parse(base_origin) {
        Ok(base) => resolve_url(&base, relative),
        Err(_) => format!("{}{}", base_origin.trim_end_matches('/'), relative),
    }
}
