//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve an href found on a page, keeping an empty href empty.
pub fn resolve_link(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    match base {
        Some(base) if !href.is_empty() => resolve_url(base, href),
        _ => href.to_string(),
    }
}
