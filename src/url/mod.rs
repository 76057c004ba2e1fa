//! URL handling module for Trawl
//!
//! URLs are opaque strings compared by exact equality. This module provides
//! the allow/deny pattern matching used by routing rules and link extractors,
//! and the scheme exclusion predicate applied before URLs reach the frontier.

mod filter;
mod matcher;

pub use filter::{SchemeFilter, DEFAULT_EXCLUDED_SCHEMES};
pub use matcher::LinkMatcher;

use url::Url;

/// Resolves an href against the URL of the page it was found on
///
/// Returns None for empty or fragment-only hrefs and for anything that does
/// not resolve to an absolute URL. Scheme filtering is left to
/// [`SchemeFilter`] so excluded links are dropped in one place.
///
/// # Examples
///
/// ```
/// use trawl::url::resolve_href;
///
/// assert_eq!(
///     resolve_href("/item-1", "https://x.test/list"),
///     Some("https://x.test/item-1".to_string())
/// );
/// assert_eq!(resolve_href("#top", "https://x.test/list"), None);
/// ```
pub fn resolve_href(href: &str, base: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.to_string());
    }

    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
