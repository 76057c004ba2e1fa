//! Link extraction from fetched pages
//!
//! Each routing rule owns a `LinkExtractor`. The default one collects
//! `<a href>` targets and keeps those accepted by a [`LinkMatcher`].

use crate::crawler::fetcher::Page;
use crate::url::{resolve_href, LinkMatcher};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Capability that lists the outgoing links of a page
///
/// Closures `Fn(&Page) -> Vec<String>` are extractors too.
pub trait LinkExtractor: Send + Sync {
    /// Absolute URLs found on the page, in document order
    fn extract_links(&self, page: &Page) -> Vec<String>;
}

impl<F> LinkExtractor for F
where
    F: Fn(&Page) -> Vec<String> + Send + Sync,
{
    fn extract_links(&self, page: &Page) -> Vec<String> {
        (self)(page)
    }
}

/// Extracts `<a href>` links, filtered by an allow/deny matcher
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor {
    matcher: LinkMatcher,
}

impl HtmlLinkExtractor {
    pub fn new(matcher: LinkMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &LinkMatcher {
        &self.matcher
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, page: &Page) -> Vec<String> {
        extract_links(&page.body, &page.final_url)
            .into_iter()
            .filter(|url| self.matcher.matches(url))
            .collect()
    }
}

/// Collects unique `<a href>` targets resolved against `base_url`
///
/// Links carrying a `download` attribute are skipped. `rel="nofollow"`
/// links are kept.
///
/// # Example
///
/// ```
/// use trawl::crawler::extract_links;
///
/// let html = r#"<a href="/item-1">1</a><a href="/item-1">again</a><a href="item-2">2</a>"#;
/// let links = extract_links(html, "https://x.test/list");
/// assert_eq!(links, vec!["https://x.test/item-1", "https://x.test/item-2"]);
/// ```
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_href(href, base_url))
            else {
                continue;
            };

            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    links
}
