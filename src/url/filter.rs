/// Schemes that are never enqueued when no list is configured
pub const DEFAULT_EXCLUDED_SCHEMES: &[&str] = &["mailto:", "javascript:", "tel:", "data:"];

/// Exclusion predicate applied to URLs before they reach the frontier
///
/// A URL is excluded when it starts with any of the configured scheme
/// prefixes, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeFilter {
    prefixes: Vec<String>,
}

impl SchemeFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A filter that excludes nothing
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        let url = url.trim_start();
        self.prefixes.iter().any(|prefix| {
            url.get(..prefix.len())
                .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for SchemeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_SCHEMES)
    }
}
