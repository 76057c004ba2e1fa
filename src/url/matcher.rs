use crate::ConfigError;
use regex::Regex;

/// Allow/deny pattern pair evaluated against a URL string
///
/// A URL matches iff the allow pattern is absent or matches, and the deny
/// pattern is absent or does not match. With both patterns absent every URL
/// matches, which is different from an allow pattern that matches nothing.
///
/// # Examples
///
/// ```
/// use trawl::url::LinkMatcher;
///
/// let matcher = LinkMatcher::new(Some("^/a"), Some("^/ad")).unwrap();
/// assert!(matcher.matches("/abc"));
/// assert!(!matcher.matches("/ad1"));
/// assert!(!matcher.matches("/xyz"));
///
/// assert!(LinkMatcher::any().matches("/anything"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinkMatcher {
    allow: Option<Regex>,
    deny: Option<Regex>,
}

impl LinkMatcher {
    /// Compiles an allow/deny pair
    ///
    /// Empty pattern strings are treated as absent.
    ///
    /// # Returns
    ///
    /// * `Ok(LinkMatcher)` - Both patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - Either pattern is not a valid regex
    pub fn new(allow: Option<&str>, deny: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            allow: compile(allow)?,
            deny: compile(deny)?,
        })
    }

    /// A matcher with neither pattern, matching every URL
    pub fn any() -> Self {
        Self::default()
    }

    /// Returns true if the URL passes the allow pattern and escapes the deny pattern
    pub fn matches(&self, url: &str) -> bool {
        let allowed = self.allow.as_ref().map_or(true, |re| re.is_match(url));
        let denied = self.deny.as_ref().map_or(false, |re| re.is_match(url));
        allowed && !denied
    }

    /// Returns true if neither pattern is set
    pub fn is_unconditional(&self) -> bool {
        self.allow.is_none() && self.deny.is_none()
    }

    pub fn allow_pattern(&self) -> Option<&str> {
        self.allow.as_ref().map(Regex::as_str)
    }

    pub fn deny_pattern(&self) -> Option<&str> {
        self.deny.as_ref().map(Regex::as_str)
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match pattern {
        Some(p) if !p.is_empty() => Regex::new(p)
            .map(Some)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: p.to_string(),
                source,
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_and_deny() {
        let matcher = LinkMatcher::new(Some("^/a"), Some("^/ad")).unwrap();
        assert!(matcher.matches("/abc"));
        assert!(!matcher.matches("/ad1"));
        assert!(!matcher.matches("/xyz"));
    }

    #[test]
    fn test_no_patterns_matches_everything() {
        let matcher = LinkMatcher::new(None, None).unwrap();
        assert!(matcher.is_unconditional());
        assert!(matcher.matches(""));
        assert!(matcher.matches("https://example.com/"));
        assert!(matcher.matches("mailto:a@b.com"));
    }

    #[test]
    fn test_allow_matching_nothing_is_not_unconditional() {
        let matcher = LinkMatcher::new(Some("^$never"), None).unwrap();
        assert!(!matcher.is_unconditional());
        assert!(!matcher.matches("https://example.com/"));
    }

    #[test]
    fn test_deny_only() {
        let matcher = LinkMatcher::new(None, Some("\\.pdf$")).unwrap();
        assert!(matcher.matches("https://example.com/page"));
        assert!(!matcher.matches("https://example.com/file.pdf"));
    }

    #[test]
    fn test_empty_pattern_is_absent() {
        let matcher = LinkMatcher::new(Some(""), Some("")).unwrap();
        assert!(matcher.is_unconditional());
        assert!(matcher.matches("/anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = LinkMatcher::new(Some("(unclosed"), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));

        let err = LinkMatcher::new(None, Some("[z-a]")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_pattern_accessors() {
        let matcher = LinkMatcher::new(Some("-pr[0-9]+$"), None).unwrap();
        assert_eq!(matcher.allow_pattern(), Some("-pr[0-9]+$"));
        assert_eq!(matcher.deny_pattern(), None);
    }
}
