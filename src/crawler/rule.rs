//! Routing rules
//!
//! A rule binds a URL pattern pair to two independent behaviors: following
//! the page's links, and extracting an item from the page. Every matching
//! rule applies; configuration order is the only ordering.

use crate::config::RuleConfig;
use crate::crawler::fetcher::Page;
use crate::crawler::handler::{HandlerRegistry, PageHandler};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::url::LinkMatcher;
use crate::{ConfigError, ConfigResult};
use std::sync::Arc;

/// One routing rule
///
/// Immutable once built. Rules are cheap to clone; handlers and extractors
/// are shared.
#[derive(Clone)]
pub struct RoutingRule {
    matcher: LinkMatcher,
    follow: bool,
    handler: Option<(String, Arc<dyn PageHandler>)>,
    extractor: Arc<dyn LinkExtractor>,
}

impl RoutingRule {
    /// Creates a following rule without a handler
    ///
    /// Links are extracted with an [`HtmlLinkExtractor`] using the same
    /// allow/deny patterns as the rule.
    pub fn new(matcher: LinkMatcher) -> Self {
        let extractor = Arc::new(HtmlLinkExtractor::new(matcher.clone()));
        Self {
            matcher,
            follow: true,
            handler: None,
            extractor,
        }
    }

    /// Sets whether links of matching pages are followed
    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Sets the page handler producing items for matching pages
    pub fn with_handler(self, name: impl Into<String>, handler: impl PageHandler + 'static) -> Self {
        self.with_shared_handler(name, Arc::new(handler))
    }

    pub fn with_shared_handler(
        mut self,
        name: impl Into<String>,
        handler: Arc<dyn PageHandler>,
    ) -> Self {
        self.handler = Some((name.into(), handler));
        self
    }

    /// Replaces this rule's link extractor
    pub fn with_link_extractor(mut self, extractor: impl LinkExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Builds a rule from its configuration
    ///
    /// The link extractor filters with `links-allow`/`links-deny` when either
    /// is set, and with the rule's own patterns otherwise.
    ///
    /// # Returns
    ///
    /// * `Ok(RoutingRule)` - The compiled rule
    /// * `Err(ConfigError)` - A pattern does not compile or the handler is unknown
    pub fn from_config(config: &RuleConfig, handlers: &HandlerRegistry) -> ConfigResult<Self> {
        let matcher = LinkMatcher::new(config.allow.as_deref(), config.deny.as_deref())?;

        let mut rule = Self::new(matcher).with_follow(config.follow);

        if config.links_allow.is_some() || config.links_deny.is_some() {
            let link_matcher =
                LinkMatcher::new(config.links_allow.as_deref(), config.links_deny.as_deref())?;
            rule = rule.with_link_extractor(HtmlLinkExtractor::new(link_matcher));
        }

        if let Some(name) = &config.handler {
            let handler = handlers
                .get(name)
                .ok_or_else(|| ConfigError::UnknownHandler(name.clone()))?;
            rule = rule.with_shared_handler(name.as_str(), handler);
        }

        Ok(rule)
    }

    pub fn matches(&self, url: &str) -> bool {
        self.matcher.matches(url)
    }

    pub fn applies_as_follow(&self) -> bool {
        self.follow
    }

    pub fn applies_as_handler(&self) -> Option<&Arc<dyn PageHandler>> {
        self.handler.as_ref().map(|(_, handler)| handler)
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.handler.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn link_extractor(&self) -> &Arc<dyn LinkExtractor> {
        &self.extractor
    }

    /// Runs this rule's link extractor over a page
    pub fn extract_links(&self, page: &Page) -> Vec<String> {
        self.extractor.extract_links(page)
    }

    pub fn matcher(&self) -> &LinkMatcher {
        &self.matcher
    }
}

impl std::fmt::Debug for RoutingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingRule")
            .field("matcher", &self.matcher)
            .field("follow", &self.follow)
            .field("handler", &self.handler_name())
            .finish()
    }
}

/// Ordered collection of routing rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RoutingRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(configs: &[RuleConfig], handlers: &HandlerRegistry) -> ConfigResult<Self> {
        let rules = configs
            .iter()
            .map(|config| RoutingRule::from_config(config, handlers))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn push(&mut self, rule: RoutingRule) {
        self.rules.push(rule);
    }

    /// Rules whose patterns accept `url`, in configuration order
    pub fn matching<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a RoutingRule> + 'a {
        self.rules.iter().filter(move |rule| rule.matches(url))
    }

    /// Link extractors of the matching rules that follow links
    pub fn follow_extractors(&self, url: &str) -> Vec<Arc<dyn LinkExtractor>> {
        self.matching(url)
            .filter(|rule| rule.applies_as_follow())
            .map(|rule| Arc::clone(rule.link_extractor()))
            .collect()
    }

    /// Named handlers of the matching rules
    pub fn handlers(&self, url: &str) -> Vec<(String, Arc<dyn PageHandler>)> {
        self.matching(url)
            .filter_map(|rule| rule.handler.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<RoutingRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = RoutingRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
