use crate::url::DEFAULT_EXCLUDED_SCHEMES;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Routing rules, applied in this order
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
    /// Selector-driven page handlers, referenced by name from rules
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from when no pending queue was persisted
    pub seeds: Vec<String>,

    /// Lower bound of the politeness delay (seconds)
    #[serde(rename = "min-delay", default = "default_min_delay")]
    pub min_delay: f64,

    /// Upper bound of the politeness delay (seconds)
    #[serde(rename = "max-delay", default = "default_max_delay")]
    pub max_delay: f64,

    /// Per-page fetch timeout (seconds, 0 disables)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Only accept document/script/xhr/fetch resources
    #[serde(rename = "skip-resource-requests", default = "default_true")]
    pub skip_resource_requests: bool,

    /// URL prefixes that are never enqueued
    #[serde(rename = "excluded-schemes", default = "default_excluded_schemes")]
    pub excluded_schemes: Vec<String>,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    /// Returns the politeness delay bounds as durations
    pub fn delay_bounds(&self) -> (Duration, Duration) {
        (
            Duration::try_from_secs_f64(self.min_delay).unwrap_or_default(),
            Duration::try_from_secs_f64(self.max_delay).unwrap_or_default(),
        )
    }

    /// Returns the fetch timeout, or None when disabled
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout > 0).then(|| Duration::from_secs(self.fetch_timeout))
    }
}

/// Where crawl progress is persisted
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// Directory holding the progress records
    #[serde(default = "default_progress_directory")]
    pub directory: String,

    #[serde(default)]
    pub backend: StorageBackend,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            directory: default_progress_directory(),
            backend: StorageBackend::default(),
        }
    }
}

/// Durable format of the progress records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Two JSON string-list files
    #[default]
    Json,
    /// A single SQLite database
    Sqlite,
}

/// Item pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Processor names, applied in this order
    #[serde(default = "default_processors")]
    pub processors: Vec<String>,

    /// Output file for the `csv` processor
    #[serde(rename = "csv-path")]
    pub csv_path: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            processors: default_processors(),
            csv_path: None,
        }
    }
}

/// One routing rule
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// Pattern a page URL must match
    pub allow: Option<String>,

    /// Pattern a page URL must not match
    pub deny: Option<String>,

    /// Whether links on matching pages are followed
    #[serde(default = "default_true")]
    pub follow: bool,

    /// Name of the page handler producing items for matching pages
    pub handler: Option<String>,

    /// Pattern extracted links must match (defaults to `allow`)
    #[serde(rename = "links-allow")]
    pub links_allow: Option<String>,

    /// Pattern extracted links must not match (defaults to `deny`)
    #[serde(rename = "links-deny")]
    pub links_deny: Option<String>,
}

/// A selector-driven page handler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerConfig {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
}

/// How a single item field is read from the page
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// CSS selector of the element holding the value
    pub selector: String,

    /// Attribute to read instead of the element text
    pub attribute: Option<String>,

    /// Missing required fields fail the extraction; optional ones become ""
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_min_delay() -> f64 {
    7.0
}

fn default_max_delay() -> f64 {
    10.0
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_excluded_schemes() -> Vec<String> {
    DEFAULT_EXCLUDED_SCHEMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_user_agent() -> String {
    format!("trawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_progress_directory() -> String {
    "./history".to_string()
}

fn default_processors() -> Vec<String> {
    vec!["log".to_string()]
}
