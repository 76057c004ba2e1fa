//! Trawl: a polite, resumable web crawler
//!
//! This crate walks a link graph from seed URLs, routes every visited URL
//! through a list of allow/deny rules that decide whether to follow its links
//! and/or extract a structured item, and feeds extracted items through an
//! ordered processing pipeline. Crawl progress is persisted after every page
//! so an interrupted crawl resumes where it stopped.

pub mod config;
pub mod crawler;
pub mod pipeline;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Every variant is fatal: the crawl does not begin.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Unknown page handler: {0}")]
    UnknownHandler(String),

    #[error("Unknown pipeline processor: {0}")]
    UnknownProcessor(String),

    #[error("Unreadable crawl progress: {0}")]
    Progress(#[from] storage::StorageError),
}

/// Failure to fetch a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Resource type '{content_type}' filtered for {url}")]
    ResourceFiltered { url: String, content_type: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
}

/// Failure of a page handler to produce an item
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Missing field '{field}' on {url}")]
    MissingField { url: String, field: String },

    #[error("Malformed page {url}: {message}")]
    Malformed { url: String, message: String },
}

/// Failure of a pipeline processor to write to its sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlReport, Frontier, RoutingRule};
pub use pipeline::{CrawledItem, Pipeline};
pub use state::CrawlPhase;
pub use storage::{ProgressSnapshot, ProgressStore};
pub use crate::url::LinkMatcher;
