//! Page fetching
//!
//! This module defines the `PageFetcher` capability the engine drives and
//! the default HTTP implementation, including:
//! - Building the HTTP client with the configured user agent
//! - Per-request timeouts
//! - Resource-type filtering by Content-Type
//! - Error classification into `FetchError`

use crate::config::CrawlerConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;

/// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL that was requested (the frontier identity)
    pub url: String,

    /// URL after redirects, used as the base for relative links
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value (empty if absent)
    pub content_type: String,

    /// Page body
    pub body: String,
}

impl Page {
    /// Creates a 200 text/html page whose final URL equals `url`
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: 200,
            content_type: "text/html".to_string(),
            body: body.into(),
        }
    }
}

/// Per-fetch options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on the whole request, None for no limit
    pub timeout: Option<Duration>,

    /// Reject resources other than documents, scripts, and xhr/fetch payloads
    pub skip_resource_requests: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            skip_resource_requests: true,
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            timeout: config.fetch_timeout(),
            skip_resource_requests: config.skip_resource_requests,
        }
    }
}

/// Capability that turns a URL into a page
///
/// The engine awaits one fetch at a time and owns its fetcher exclusively.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Page, FetchError>;
}

/// Default fetcher performing plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

/// Builds an HTTP client with the configured user agent
///
/// Timeouts are applied per request from [`FetchOptions`].
///
/// # Example
///
/// ```no_run
/// use trawl::config::load_config;
/// use trawl::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("trawl.toml")).unwrap();
/// let client = build_http_client(&config.crawler).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Page, FetchError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        tracing::debug!("Response {} from {} for {}", status.as_u16(), final_url, url);

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if options.skip_resource_requests && !is_allowed_resource(&content_type) {
            return Err(FetchError::ResourceFiltered {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(Page {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Returns true for content types a document, script, or xhr/fetch request yields
///
/// A missing Content-Type is treated as a document.
pub fn is_allowed_resource(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if mime.is_empty() {
        return true;
    }

    matches!(
        mime.as_str(),
        "text/html"
            | "application/xhtml+xml"
            | "text/plain"
            | "text/javascript"
            | "application/javascript"
            | "application/x-javascript"
            | "application/ecmascript"
            | "application/json"
            | "text/json"
    ) || mime.ends_with("+json")
}
