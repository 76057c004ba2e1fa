//! Crawler module for the crawl-control engine
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier (pending queue plus visited set)
//! - Routing rules and their link extractors and page handlers
//! - Page fetching and the randomized politeness delay
//! - The crawl loop and its run report

mod delay;
mod engine;
mod fetcher;
mod frontier;
mod handler;
mod parser;
mod rule;
pub mod stats;

pub use delay::PolitenessDelay;
pub use engine::{compile_config, load_frontier, run_crawl, CrawlEngine, StepOutcome};
pub use fetcher::{build_http_client, is_allowed_resource, FetchOptions, HttpFetcher, Page, PageFetcher};
pub use frontier::Frontier;
pub use handler::{HandlerRegistry, PageHandler, SelectorHandler};
pub use parser::{extract_links, HtmlLinkExtractor, LinkExtractor};
pub use rule::{RoutingRule, RuleSet};
pub use stats::{CrawlOutcome, CrawlReport};
