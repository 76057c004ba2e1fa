//! Integration tests for the crawler
//!
//! Most tests drive the engine with an in-process stub fetcher so whole
//! crawls run instantly; `crawl_tests` also runs a config-driven crawl
//! against a wiremock server.

mod common;
mod crawl_tests;
mod resume_tests;
