//! Shared fixtures for integration tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use trawl::config::{load_config, Config};
use trawl::crawler::{FetchOptions, Page, PageFetcher};
use trawl::pipeline::{CrawledItem, ItemProcessor, SinkFailure};
use trawl::FetchError;

/// Serves fixed HTML bodies; any other URL fails to resolve
#[derive(Clone, Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubFetcher {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            calls: Arc::default(),
        }
    }

    /// URLs fetched so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(body) => Ok(Page::html(url, body.as_str())),
            None => Err(FetchError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }
}

/// Pipeline stage keeping every item it sees
#[derive(Clone, Default)]
pub struct Collect {
    items: Arc<Mutex<Vec<CrawledItem>>>,
}

impl Collect {
    pub fn items(&self) -> Vec<CrawledItem> {
        self.items.lock().unwrap().clone()
    }
}

impl ItemProcessor for Collect {
    fn name(&self) -> &str {
        "collect"
    }

    fn process_item(&mut self, item: CrawledItem) -> Result<CrawledItem, SinkFailure> {
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }
}

pub fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Writes `content` to `trawl.toml` in `dir` and loads it
pub fn write_config(dir: &Path, content: &str) -> Config {
    let path = dir.join("trawl.toml");
    std::fs::write(&path, content).unwrap();
    load_config(&path).unwrap()
}

/// Escapes a path for use inside a TOML basic string
pub fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}
