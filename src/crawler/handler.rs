//! Page handlers turn fetched pages into structured items
//!
//! This module provides:
//! - The `PageHandler` capability invoked by matching routing rules
//! - `SelectorHandler`, a CSS-selector driven handler built from config
//! - `HandlerRegistry`, the name lookup rules resolve handlers through

use crate::config::{parse_selector, FieldConfig, HandlerConfig};
use crate::crawler::fetcher::Page;
use crate::pipeline::CrawledItem;
use crate::{ConfigResult, ExtractionError};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Capability that extracts one item from a page
///
/// Plain closures `Fn(&Page) -> Result<CrawledItem, ExtractionError>` are
/// handlers too.
#[async_trait]
pub trait PageHandler: Send + Sync {
    async fn extract_item(&self, page: &Page) -> Result<CrawledItem, ExtractionError>;
}

#[async_trait]
impl<F> PageHandler for F
where
    F: Fn(&Page) -> Result<CrawledItem, ExtractionError> + Send + Sync,
{
    async fn extract_item(&self, page: &Page) -> Result<CrawledItem, ExtractionError> {
        (self)(page)
    }
}

/// How one item field is located
#[derive(Debug, Clone)]
struct FieldExtractor {
    name: String,
    selector: Selector,
    attribute: Option<String>,
    required: bool,
}

impl FieldExtractor {
    fn read(&self, document: &Html) -> Option<String> {
        let element = document.select(&self.selector).next()?;
        match &self.attribute {
            Some(attribute) => element.value().attr(attribute).map(|v| v.trim().to_string()),
            None => Some(element_text(&element)),
        }
    }
}

/// Element text with runs of whitespace collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Handler reading item fields through CSS selectors
///
/// The first element matching a field's selector supplies the value: its
/// text, or the configured attribute. Every item also carries the page URL
/// under `url`.
///
/// # Example
///
/// ```
/// use trawl::config::{FieldConfig, HandlerConfig};
/// use trawl::crawler::{Page, PageHandler, SelectorHandler};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut config = HandlerConfig::default();
/// config.fields.insert(
///     "title".to_string(),
///     FieldConfig { selector: "h1".to_string(), attribute: None, required: true },
/// );
/// let handler = SelectorHandler::from_config(&config).unwrap();
///
/// let page = Page::html("https://x.test/flat-pr1", "<h1> Sunny   flat </h1>");
/// let item = handler.extract_item(&page).await.unwrap();
/// assert_eq!(item.field_text("title"), "Sunny flat");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SelectorHandler {
    fields: Vec<FieldExtractor>,
}

impl SelectorHandler {
    /// Compiles the configured field selectors
    pub fn from_config(config: &HandlerConfig) -> ConfigResult<Self> {
        let fields = config
            .fields
            .iter()
            .map(|(name, field)| compile_field(name, field))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self { fields })
    }

    /// Field names in extraction order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn extract(&self, page: &Page) -> Result<CrawledItem, ExtractionError> {
        let document = Html::parse_document(&page.body);
        let mut item = CrawledItem::new().with("url", page.url.as_str());

        for field in &self.fields {
            match field.read(&document) {
                Some(value) => item.insert(field.name.as_str(), value),
                None if field.required => {
                    return Err(ExtractionError::MissingField {
                        url: page.url.clone(),
                        field: field.name.clone(),
                    });
                }
                None => item.insert(field.name.as_str(), ""),
            }
        }

        Ok(item)
    }
}

fn compile_field(name: &str, field: &FieldConfig) -> ConfigResult<FieldExtractor> {
    Ok(FieldExtractor {
        name: name.to_string(),
        selector: parse_selector(&field.selector)?,
        attribute: field.attribute.clone(),
        required: field.required,
    })
}

#[async_trait]
impl PageHandler for SelectorHandler {
    async fn extract_item(&self, page: &Page) -> Result<CrawledItem, ExtractionError> {
        // The parsed document is not Send, so it must not live across an await
        self.extract(page)
    }
}

/// Named page handlers that routing rules refer to
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn PageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `SelectorHandler` for every `[handlers.NAME]` table
    pub fn from_config(handlers: &BTreeMap<String, HandlerConfig>) -> ConfigResult<Self> {
        let mut registry = Self::new();
        for (name, config) in handlers {
            registry.register(name.as_str(), SelectorHandler::from_config(config)?);
        }
        Ok(registry)
    }

    /// Adds or replaces the handler called `name`
    pub fn register(&mut self, name: impl Into<String>, handler: impl PageHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PageHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
