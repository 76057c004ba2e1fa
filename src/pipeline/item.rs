use serde::Serialize;
use serde_json::{Map, Value};

/// A structured record produced by a page handler
///
/// The crawl engine never inspects the fields; it only moves the item from
/// the handler into the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CrawledItem(Map<String, Value>);

impl CrawledItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the item with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field names in serialization order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders a field as a flat string: strings verbatim, null and missing as ""
    pub fn field_text(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for CrawledItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<CrawledItem> for Value {
    fn from(item: CrawledItem) -> Self {
        Value::Object(item.0)
    }
}
