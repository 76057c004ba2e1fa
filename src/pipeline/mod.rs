//! Item pipeline
//!
//! Extracted items pass through an ordered chain of processors. Each
//! processor may write the item to a sink and returns the item for the next
//! processor. This module handles:
//! - The `CrawledItem` record
//! - The `ItemProcessor` trait and `Pipeline` dispatch
//! - CSV file and structured log sinks

mod csv_output;
mod item;
mod log_output;

pub use csv_output::CsvItemProcessor;
pub use item::CrawledItem;
pub use log_output::LogItemProcessor;

use crate::config::PipelineConfig;
use crate::{ConfigError, ConfigResult, SinkError};
use std::path::Path;

/// A processor's sink write failed
///
/// Carries the item back so the pipeline can keep passing it downstream.
#[derive(Debug)]
pub struct SinkFailure {
    pub item: CrawledItem,
    pub error: SinkError,
}

impl SinkFailure {
    pub fn new(item: CrawledItem, error: impl Into<SinkError>) -> Self {
        Self {
            item,
            error: error.into(),
        }
    }
}

/// One stage of the pipeline
///
/// A processor owns its sink and any per-sink state (such as whether a
/// header was written).
pub trait ItemProcessor: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Consumes an item and returns the item for the next stage
    fn process_item(&mut self, item: CrawledItem) -> Result<CrawledItem, SinkFailure>;
}

/// Ordered chain of item processors
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn ItemProcessor>>,
    sink_failures: u64,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a processor at the end of the chain
    pub fn with_processor(mut self, processor: impl ItemProcessor + 'static) -> Self {
        self.push(Box::new(processor));
        self
    }

    pub fn push(&mut self, processor: Box<dyn ItemProcessor>) {
        self.processors.push(processor);
    }

    /// Builds the configured processor chain
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Processors in configured order
    /// * `Err(ConfigError)` - Unknown processor name or missing csv-path
    pub fn from_config(config: &PipelineConfig) -> ConfigResult<Self> {
        let mut pipeline = Self::new();

        for name in &config.processors {
            match name.as_str() {
                "log" => pipeline.push(Box::new(LogItemProcessor::stdout())),
                "csv" => {
                    let path = config.csv_path.as_deref().ok_or_else(|| {
                        ConfigError::Validation(
                            "pipeline.csv-path is required by the csv processor".to_string(),
                        )
                    })?;
                    pipeline.push(Box::new(CsvItemProcessor::new(Path::new(path))));
                }
                other => return Err(ConfigError::UnknownProcessor(other.to_string())),
            }
        }

        Ok(pipeline)
    }

    /// Threads an item through every processor in order
    ///
    /// A failing processor is logged and its returned item is handed to the
    /// next processor, so one broken sink never stops the others.
    pub fn process(&mut self, item: CrawledItem) -> CrawledItem {
        let mut current = item;

        for processor in &mut self.processors {
            current = match processor.process_item(current) {
                Ok(next) => next,
                Err(failure) => {
                    self.sink_failures += 1;
                    tracing::error!(
                        "Processor '{}' failed to write item: {}",
                        processor.name(),
                        failure.error
                    );
                    failure.item
                }
            };
        }

        current
    }

    /// Number of sink failures since construction
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures
    }

    pub fn processor_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("processors", &self.processor_names())
            .field("sink_failures", &self.sink_failures)
            .finish()
    }
}
