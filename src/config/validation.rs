use crate::config::types::{Config, CrawlerConfig, HandlerConfig, PipelineConfig, RuleConfig};
use crate::url::LinkMatcher;
use crate::ConfigError;
use scraper::Selector;
use std::collections::BTreeMap;
use url::Url;

/// Processor names the pipeline knows how to build
pub const KNOWN_PROCESSORS: &[&str] = &["log", "csv"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_progress_directory(&config.progress.directory)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_rules(&config.rules)?;
    validate_handlers(&config.handlers)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        validate_seed(seed)?;
    }

    if !config.min_delay.is_finite() || !config.max_delay.is_finite() {
        return Err(ConfigError::Validation(
            "min-delay and max-delay must be finite numbers".to_string(),
        ));
    }

    if config.min_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min-delay must be >= 0, got {}",
            config.min_delay
        )));
    }

    if config.min_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "min-delay ({}) must not exceed max-delay ({})",
            config.min_delay, config.max_delay
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Seeds must be absolute http(s) URLs
fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    Ok(())
}

fn validate_progress_directory(directory: &str) -> Result<(), ConfigError> {
    if directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "progress directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates pipeline configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    for name in &config.processors {
        if !KNOWN_PROCESSORS.contains(&name.as_str()) {
            return Err(ConfigError::UnknownProcessor(name.clone()));
        }
    }

    let wants_csv = config.processors.iter().any(|p| p == "csv");
    let has_path = config
        .csv_path
        .as_deref()
        .map_or(false, |p| !p.trim().is_empty());

    if wants_csv && !has_path {
        return Err(ConfigError::Validation(
            "csv-path is required when the csv processor is configured".to_string(),
        ));
    }

    Ok(())
}

/// Compiles every rule pattern once so bad regexes fail before crawling
fn validate_rules(rules: &[RuleConfig]) -> Result<(), ConfigError> {
    if rules.is_empty() {
        tracing::warn!("No routing rules configured; only seed pages will be fetched");
    }

    for rule in rules {
        LinkMatcher::new(rule.allow.as_deref(), rule.deny.as_deref())?;
        LinkMatcher::new(rule.links_allow.as_deref(), rule.links_deny.as_deref())?;

        if let Some(handler) = &rule.handler {
            if handler.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "rule handler name cannot be empty".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Parses every field selector of every handler
fn validate_handlers(handlers: &BTreeMap<String, HandlerConfig>) -> Result<(), ConfigError> {
    for (name, handler) in handlers {
        for (field, spec) in &handler.fields {
            if field.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "handler '{}' has a field with an empty name",
                    name
                )));
            }
            parse_selector(&spec.selector)?;
        }
    }
    Ok(())
}

/// Compiles a CSS selector, mapping failures to a config error
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
