//! Crawl statistics
//!
//! This module provides the per-run `CrawlReport` kept by the engine and a
//! summary of the persisted progress for the `--stats` command.

use crate::storage::{ProgressStore, StorageResult};
use chrono::{DateTime, Utc};

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The frontier ran empty
    Drained,
    /// A shutdown was requested; progress was flushed
    Interrupted,
}

/// Counters for one run of the crawl loop
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<CrawlOutcome>,

    /// Pages fetched successfully
    pub fetched: u64,

    /// URLs abandoned because the fetch failed
    pub fetch_failures: u64,

    /// Dequeued URLs that were already visited
    pub skipped: u64,

    /// URLs added to the frontier from extracted links
    pub links_enqueued: u64,

    /// Items handed to the pipeline
    pub items: u64,

    pub extraction_failures: u64,
    pub sink_failures: u64,

    /// Progress saves that failed during the run
    pub save_failures: u64,

    /// Frontier sizes when the run ended
    pub visited: usize,
    pub pending: usize,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
            fetched: 0,
            fetch_failures: 0,
            skipped: 0,
            links_enqueued: 0,
            items: 0,
            extraction_failures: 0,
            sink_failures: 0,
            save_failures: 0,
            visited: 0,
            pending: 0,
        }
    }

    /// Stamps the end of the run
    pub fn finish(&mut self, outcome: CrawlOutcome, visited: usize, pending: usize) {
        self.finished_at = Some(Utc::now());
        self.outcome = Some(outcome);
        self.visited = visited;
        self.pending = pending;
    }

    /// URLs a fetch was attempted for
    pub fn attempted(&self) -> u64 {
        self.fetched + self.fetch_failures
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    pub fn is_drained(&self) -> bool {
        self.outcome == Some(CrawlOutcome::Drained)
    }
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints a run report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    let outcome = match report.outcome {
        Some(CrawlOutcome::Drained) => "drained",
        Some(CrawlOutcome::Interrupted) => "interrupted",
        None => "running",
    };
    println!("Outcome: {}", outcome);
    println!("Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = report.duration_seconds() {
        println!("Duration: {}s", seconds);
    }
    println!();

    println!("Pages:");
    println!("  Fetched: {}", report.fetched);
    println!("  Fetch failures: {}", report.fetch_failures);
    println!("  Skipped (already visited): {}", report.skipped);
    println!("  Links enqueued: {}", report.links_enqueued);
    println!();

    println!("Items:");
    println!("  Extracted: {}", report.items);
    println!("  Extraction failures: {}", report.extraction_failures);
    println!("  Sink failures: {}", report.sink_failures);
    println!();

    if report.save_failures > 0 {
        println!("Progress save failures: {}", report.save_failures);
    }
    println!(
        "Frontier: {} visited, {} pending",
        report.visited, report.pending
    );
}

/// Summary of the persisted progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStatistics {
    pub location: String,
    pub visited: usize,
    pub pending: usize,

    /// Pending URLs that will be skipped because they were already visited
    pub stale_pending: usize,
}

/// Loads statistics from a progress store
///
/// # Arguments
///
/// * `store` - The progress store to read
///
/// # Returns
///
/// * `Ok(ProgressStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - The records could not be read
pub fn load_statistics(store: &dyn ProgressStore) -> StorageResult<ProgressStatistics> {
    let snapshot = store.load(&[])?;
    let stale_pending = snapshot
        .pending
        .iter()
        .filter(|url| snapshot.visited.contains(*url))
        .count();

    Ok(ProgressStatistics {
        location: store.location(),
        visited: snapshot.visited.len(),
        pending: snapshot.pending.len(),
        stale_pending,
    })
}

/// Prints progress statistics to stdout
pub fn print_statistics(stats: &ProgressStatistics) {
    println!("=== Crawl Progress ===\n");
    println!("Store: {}", stats.location);
    println!("  Visited URLs: {}", stats.visited);
    println!("  Pending URLs: {}", stats.pending);
    if stats.stale_pending > 0 {
        println!("  Pending but already visited: {}", stats.stale_pending);
    }

    let total = stats.visited + stats.pending - stats.stale_pending;
    let percentage = if total > 0 {
        (stats.visited as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    println!();
    println!("Completion: {:.1}% ({} / {} known URLs visited)", percentage, stats.visited, total);
}
