//! Crawl engine - main crawl orchestration logic
//!
//! This module contains the crawl loop, which processes one URL at a time:
//! - Dequeueing from the frontier and skipping visited URLs
//! - Fetching the page and marking it visited
//! - Following links and handling items for every matching rule
//! - Persisting progress and sleeping the politeness delay
//! - Stopping on an empty frontier or a shutdown request

use crate::config::Config;
use crate::crawler::delay::PolitenessDelay;
use crate::crawler::fetcher::{FetchOptions, HttpFetcher, Page, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::handler::HandlerRegistry;
use crate::crawler::rule::RuleSet;
use crate::crawler::stats::{CrawlOutcome, CrawlReport};
use crate::pipeline::Pipeline;
use crate::state::CrawlPhase;
use crate::storage::{open_store, ProgressStore};
use crate::url::SchemeFilter;
use crate::{ConfigError, ConfigResult, CrawlError, Result};
use std::future::Future;
use std::pin::Pin;

/// What a single iteration of the crawl loop did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The frontier was empty
    Drained,
    /// The URL was already visited and was not fetched
    Skipped(String),
    /// The page was fetched and routed
    Processed(String),
    /// The fetch failed; the URL is marked visited and will not be retried
    Abandoned(String),
    /// Shutdown arrived mid-fetch; the URL went back to the head of the queue
    Interrupted(String),
}

/// Loads persisted progress into a frontier
///
/// With no persisted queue the frontier starts from `seeds`. A store that
/// cannot be read is a fatal configuration error: the crawl must not start
/// over and lose its history.
pub fn load_frontier(
    store: &dyn ProgressStore,
    seeds: &[String],
    filter: SchemeFilter,
) -> ConfigResult<Frontier> {
    let snapshot = store.load(seeds).map_err(ConfigError::Progress)?;

    if snapshot.visited.is_empty() {
        tracing::info!(
            "Starting crawl with {} pending URLs ({})",
            snapshot.pending.len(),
            store.location()
        );
    } else {
        tracing::info!(
            "Resuming crawl: {} visited, {} pending ({})",
            snapshot.visited.len(),
            snapshot.pending.len(),
            store.location()
        );
    }

    let frontier = Frontier::from_snapshot(snapshot, filter);

    let stale = frontier.stale_pending();
    if stale > 0 {
        tracing::warn!(
            "{} pending URLs were already visited and will be skipped",
            stale
        );
    }

    Ok(frontier)
}

/// Compiles the configured rules and pipeline
///
/// Every rule handler name must resolve in `handlers`. Nothing is opened
/// or written, so this doubles as the dry-run check.
///
/// # Returns
///
/// * `Ok((RuleSet, Pipeline))` - Ready to hand to an engine
/// * `Err(ConfigError)` - A pattern, handler name, or processor is invalid
pub fn compile_config(
    config: &Config,
    handlers: &HandlerRegistry,
) -> ConfigResult<(RuleSet, Pipeline)> {
    let rules = RuleSet::from_config(&config.rules, handlers)?;
    let pipeline = Pipeline::from_config(&config.pipeline)?;
    Ok((rules, pipeline))
}

/// Main crawl engine
///
/// Owns the frontier, the rules, the pipeline, the fetcher, and the
/// progress store. Nothing here is shared with another task.
pub struct CrawlEngine {
    frontier: Frontier,
    rules: RuleSet,
    pipeline: Pipeline,
    fetcher: Box<dyn PageFetcher>,
    store: Box<dyn ProgressStore>,
    delay: PolitenessDelay,
    fetch_options: FetchOptions,
    phase: CrawlPhase,
    report: CrawlReport,
}

impl CrawlEngine {
    /// Creates an engine with no rules, an empty pipeline and default delays
    pub fn new(
        frontier: Frontier,
        store: Box<dyn ProgressStore>,
        fetcher: Box<dyn PageFetcher>,
    ) -> Self {
        Self {
            frontier,
            rules: RuleSet::default(),
            pipeline: Pipeline::new(),
            fetcher,
            store,
            delay: PolitenessDelay::default(),
            fetch_options: FetchOptions::default(),
            phase: CrawlPhase::Idle,
            report: CrawlReport::new(),
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_delay(mut self, delay: PolitenessDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Builds an engine from the configuration
    ///
    /// Rules and pipeline are compiled before the progress store is opened,
    /// so a bad config never touches the stored progress. With `fresh` the
    /// store is cleared and the crawl starts from the seeds.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `handlers` - Page handlers that rules refer to by name
    /// * `fetcher` - The page fetcher to drive
    /// * `fresh` - Discard stored progress first
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Ready to run
    /// * `Err(CrawlError)` - Configuration or progress could not be loaded
    pub fn from_config(
        config: &Config,
        handlers: &HandlerRegistry,
        fetcher: Box<dyn PageFetcher>,
        fresh: bool,
    ) -> Result<Self> {
        let (rules, pipeline) = compile_config(config, handlers)?;

        let mut store = open_store(&config.progress).map_err(ConfigError::Progress)?;
        if fresh {
            store.clear()?;
            tracing::info!("Cleared crawl progress at {}", store.location());
        }

        let filter = SchemeFilter::new(&config.crawler.excluded_schemes);
        let frontier = load_frontier(store.as_ref(), &config.crawler.seeds, filter)?;
        let (min, max) = config.crawler.delay_bounds();

        Ok(Self::new(frontier, store, fetcher)
            .with_rules(rules)
            .with_pipeline(pipeline)
            .with_delay(PolitenessDelay::new(min, max))
            .with_fetch_options(FetchOptions::from_config(&config.crawler)))
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs until the frontier is empty
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until the frontier is empty or `shutdown` resolves
    ///
    /// Shutdown is honored between iterations, while a fetch is in flight,
    /// and during the politeness sleep. Once a page has been fetched its
    /// routing and persistence always complete. The snapshot is flushed
    /// before returning either way; a failing final flush is returned as an
    /// error.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlReport>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let requested = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = std::future::ready(()) => false,
            };
            if requested {
                return self.interrupt();
            }

            match self.advance(shutdown.as_mut()).await? {
                StepOutcome::Drained => break,
                StepOutcome::Skipped(_) => continue,
                StepOutcome::Interrupted(_) => return self.interrupt(),
                StepOutcome::Processed(_) | StepOutcome::Abandoned(_) => {
                    let pause = self.delay.next_delay();
                    tracing::debug!("Sleeping {} ms", pause.as_millis());

                    tokio::select! {
                        _ = &mut shutdown => return self.interrupt(),
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
            }
        }

        self.flush()?;
        self.finish(CrawlOutcome::Drained);

        tracing::info!(
            "Crawl complete: {} pages fetched, {} failed, {} items",
            self.report.fetched,
            self.report.fetch_failures,
            self.report.items
        );

        Ok(self.report.clone())
    }

    /// Processes the next URL of the frontier
    ///
    /// Per-URL failures are logged and counted; only an invalid phase
    /// transition is returned as an error.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let never = std::future::pending::<()>();
        tokio::pin!(never);
        self.advance(never).await
    }

    /// One loop iteration, with the fetch raced against `shutdown`
    async fn advance<F>(&mut self, shutdown: Pin<&mut F>) -> Result<StepOutcome>
    where
        F: Future<Output = ()>,
    {
        let Some(url) = self.frontier.dequeue() else {
            if self.phase != CrawlPhase::Drained {
                self.transition(CrawlPhase::Drained)?;
            }
            tracing::info!("Frontier is empty, crawl drained");
            return Ok(StepOutcome::Drained);
        };

        if self.frontier.is_visited(&url) {
            self.report.skipped += 1;
            tracing::debug!("Skipping already visited URL {}", url);
            tracing::info!("{} URLs left to examine", self.frontier.size());
            return Ok(StepOutcome::Skipped(url));
        }

        self.transition(CrawlPhase::Fetching)?;

        let fetched = tokio::select! {
            biased;
            _ = shutdown => None,
            result = self.fetcher.fetch(&url, &self.fetch_options) => Some(result),
        };
        let Some(fetched) = fetched else {
            tracing::info!("Fetch of {} cancelled, it stays at the head of the queue", url);
            self.frontier.requeue_front(url.clone());
            return Ok(StepOutcome::Interrupted(url));
        };

        let outcome = match fetched {
            Ok(page) => {
                self.frontier.mark_visited(&url);
                self.report.fetched += 1;
                tracing::info!("GET {} {}", page.status, url);

                self.route_page(&url, &page).await?;
                StepOutcome::Processed(url)
            }
            Err(e) => {
                self.frontier.mark_visited(&url);
                self.report.fetch_failures += 1;
                tracing::error!("Abandoning {}: {}", url, e);
                StepOutcome::Abandoned(url)
            }
        };

        self.transition(CrawlPhase::Persisting)?;
        self.persist();
        self.transition(CrawlPhase::Sleeping)?;

        tracing::info!("{} URLs left to examine", self.frontier.size());
        Ok(outcome)
    }

    /// Applies every matching rule to a fetched page
    ///
    /// All link following runs before any item handling.
    async fn route_page(&mut self, url: &str, page: &Page) -> Result<()> {
        self.transition(CrawlPhase::RuleEvaluating)?;

        let extractors = self.rules.follow_extractors(url);
        let handlers = self.rules.handlers(url);

        if extractors.is_empty() && handlers.is_empty() {
            tracing::debug!("No rule matches {}", url);
        }

        if !extractors.is_empty() {
            self.transition(CrawlPhase::LinkFollowing)?;

            for extractor in extractors {
                let links = extractor.extract_links(page);
                let found = links.len();
                let added = self.frontier.enqueue_all(links);
                self.report.links_enqueued += added as u64;
                tracing::debug!("Enqueued {} of {} links from {}", added, found, url);
            }
        }

        if !handlers.is_empty() {
            self.transition(CrawlPhase::ItemHandling)?;

            for (name, handler) in handlers {
                match handler.extract_item(page).await {
                    Ok(item) => {
                        self.report.items += 1;
                        self.pipeline.process(item);
                    }
                    Err(e) => {
                        self.report.extraction_failures += 1;
                        tracing::error!("Handler '{}' failed on {}: {}", name, url, e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Saves the snapshot, logging a failure without stopping the crawl
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.frontier.snapshot()) {
            self.report.save_failures += 1;
            tracing::error!(
                "Failed to save crawl progress to {}: {}",
                self.store.location(),
                e
            );
        }
    }

    /// Saves the snapshot, returning any failure
    pub fn flush(&mut self) -> Result<()> {
        self.store.save(&self.frontier.snapshot())?;
        Ok(())
    }

    fn interrupt(&mut self) -> Result<CrawlReport> {
        self.transition(CrawlPhase::Interrupted)?;
        self.flush()?;
        self.finish(CrawlOutcome::Interrupted);

        tracing::info!(
            "Crawl interrupted, progress saved with {} URLs pending",
            self.frontier.size()
        );

        Ok(self.report.clone())
    }

    fn finish(&mut self, outcome: CrawlOutcome) {
        self.report.sink_failures = self.pipeline.sink_failures();
        self.report
            .finish(outcome, self.frontier.visited_count(), self.frontier.size());
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

/// Runs a complete crawl with the default HTTP fetcher
///
/// # Example
///
/// ```no_run
/// use trawl::config::load_config;
/// use trawl::crawler::{run_crawl, HandlerRegistry};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("trawl.toml"))?;
/// let handlers = HandlerRegistry::from_config(&config.handlers)?;
/// let report = run_crawl(&config, &handlers).await?;
/// println!("{} pages fetched", report.fetched);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, handlers: &HandlerRegistry) -> Result<CrawlReport> {
    let fetcher = HttpFetcher::from_config(&config.crawler)?;
    let mut engine = CrawlEngine::from_config(config, handlers, Box::new(fetcher), false)?;
    engine.run().await
}
