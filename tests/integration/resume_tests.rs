//! Crash, interrupt, and resume tests

use crate::common::{toml_path, urls, write_config, StubFetcher};
use std::time::Duration;
use trawl::config::Config;
use trawl::crawler::{
    load_frontier, CrawlEngine, CrawlOutcome, HandlerRegistry, PolitenessDelay, StepOutcome,
};
use trawl::storage::{JsonProgressStore, ProgressStore, VISITED_FILE_NAME};
use trawl::url::SchemeFilter;
use trawl::{ConfigError, CrawlError};

const SEEDS: [&str; 3] = ["https://x.test/a", "https://x.test/b", "https://x.test/c"];

fn seed_pages() -> StubFetcher {
    StubFetcher::new(&[
        ("https://x.test/a", ""),
        ("https://x.test/b", ""),
        ("https://x.test/c", ""),
    ])
}

fn json_engine(dir: &std::path::Path, fetcher: StubFetcher) -> CrawlEngine {
    let store = JsonProgressStore::new(dir);
    let frontier = load_frontier(&store, &urls(&SEEDS), SchemeFilter::default()).unwrap();
    CrawlEngine::new(frontier, Box::new(store), Box::new(fetcher))
        .with_delay(PolitenessDelay::none())
}

fn progress_config(dir: &std::path::Path, backend: &str) -> Config {
    write_config(
        dir,
        &format!(
            r#"
[crawler]
seeds = ["https://x.test/a", "https://x.test/b", "https://x.test/c"]
min-delay = 0
max-delay = 0

[progress]
directory = "{}"
backend = "{}"

[pipeline]
processors = []
"#,
            toml_path(&dir.join("history")),
            backend
        ),
    )
}

#[tokio::test]
async fn test_resume_after_crash() {
    let dir = tempfile::tempdir().unwrap();

    // First process handles one page, then dies without any shutdown
    {
        let mut engine = json_engine(dir.path(), seed_pages());
        let outcome = engine.step().await.unwrap();
        assert_eq!(outcome, StepOutcome::Processed("https://x.test/a".to_string()));
    }

    let store = JsonProgressStore::new(dir.path());
    let snapshot = store.load(&urls(&SEEDS)).unwrap();
    assert!(snapshot.visited.contains("https://x.test/a"));
    assert_eq!(snapshot.pending, urls(&["https://x.test/b", "https://x.test/c"]));

    let fetcher = seed_pages();
    let mut engine = json_engine(dir.path(), fetcher.clone());
    assert_eq!(engine.frontier().size(), 2);

    let report = engine.run().await.unwrap();

    assert!(report.is_drained());
    assert_eq!(fetcher.calls(), urls(&["https://x.test/b", "https://x.test/c"]));
}

#[tokio::test]
async fn test_interrupt_flushes_progress() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = seed_pages();
    let mut engine = json_engine(dir.path(), fetcher.clone())
        .with_delay(PolitenessDelay::new(Duration::from_secs(60), Duration::from_secs(60)));

    let report = engine
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    assert_eq!(report.outcome, Some(CrawlOutcome::Interrupted));
    assert_eq!(report.fetched, 1);
    assert_eq!(report.pending, 2);

    let snapshot = JsonProgressStore::new(dir.path()).load(&[]).unwrap();
    assert_eq!(snapshot.visited.len(), 1);
    assert_eq!(snapshot.pending, urls(&["https://x.test/b", "https://x.test/c"]));
}

#[tokio::test]
async fn test_drained_crawl_restarts_from_visited_seeds() {
    let dir = tempfile::tempdir().unwrap();
    json_engine(dir.path(), seed_pages()).run().await.unwrap();

    // The queue is empty so the seeds come back, but all of them are visited
    let fetcher = seed_pages();
    let mut engine = json_engine(dir.path(), fetcher.clone());
    let report = engine.run().await.unwrap();

    assert_eq!(report.skipped, 3);
    assert_eq!(report.fetched, 0);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_fresh_start_clears_sqlite_progress() {
    let dir = tempfile::tempdir().unwrap();
    let config = progress_config(dir.path(), "sqlite");
    let handlers = HandlerRegistry::new();

    let mut first = CrawlEngine::from_config(&config, &handlers, Box::new(seed_pages()), false)
        .unwrap();
    assert_eq!(first.run().await.unwrap().fetched, 3);
    drop(first);

    let resumed_fetcher = seed_pages();
    let mut resumed =
        CrawlEngine::from_config(&config, &handlers, Box::new(resumed_fetcher.clone()), false)
            .unwrap();
    assert_eq!(resumed.frontier().visited_count(), 3);
    resumed.run().await.unwrap();
    assert!(resumed_fetcher.calls().is_empty());
    drop(resumed);

    let fresh_fetcher = seed_pages();
    let mut fresh =
        CrawlEngine::from_config(&config, &handlers, Box::new(fresh_fetcher.clone()), true)
            .unwrap();
    assert_eq!(fresh.frontier().visited_count(), 0);
    fresh.run().await.unwrap();
    assert_eq!(fresh_fetcher.calls(), urls(&SEEDS));
}

#[tokio::test]
async fn test_corrupt_progress_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = progress_config(dir.path(), "json");

    let history = dir.path().join("history");
    std::fs::create_dir_all(&history).unwrap();
    std::fs::write(history.join(VISITED_FILE_NAME), "{not a list").unwrap();

    let result = CrawlEngine::from_config(&config, &HandlerRegistry::new(), Box::new(seed_pages()), false);

    assert!(matches!(
        result,
        Err(CrawlError::Config(ConfigError::Progress(_)))
    ));
}
