//! End-to-end crawl tests

use crate::common::{toml_path, urls, write_config, Collect, StubFetcher};
use trawl::crawler::{
    load_frontier, CrawlEngine, CrawlOutcome, HandlerRegistry, HtmlLinkExtractor, HttpFetcher,
    Page, PolitenessDelay, RoutingRule, RuleSet,
};
use trawl::pipeline::{CrawledItem, ItemProcessor, Pipeline, SinkFailure};
use trawl::storage::JsonProgressStore;
use trawl::url::{LinkMatcher, SchemeFilter};
use trawl::{CrawlPhase, ExtractionError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PAGE: &str = r#"
<html><body>
  <a href="/item-1">First</a>
  <a href="https://x.test/item-2">Second</a>
  <a href="mailto:sales@x.test">Contact</a>
  <a href="/about">About</a>
</body></html>
"#;

fn item_page(title: &str) -> String {
    format!("<html><body><h1>{}</h1></body></html>", title)
}

fn title_handler(page: &Page) -> Result<CrawledItem, ExtractionError> {
    let start = page.body.find("<h1>").map(|i| i + 4);
    let end = page.body.find("</h1>");
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(CrawledItem::new()
            .with("url", page.url.as_str())
            .with("title", &page.body[start..end])),
        _ => Err(ExtractionError::MissingField {
            url: page.url.clone(),
            field: "title".to_string(),
        }),
    }
}

/// A listing rule that follows item links and an item rule that extracts titles
fn listing_rules() -> RuleSet {
    let list = RoutingRule::new(LinkMatcher::new(Some("/list$"), None).unwrap())
        .with_link_extractor(HtmlLinkExtractor::new(
            LinkMatcher::new(Some("/item-"), None).unwrap(),
        ));
    let item = RoutingRule::new(LinkMatcher::new(Some("/item-"), None).unwrap())
        .with_follow(false)
        .with_handler("item", title_handler);

    vec![list, item].into_iter().collect()
}

fn engine(fetcher: StubFetcher, collect: Collect, dir: &std::path::Path) -> CrawlEngine {
    let store = JsonProgressStore::new(dir);
    let frontier =
        load_frontier(&store, &urls(&["https://x.test/list"]), SchemeFilter::default()).unwrap();

    CrawlEngine::new(frontier, Box::new(store), Box::new(fetcher))
        .with_rules(listing_rules())
        .with_pipeline(Pipeline::new().with_processor(collect))
        .with_delay(PolitenessDelay::none())
}

#[tokio::test]
async fn test_list_then_items() {
    let dir = tempfile::tempdir().unwrap();
    let item_1 = item_page("Flat 1");
    let item_2 = item_page("Flat 2");
    let fetcher = StubFetcher::new(&[
        ("https://x.test/list", LIST_PAGE),
        ("https://x.test/item-1", &item_1),
        ("https://x.test/item-2", &item_2),
    ]);
    let collect = Collect::default();

    let mut engine = engine(fetcher.clone(), collect.clone(), dir.path());
    let report = engine.run().await.unwrap();

    assert_eq!(report.outcome, Some(CrawlOutcome::Drained));
    assert_eq!(engine.phase(), CrawlPhase::Drained);
    assert_eq!(
        fetcher.calls(),
        urls(&[
            "https://x.test/list",
            "https://x.test/item-1",
            "https://x.test/item-2"
        ])
    );

    let items = collect.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].field_text("title"), "Flat 1");
    assert_eq!(items[1].field_text("url"), "https://x.test/item-2");

    // Nothing pending, every fetched page visited
    assert_eq!(report.pending, 0);
    assert_eq!(report.visited, 3);
    assert!(!engine.frontier().is_visited("mailto:sales@x.test"));
}

#[tokio::test]
async fn test_stub_extractor_and_handler_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let list = RoutingRule::new(LinkMatcher::new(Some("/list$"), None).unwrap())
        .with_link_extractor(|_page: &Page| {
            urls(&[
                "https://x.test/item-1",
                "https://x.test/item-2",
                "mailto:a@b.com",
            ])
        });
    let item = RoutingRule::new(LinkMatcher::new(Some("/item-"), None).unwrap())
        .with_follow(false)
        .with_handler(
            "id",
            |page: &Page| -> Result<CrawledItem, ExtractionError> {
                let id = page.url.rsplit('-').next().unwrap_or_default();
                let id: u64 = id.parse().map_err(|_| ExtractionError::Malformed {
                    url: page.url.clone(),
                    message: "no numeric suffix".to_string(),
                })?;
                Ok(CrawledItem::new().with("id", id))
            },
        );

    let fetcher = StubFetcher::new(&[
        ("https://x.test/list", ""),
        ("https://x.test/item-1", ""),
        ("https://x.test/item-2", ""),
    ]);
    let collect = Collect::default();
    let store = JsonProgressStore::new(dir.path());
    let frontier =
        load_frontier(&store, &urls(&["https://x.test/list"]), SchemeFilter::default()).unwrap();
    let mut engine = CrawlEngine::new(frontier, Box::new(store), Box::new(fetcher.clone()))
        .with_rules(vec![list, item].into_iter().collect())
        .with_pipeline(Pipeline::new().with_processor(collect.clone()))
        .with_delay(PolitenessDelay::none());

    let report = engine.run().await.unwrap();

    let snapshot = engine.frontier().snapshot();
    assert_eq!(
        snapshot.visited_sorted(),
        vec![
            "https://x.test/item-1",
            "https://x.test/item-2",
            "https://x.test/list"
        ]
    );
    assert_eq!(report.links_enqueued, 2);
    assert!(!fetcher.calls().iter().any(|u| u.starts_with("mailto:")));

    let ids: Vec<u64> = collect
        .items()
        .iter()
        .filter_map(|item| item.get("id").and_then(|v| v.as_u64()))
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_failed_page_does_not_stop_the_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let item_2 = item_page("Flat 2");
    // item-1 is not served and fails to fetch
    let fetcher = StubFetcher::new(&[
        ("https://x.test/list", LIST_PAGE),
        ("https://x.test/item-2", &item_2),
    ]);
    let collect = Collect::default();

    let mut engine = engine(fetcher.clone(), collect.clone(), dir.path());
    let report = engine.run().await.unwrap();

    assert!(report.is_drained());
    assert_eq!(report.fetched, 2);
    assert_eq!(report.fetch_failures, 1);
    assert!(engine.frontier().is_visited("https://x.test/item-1"));

    let items = collect.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].field_text("title"), "Flat 2");
}

#[tokio::test]
async fn test_extraction_failure_is_counted() {
    let dir = tempfile::tempdir().unwrap();
    let broken = "<html><body><p>no heading</p></body></html>";
    let item_2 = item_page("Flat 2");
    let fetcher = StubFetcher::new(&[
        ("https://x.test/list", LIST_PAGE),
        ("https://x.test/item-1", broken),
        ("https://x.test/item-2", &item_2),
    ]);
    let collect = Collect::default();

    let mut engine = engine(fetcher, collect.clone(), dir.path());
    let report = engine.run().await.unwrap();

    assert_eq!(report.extraction_failures, 1);
    assert_eq!(report.items, 1);
    assert_eq!(collect.items().len(), 1);
}

struct Unwritable;

impl ItemProcessor for Unwritable {
    fn name(&self) -> &str {
        "unwritable"
    }

    fn process_item(&mut self, item: CrawledItem) -> Result<CrawledItem, SinkFailure> {
        Err(SinkFailure::new(
            item,
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        ))
    }
}

#[tokio::test]
async fn test_broken_sink_does_not_starve_later_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let item_1 = item_page("Flat 1");
    let item_2 = item_page("Flat 2");
    let fetcher = StubFetcher::new(&[
        ("https://x.test/list", LIST_PAGE),
        ("https://x.test/item-1", &item_1),
        ("https://x.test/item-2", &item_2),
    ]);
    let collect = Collect::default();

    let store = JsonProgressStore::new(dir.path());
    let frontier = load_frontier(&store, &urls(&["https://x.test/list"]), SchemeFilter::default())
        .unwrap();
    let mut engine = CrawlEngine::new(frontier, Box::new(store), Box::new(fetcher))
        .with_rules(listing_rules())
        .with_pipeline(
            Pipeline::new()
                .with_processor(Unwritable)
                .with_processor(collect.clone()),
        )
        .with_delay(PolitenessDelay::none());

    let report = engine.run().await.unwrap();

    assert_eq!(report.sink_failures, 2);
    assert_eq!(collect.items().len(), 2);
}

#[tokio::test]
async fn test_config_driven_crawl_writes_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(
                    r#"<a href="/item-1">1</a> <a href="/item-2">2</a> <a href="/style.css">css</a>"#,
                ),
        )
        .mount(&server)
        .await;
    for (route, title, price) in [("/item-1", "Flat 1", "100"), ("/item-2", "Flat 2", "200")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(format!(
                        r#"<h1> {} </h1><span class="price" data-value="{}">{} EUR</span>"#,
                        title, price, price
                    )),
            )
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("items.csv");
    let config = write_config(
        dir.path(),
        &format!(
            r#"
[crawler]
seeds = ["{base}/list"]
min-delay = 0
max-delay = 0
user-agent = "trawl-test"

[progress]
directory = "{progress}"

[pipeline]
processors = ["csv"]
csv-path = "{csv}"

[[rule]]
allow = "/list$"
links-allow = "/item-"

[[rule]]
allow = "/item-"
follow = false
handler = "flat"

[handlers.flat.fields]
title = {{ selector = "h1" }}
price = {{ selector = "span.price", attribute = "data-value" }}
"#,
            base = server.uri(),
            progress = toml_path(&dir.path().join("history")),
            csv = toml_path(&csv_path),
        ),
    );

    let handlers = HandlerRegistry::from_config(&config.handlers).unwrap();
    let fetcher = HttpFetcher::from_config(&config.crawler).unwrap();
    let mut engine = CrawlEngine::from_config(&config, &handlers, Box::new(fetcher), false).unwrap();

    let report = engine.run().await.unwrap();

    assert!(report.is_drained());
    assert_eq!(report.fetched, 3);
    assert_eq!(report.items, 2);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["price", "title", "url"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "100");
    assert_eq!(&rows[0][1], "Flat 1");
    assert_eq!(&rows[1][2], format!("{}/item-2", server.uri()));
}
