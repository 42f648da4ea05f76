//! Integration tests for the crawler
//!
//! These tests use wiremock to serve mock dependents listings and run
//! both orchestrators end-to-end against them.

use dependents_crawler::config::{Config, CrawlMode, CrawlerConfig, OutputConfig, UserAgentConfig};
use dependents_crawler::crawler::{
    crawl, crawl_pipelined, crawl_sequential, CrawlTarget, PageFetcher,
};
use dependents_crawler::{CrawlError, DependentKind, DependentRecord, FetchFailure};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

const LISTING_PATH: &str = "/inconshreveable/mousetrap/network/dependents";

/// Upper bound for crawls that must fail rather than hang
const HANG_LIMIT: Duration = Duration::from_secs(5);

/// Matches requests without a query string (the seed page)
struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// Serves an endless listing: page N links to page N + 1
struct EndlessListing;

impl Respond for EndlessListing {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page: usize = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "dependents_after")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(0);

        let owner = format!("owner{}", page);
        let next = after(&(page + 1).to_string());
        html(listing_page(&[(owner.as_str(), "repo")], Some(&next)))
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, max_pages: usize, mode: CrawlMode) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages,
            mode,
            base_url: base_url.to_string(),
            request_timeout_ms: 5_000,
            crawl_deadline_secs: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
        output: OutputConfig::default(),
    }
}

fn fetcher() -> PageFetcher {
    let config = create_test_config("http://localhost", 1, CrawlMode::Sequential);
    PageFetcher::from_config(&config.crawler, &config.user_agent).expect("Failed to build client")
}

fn seed(server: &MockServer) -> Url {
    Url::parse(&format!("{}{}", server.uri(), LISTING_PATH)).expect("Failed to parse seed URL")
}

/// Href of the listing page after `cursor`
fn after(cursor: &str) -> String {
    format!("{}?dependents_after={}", LISTING_PATH, cursor)
}

fn record_block(owner: &str, name: &str) -> String {
    format!(
        r#"<div class="Box-row d-flex flex-items-center" data-test-id="dg-repo-pkg-dependent">
  <img class="avatar mr-2" src="/avatar.png" width="20" height="20" alt="@{owner}">
  <span class="f5 color-fg-muted">
    <a data-hovercard-type="user" href="/{owner}">{owner}</a> /
    <a class="text-bold" data-hovercard-type="repository" href="/{owner}/{name}">{name}</a>
    <small></small>
  </span>
  <div class="d-flex flex-auto flex-justify-end"><span>0</span></div>
</div>"#
    )
}

fn pagination(next_href: &str) -> String {
    format!(
        r#"<div class="paginate-container"><div class="BtnGroup">
<button class="btn BtnGroup-item" disabled="disabled">Previous</button>
<a rel="nofollow" class="btn BtnGroup-item" href="{next_href}">Next</a>
</div></div>"#
    )
}

/// Renders a listing page with the given dependents and "Next" href
fn listing_page(dependents: &[(&str, &str)], next_href: Option<&str>) -> String {
    let records: String = dependents
        .iter()
        .map(|(owner, name)| record_block(owner, name))
        .collect();
    let controls = next_href.map(pagination).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html><html><head><title>Network Dependents</title></head><body>
<div id="dependents"><div class="Box">{records}</div>{controls}</div>
</body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Mounts a three page listing: P1 -> P2 -> P3 (no pagination)
///
/// Each page expects to be fetched `fetches` times.
async fn mount_three_pages(server: &MockServer, fetches: [u64; 3]) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(NoQuery)
        .respond_with(html(listing_page(
            &[("spf13", "cobra"), ("hashicorp", "terraform")],
            Some(&after("P2")),
        )))
        .expect(fetches[0])
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("dependents_after", "P2"))
        .respond_with(html(listing_page(
            &[("kubernetes", "kubectl"), ("golang", "tools")],
            Some(&after("P3")),
        )))
        .expect(fetches[1])
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("dependents_after", "P3"))
        .respond_with(html(listing_page(&[("docker", "cli")], None)))
        .expect(fetches[2])
        .mount(server)
        .await;
}

fn names(records: &[DependentRecord]) -> Vec<String> {
    records.iter().map(|r| r.full_name()).collect()
}

#[tokio::test]
async fn test_sequential_crawl_stops_when_listing_is_exhausted() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [1, 1, 1]).await;

    let outcome = crawl_sequential(&fetcher(), seed(&mock_server), 10)
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(
        names(&outcome.records),
        vec![
            "spf13/cobra",
            "hashicorp/terraform",
            "kubernetes/kubectl",
            "golang/tools",
            "docker/cli"
        ]
    );
}

#[tokio::test]
async fn test_records_carry_their_page_cursor() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [1, 1, 1]).await;

    let outcome = crawl_sequential(&fetcher(), seed(&mock_server), 10)
        .await
        .expect("Crawl failed");

    let cursors: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.after_cursor.as_str())
        .collect();
    assert_eq!(cursors, vec!["", "", "P2", "P2", "P3"]);
    assert!(outcome
        .records
        .iter()
        .all(|r| r.kind == DependentKind::Repository && r.before_cursor.is_empty()));
}

#[tokio::test]
async fn test_sequential_crawl_respects_page_budget() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [1, 1, 0]).await;

    let outcome = crawl_sequential(&fetcher(), seed(&mock_server), 2)
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 4);
}

#[tokio::test]
async fn test_zero_page_budget_fetches_nothing() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [0, 0, 0]).await;

    let sequential = crawl_sequential(&fetcher(), seed(&mock_server), 0)
        .await
        .expect("Sequential crawl failed");
    let pipelined = crawl_pipelined(&fetcher(), seed(&mock_server), 0)
        .await
        .expect("Pipelined crawl failed");

    assert!(sequential.records.is_empty());
    assert!(pipelined.records.is_empty());
    assert_eq!(sequential.pages_fetched, 0);
    assert_eq!(pipelined.pages_fetched, 0);
}

#[tokio::test]
async fn test_pipelined_crawl_stops_when_listing_is_exhausted() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [1, 1, 1]).await;

    let outcome = crawl_pipelined(&fetcher(), seed(&mock_server), 10)
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.records.len(), 5);
}

#[tokio::test]
async fn test_pipelined_crawl_respects_page_budget() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [1, 1, 0]).await;

    let outcome = crawl_pipelined(&fetcher(), seed(&mock_server), 2)
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 4);
}

#[tokio::test]
async fn test_pipelined_crawl_with_budget_of_one() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [1, 0, 0]).await;

    let outcome = crawl_pipelined(&fetcher(), seed(&mock_server), 1)
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(
        names(&outcome.records),
        vec!["spf13/cobra", "hashicorp/terraform"]
    );
}

#[tokio::test]
async fn test_sequential_and_pipelined_find_the_same_records() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [2, 2, 2]).await;

    let sequential = crawl_sequential(&fetcher(), seed(&mock_server), 10)
        .await
        .expect("Sequential crawl failed");
    let pipelined = crawl_pipelined(&fetcher(), seed(&mock_server), 10)
        .await
        .expect("Pipelined crawl failed");

    assert_eq!(sequential.records.len(), pipelined.records.len());
    assert_eq!(sequential.pages_fetched, pipelined.pages_fetched);

    let sequential: HashSet<_> = sequential.records.into_iter().collect();
    let pipelined: HashSet<_> = pipelined.records.into_iter().collect();
    assert_eq!(sequential, pipelined);
}

#[tokio::test]
async fn test_non_success_status_fails_the_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(NoQuery)
        .respond_with(html(listing_page(&[("spf13", "cobra")], Some(&after("P2")))))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("dependents_after", "P2"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "60")
                .set_body_string("slow down"),
        )
        .mount(&mock_server)
        .await;

    for result in [
        crawl_sequential(&fetcher(), seed(&mock_server), 10).await,
        crawl_pipelined(&fetcher(), seed(&mock_server), 10).await,
    ] {
        match result {
            Err(CrawlError::Fetch {
                url,
                reason: FetchFailure::Status { status, body },
            }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
                assert!(url.contains("dependents_after=P2"));
            }
            other => panic!("expected a status failure, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_malformed_record_fails_the_crawl() {
    let mock_server = MockServer::start().await;

    let broken = r#"<html><body>
<div data-test-id="dg-repo-pkg-dependent"><img src="/a.png">
<span><a data-hovercard-type="user" href="/lonely">lonely</a> / <small></small></span>
</div>
</body></html>"#;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(html(broken.to_string()))
        .mount(&mock_server)
        .await;

    let sequential = crawl_sequential(&fetcher(), seed(&mock_server), 10).await;
    assert!(matches!(sequential, Err(CrawlError::MalformedPage { .. })));

    let pipelined = crawl_pipelined(&fetcher(), seed(&mock_server), 10).await;
    assert!(matches!(pipelined, Err(CrawlError::MalformedPage { .. })));
}

#[tokio::test]
async fn test_unusable_next_link_fails_the_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(html(listing_page(&[("spf13", "cobra")], Some("javascript:void(0)"))))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher();

    let sequential = crawl_sequential(&fetcher, seed(&mock_server), 5);
    match timeout(HANG_LIMIT, sequential).await.expect("Crawl hung") {
        Err(CrawlError::MalformedPage { message, .. }) => {
            assert!(message.contains("javascript:void(0)"), "{}", message);
        }
        other => panic!("expected MalformedPage, got {:?}", other),
    }

    // The next-link stage fails while the fetch and record stages are still running
    let pipelined = crawl_pipelined(&fetcher, seed(&mock_server), 5);
    match timeout(HANG_LIMIT, pipelined).await.expect("Crawl hung") {
        Err(CrawlError::MalformedPage { message, .. }) => {
            assert!(message.contains("javascript:void(0)"), "{}", message);
        }
        other => panic!("expected MalformedPage, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_html_response_is_a_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    let result = crawl_sequential(&fetcher(), seed(&mock_server), 1).await;
    assert!(matches!(result, Err(CrawlError::Parse { .. })));
}

#[tokio::test]
async fn test_crawl_uses_configured_mode_and_base_url() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server, [2, 2, 2]).await;

    let target = CrawlTarget::new("inconshreveable", "mousetrap");

    for mode in [CrawlMode::Sequential, CrawlMode::Pipelined] {
        let config = create_test_config(&mock_server.uri(), 10, mode);
        let outcome = crawl(&config, &target).await.expect("Crawl failed");
        assert_eq!(outcome.pages_fetched, 3, "mode {}", mode);
        assert_eq!(outcome.records.len(), 5, "mode {}", mode);
    }
}

#[tokio::test]
async fn test_crawl_filtered_by_kind() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("dependent_type", "PACKAGE"))
        .respond_with(html(listing_page(&[("acme", "pkg")], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 10, CrawlMode::Sequential);
    let kind = DependentKind::Package;
    let target = CrawlTarget::new("inconshreveable", "mousetrap").with_kind(kind);

    let outcome = crawl(&config, &target).await.expect("Crawl failed");
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].kind, DependentKind::Package);
}

#[tokio::test]
async fn test_crawl_deadline() {
    let mock_server = MockServer::start().await;
    let slow = html(listing_page(&[("slow", "page")], None)).set_delay(Duration::from_secs(3));

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(slow)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 10, CrawlMode::Sequential);
    config.crawler.crawl_deadline_secs = Some(1);

    let result = crawl(&config, &CrawlTarget::new("inconshreveable", "mousetrap")).await;
    assert!(matches!(result, Err(CrawlError::DeadlineExceeded { .. })));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;
    let slow = html(listing_page(&[("slow", "page")], None)).set_delay(Duration::from_secs(3));

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(slow)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 10, CrawlMode::Pipelined);
    config.crawler.request_timeout_ms = 200;

    let result = crawl(&config, &CrawlTarget::new("inconshreveable", "mousetrap")).await;
    assert!(matches!(
        result,
        Err(CrawlError::Fetch {
            reason: FetchFailure::Timeout,
            ..
        })
    ));
}

/// Times both modes over a long listing at several page budgets
///
/// Run with `cargo test --test integration -- --nocapture` to see timings.
#[tokio::test]
async fn test_crawl_timing_by_page_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(EndlessListing)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher();

    for max_pages in [1, 2, 3, 10, 20, 40] {
        let start = Instant::now();
        let sequential = crawl_sequential(&fetcher, seed(&mock_server), max_pages)
            .await
            .expect("Sequential crawl failed");
        let sequential_time = start.elapsed();

        let start = Instant::now();
        let pipelined = crawl_pipelined(&fetcher, seed(&mock_server), max_pages)
            .await
            .expect("Pipelined crawl failed");
        let pipelined_time = start.elapsed();

        assert_eq!(sequential.pages_fetched, max_pages);
        assert_eq!(pipelined.pages_fetched, max_pages);
        assert_eq!(pipelined.records.len(), max_pages);

        println!(
            "{:>3} pages: sequential {:?}, pipelined {:?}",
            max_pages, sequential_time, pipelined_time
        );
    }
}
