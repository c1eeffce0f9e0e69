//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use async_trait::async_trait;
use sitewalker::config::{load_config, CrawlSettings};
use sitewalker::crawler::{Admission, CrawlPhase};
use sitewalker::processor::{LinkLogProcessor, ProcessingError, ProcessingResult, Processor};
use sitewalker::{SiteCrawler, Target};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestBot/1.0 (+https://example.com/bot; bot@example.com)";

/// Records every (page, content) pair it is handed
#[derive(Default)]
struct SpyProcessor {
    calls: Mutex<Vec<(String, String)>>,
}

impl SpyProcessor {
    fn urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect();
        urls.sort();
        urls
    }

    fn calls(&self) -> Vec<(String, String)> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl Processor for SpyProcessor {
    fn name(&self) -> &str {
        "spy"
    }

    async fn process(
        &self,
        _cancel: &CancellationToken,
        page: &Target,
        content: &str,
    ) -> ProcessingResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((page.to_string(), content.to_string()));
        Ok(())
    }
}

struct FailingProcessor;

#[async_trait]
impl Processor for FailingProcessor {
    fn name(&self) -> &str {
        "failing"
    }

    async fn process(
        &self,
        _cancel: &CancellationToken,
        _page: &Target,
        _content: &str,
    ) -> ProcessingResult<()> {
        Err(ProcessingError::Failed("always fails".to_string()))
    }
}

fn settings_for(server: &MockServer) -> CrawlSettings {
    CrawlSettings::new(Url::parse(&server.uri()).unwrap(), USER_AGENT)
        .with_request_timeout(Duration::from_secs(5))
        .with_worker_pool_size(4)
}

async fn crawler_with(server: &MockServer, processors: Vec<Arc<dyn Processor>>) -> SiteCrawler {
    SiteCrawler::new(settings_for(server), processors, &CancellationToken::new())
        .await
        .expect("crawler should build")
}

fn page_url(server: &MockServer, p: &str) -> String {
    format!("{}{}", server.uri(), p)
}

fn html_with_links(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">{}</a>"#, link, link))
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

fn sitemap_xml(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|url| format!("<url><loc>{}</loc></url>", url))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

async fn mount_page(server: &MockServer, p: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_never(server: &MockServer, p: &str) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>should not be fetched</p>"))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sitemap_and_link_discovery() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&[
            page_url(&server, "/"),
            page_url(&server, "/page1"),
            page_url(&server, "/page2"),
        ])))
        .mount(&server)
        .await;

    mount_page(&server, "/", html_with_links(&["/page1".to_string()])).await;
    mount_page(
        &server,
        "/page1",
        html_with_links(&[
            "/page3".to_string(),
            "/missing".to_string(),
            "/private/secret".to_string(),
        ]),
    )
    .await;
    mount_page(&server, "/page2", "<p>leaf</p>".to_string()).await;
    mount_page(&server, "/page3", "<p>discovered</p>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(1)
        .mount(&server)
        .await;
    mount_never(&server, "/private/secret").await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    let report = crawler.crawl(&CancellationToken::new()).await.unwrap();

    let mut expected = vec![
        page_url(&server, "/"),
        page_url(&server, "/page1"),
        page_url(&server, "/page2"),
        page_url(&server, "/page3"),
    ];
    expected.sort();
    assert_eq!(spy.urls(), expected);

    assert_eq!(report.pages_admitted, 5);
    assert_eq!(report.pages_fetched, 4);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.processor_invocations, 4);
    assert_eq!(crawler.phase(), CrawlPhase::Complete);
}

#[tokio::test]
async fn test_deep_link_chain() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sitemap_xml(&[page_url(&server, "/chain/1")])),
        )
        .mount(&server)
        .await;

    for i in 1..=6 {
        let body = if i < 6 {
            html_with_links(&[format!("/chain/{}", i + 1)])
        } else {
            "<html><body><p>The end</p></body></html>".to_string()
        };
        mount_page(&server, &format!("/chain/{}", i), body).await;
    }

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    crawler.crawl(&CancellationToken::new()).await.unwrap();

    let mut expected: Vec<_> = (1..=6)
        .map(|i| page_url(&server, &format!("/chain/{}", i)))
        .collect();
    expected.sort();
    assert_eq!(spy.urls(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_page_fetched_once_under_concurrent_discovery() {
    let server = MockServer::start().await;

    // Every page links to every other page, so each link is discovered many
    // times concurrently
    let mut all: Vec<String> = (0..10).map(|i| format!("/mesh/{}", i)).collect();
    all.push("/".to_string());

    for p in &all {
        // Mix plain, fragment and dot-segment spellings of the same links
        let links: Vec<String> = all
            .iter()
            .flat_map(|link| {
                vec![
                    link.clone(),
                    format!("{}#frag", link),
                    format!("/mesh/../{}", link.trim_start_matches('/')),
                ]
            })
            .collect();
        mount_page(&server, p, html_with_links(&links)).await;
    }

    let spy = Arc::new(SpyProcessor::default());
    let settings = settings_for(&server).with_worker_pool_size(8);
    let crawler = SiteCrawler::new(
        settings,
        vec![spy.clone() as Arc<dyn Processor>],
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    let report = crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert_eq!(spy.urls().len(), 11);
    assert_eq!(report.pages_admitted, 11);
    assert_eq!(report.pages_fetched, 11);
}

#[tokio::test]
async fn test_crawl_stays_on_host() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_with_links(&[
            format!("{}/outside", other.uri()),
            "https://example.org/elsewhere".to_string(),
            "/inside".to_string(),
        ]),
    )
    .await;
    mount_page(&server, "/inside", "<p>inside</p>".to_string()).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>other host</p>"))
        .expect(0)
        .mount(&other)
        .await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    crawler.crawl(&CancellationToken::new()).await.unwrap();

    let mut expected = vec![page_url(&server, "/"), page_url(&server, "/inside")];
    expected.sort();
    assert_eq!(spy.urls(), expected);
}

#[tokio::test]
async fn test_robots_disallow_all_blocks_every_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sitemap_xml(&[page_url(&server, "/page")])),
        )
        .mount(&server)
        .await;
    mount_never(&server, "/").await;
    mount_never(&server, "/page").await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    let report = crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert!(spy.urls().is_empty());
    assert_eq!(report.pages_admitted, 0);
}

#[tokio::test]
async fn test_robots_group_for_our_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: *\nDisallow: /\n\nUser-agent: TestBot\nDisallow: /admin\n",
        ))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        html_with_links(&["/admin/panel".to_string(), "/public".to_string()]),
    )
    .await;
    mount_page(&server, "/public", "<p>public</p>".to_string()).await;
    mount_never(&server, "/admin/panel").await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert_eq!(spy.urls().len(), 2);
}

#[tokio::test]
async fn test_malformed_robots_allows_all() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>{{{ not robots }}}</body></html>"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", html_with_links(&["/page".to_string()])).await;
    mount_page(&server, "/page", "<p>page</p>".to_string()).await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    assert!(crawler.robots().is_allowed("/anything", USER_AGENT));

    crawler.crawl(&CancellationToken::new()).await.unwrap();
    assert_eq!(spy.urls().len(), 2);
}

#[tokio::test]
async fn test_missing_robots_allows_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = crawler_with(&server, vec![]).await;

    assert!(crawler.robots().is_allowed("/private/anything", USER_AGENT));
    assert!(crawler.robots().sitemaps().is_empty());
    assert_eq!(crawler.phase(), CrawlPhase::Idle);
}

#[tokio::test]
async fn test_robots_declared_sitemap_is_seeded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nAllow: /\nSitemap: {}\n",
            page_url(&server, "/custom-sitemap.xml")
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/custom-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&[page_url(
            &server,
            "/from-custom",
        )])))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/from-custom", "<p>listed</p>".to_string()).await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert!(spy.urls().contains(&page_url(&server, "/from-custom")));
}

#[tokio::test]
async fn test_malformed_sitemap_falls_back_to_base_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<?xml version="1.0"?><urlset><url><loc>broken</url></urlset>"#),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>home</p>".to_string()).await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert_eq!(spy.urls(), vec![page_url(&server, "/")]);
}

#[tokio::test]
async fn test_non_2xx_pages_never_processed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(html_with_links(&["/hidden".to_string()])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_never(&server, "/hidden").await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    let cancel = CancellationToken::new();

    crawler.start_workers();
    assert_eq!(
        crawler
            .add_url_to_crawl_queue(&cancel, Target::parse(&page_url(&server, "/broken")).unwrap())
            .await,
        Admission::Queued
    );
    let report = crawler.crawl(&cancel).await.unwrap();

    assert!(spy.urls().is_empty());
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.fetch_failures, 2);
    assert_eq!(report.processor_invocations, 0);
}

#[tokio::test]
async fn test_fan_out_to_every_processor() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_with_links(&["/a".to_string(), "/b".to_string()])).await;
    mount_page(&server, "/a", "<p>page a</p>".to_string()).await;
    mount_page(&server, "/b", "<p>page b</p>".to_string()).await;

    let spies: Vec<Arc<SpyProcessor>> = (0..3).map(|_| Arc::new(SpyProcessor::default())).collect();
    let processors = spies
        .iter()
        .map(|spy| spy.clone() as Arc<dyn Processor>)
        .collect();
    let crawler = crawler_with(&server, processors).await;
    let report = crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.processor_invocations, 9);
    let first = spies[0].calls();
    assert_eq!(first.len(), 3);
    assert!(first
        .iter()
        .any(|(url, content)| url == &page_url(&server, "/a") && content == "<p>page a</p>"));
    for spy in &spies[1..] {
        assert_eq!(spy.calls(), first);
    }
}

#[tokio::test]
async fn test_failing_processor_does_not_affect_others() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_with_links(&["/next".to_string()])).await;
    mount_page(&server, "/next", "<p>next</p>".to_string()).await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(
        &server,
        vec![
            Arc::new(FailingProcessor) as Arc<dyn Processor>,
            spy.clone() as Arc<dyn Processor>,
        ],
    )
    .await;
    let report = crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert_eq!(spy.urls().len(), 2);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.processor_failures, 2);
}

#[tokio::test]
async fn test_cancellation_stops_further_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_with_links(&["/next".to_string()]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    mount_never(&server, "/next").await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), crawler.crawl(&cancel))
        .await
        .expect("cancelled crawl should still shut down")
        .unwrap();

    assert!(spy.urls().is_empty());
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(crawler.phase(), CrawlPhase::Complete);
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    mount_never(&server, "/").await;
    mount_never(&server, "/sitemap.xml").await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    crawler.crawl(&cancel).await.unwrap();

    assert!(spy.urls().is_empty());
}

#[tokio::test]
async fn test_ad_hoc_crawl_page() {
    let server = MockServer::start().await;

    mount_page(&server, "/start", html_with_links(&["/linked".to_string()])).await;
    mount_page(&server, "/linked", html_with_links(&["/start".to_string()])).await;

    let spy = Arc::new(SpyProcessor::default());
    let crawler = crawler_with(&server, vec![spy.clone() as Arc<dyn Processor>]).await;
    let cancel = CancellationToken::new();

    crawler.start_workers();
    crawler
        .crawl_page(&cancel, Target::parse(&page_url(&server, "/start")).unwrap())
        .await;
    crawler.shutdown().await;

    let mut expected = vec![page_url(&server, "/start"), page_url(&server, "/linked")];
    expected.sort();
    assert_eq!(spy.urls(), expected);
}

#[tokio::test]
async fn test_link_log_from_config_file() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_with_links(&["/about".to_string()])).await;
    mount_page(&server, "/about", "<p>about</p>".to_string()).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[crawler]
base-url = "{}"
worker-pool-size = 2
request-timeout-ms = 5000

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0"
contact-url = "https://example.com/bot"
contact-email = "bot@example.com"
"#,
        server.uri()
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let settings = CrawlSettings::try_from(&config).unwrap();
    assert_eq!(settings.user_agent, USER_AGENT);

    let link_log = Arc::new(LinkLogProcessor::new());
    let crawler = SiteCrawler::new(
        settings,
        vec![link_log.clone() as Arc<dyn Processor>],
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    crawler.crawl(&CancellationToken::new()).await.unwrap();

    assert_eq!(link_log.pages_processed(), 2);
    assert_eq!(link_log.links_found(), 1);
    assert_eq!(
        link_log.links_for(&page_url(&server, "/")),
        Some(vec!["/about".to_string()])
    );
}
