//! Crawl orchestration
//!
//! This module owns both worker stages and drives one crawl from start to
//! finish:
//! - Reading robots.txt once, at construction
//! - Seeding from `/sitemap.xml`, robots-declared sitemaps and the base URL
//! - Admitting discovered links (robots, host, dedup)
//! - Fanning fetched pages out to processors
//! - Ordered shutdown: crawl stage drains fully before post-processing closes

use crate::config::CrawlSettings;
use crate::crawler::ledger::DedupLedger;
use crate::crawler::parser::extract_links;
use crate::crawler::sitemap::parse_sitemap;
use crate::crawler::stage::WorkQueue;
use crate::crawler::task::{CrawlTask, ProcessTask};
use crate::crawler::PageFetcher;
use crate::processor::{ProcessingError, Processor};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::url::{resolve_and_clean, same_host, Target};
use crate::CrawlerError;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Lifecycle phase of a crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CrawlPhase {
    Idle = 0,
    Seeding = 1,
    Draining = 2,
    ShuttingDown = 3,
    Complete = 4,
}

impl CrawlPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Seeding,
            2 => Self::Draining,
            3 => Self::ShuttingDown,
            4 => Self::Complete,
            _ => Self::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Draining => "draining",
            Self::ShuttingDown => "shutting-down",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of offering a Target for crawling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Enqueued as a new crawl task
    Queued,
    /// robots.txt disallows the path for our user agent
    RobotsDisallowed,
    /// The Target lives on another host
    ForeignHost,
    /// The Target was admitted earlier in this crawl
    AlreadyAdmitted,
    /// The crawl stage was already closed
    QueueClosed,
}

/// Counters describing a crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages_admitted: u64,
    pub pages_fetched: u64,
    pub fetch_failures: u64,
    pub processor_invocations: u64,
    pub processor_failures: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct Stats {
    admitted: AtomicU64,
    fetched: AtomicU64,
    fetch_failures: AtomicU64,
    invocations: AtomicU64,
    processor_failures: AtomicU64,
}

impl Stats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct Inner {
    base: Target,
    user_agent: String,
    worker_pool_size: usize,
    fetcher: PageFetcher,
    robots: RobotsPolicy,
    ledger: DedupLedger,
    processors: Vec<Arc<dyn Processor>>,
    crawl_queue: WorkQueue<CrawlTask>,
    process_queue: WorkQueue<ProcessTask>,
    phase: AtomicU8,
    workers_started: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Stats,
    created: Instant,
}

/// Crawls every reachable page of one host
///
/// Cloning is cheap and every clone drives the same crawl. A crawler is
/// single-use: once [`SiteCrawler::shutdown`] has run, its queues stay
/// closed and further admissions are rejected.
#[derive(Clone)]
pub struct SiteCrawler {
    inner: Arc<Inner>,
}

impl SiteCrawler {
    /// Creates a crawler and reads the site's robots.txt
    ///
    /// The robots.txt fetch uses the configured timeout and never fails
    /// construction; any problem with it degrades to an allow-all policy.
    ///
    /// # Arguments
    ///
    /// * `settings` - Base URL, user agent, timeout, pool size and queue capacities
    /// * `processors` - Processors to run on every fetched page, in order
    /// * `cancel` - Cancellation scope for the robots.txt fetch
    ///
    /// # Returns
    ///
    /// * `Ok(SiteCrawler)` - Crawler ready to run
    /// * `Err(CrawlerError)` - The base URL is unusable or the HTTP client could not be built
    pub async fn new(
        settings: CrawlSettings,
        processors: Vec<Arc<dyn Processor>>,
        cancel: &CancellationToken,
    ) -> Result<Self, CrawlerError> {
        let base = Target::parse(settings.base_url.as_str()).map_err(|e| {
            CrawlerError::InvalidBaseUrl {
                url: settings.base_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let fetcher = PageFetcher::new(&settings.user_agent, settings.request_timeout)?;
        let robots = fetch_robots(&fetcher, base.url(), cancel).await;

        tracing::info!(
            "Crawler ready for {} ({} workers per stage, {} processors, timeout {:?})",
            base,
            settings.worker_pool_size,
            processors.len(),
            settings.request_timeout
        );

        Ok(Self {
            inner: Arc::new(Inner {
                base,
                user_agent: settings.user_agent,
                worker_pool_size: settings.worker_pool_size.max(1),
                fetcher,
                robots,
                ledger: DedupLedger::new(),
                processors,
                crawl_queue: WorkQueue::new("crawl", settings.crawl_queue_capacity),
                process_queue: WorkQueue::new("post-process", settings.process_queue_capacity),
                phase: AtomicU8::new(CrawlPhase::Idle as u8),
                workers_started: AtomicBool::new(false),
                workers: Mutex::new(Vec::new()),
                stats: Stats::default(),
                created: Instant::now(),
            }),
        })
    }

    /// Crawls the whole site and returns once every page has been processed
    ///
    /// # Crawl Flow
    ///
    /// 1. Start both worker pools
    /// 2. Seed from `/sitemap.xml` and every sitemap robots.txt declares
    /// 3. Seed the base URL
    /// 4. Wait for the crawl stage to drain, then close it
    /// 5. Wait for the post-process stage to drain, then close it
    ///
    /// Sitemap failures are logged and treated as an empty sitemap.
    /// Cancelling `cancel` aborts in-flight fetches and skips queued tasks;
    /// the crawl still shuts down in order and returns normally.
    ///
    /// # Errors
    ///
    /// Only [`CrawlerError::SitemapUrl`], when the sitemap URL cannot be built
    /// from the base URL.
    pub async fn crawl(&self, cancel: &CancellationToken) -> Result<CrawlReport, CrawlerError> {
        let inner = &self.inner;
        let sitemap_url = inner
            .base
            .url()
            .join("/sitemap.xml")
            .map_err(CrawlerError::SitemapUrl)?;

        self.start_workers();
        inner.set_phase(CrawlPhase::Seeding);

        for sitemap in inner.sitemap_urls(sitemap_url) {
            inner.seed_from_sitemap(cancel, &sitemap).await;
        }
        inner.admit(cancel, inner.base.clone()).await;

        self.shutdown().await;

        let report = self.report();
        tracing::info!(
            "Crawl of {} finished in {:.2}s: {} pages fetched, {} fetch failures",
            inner.base,
            report.elapsed.as_secs_f64(),
            report.pages_fetched,
            report.fetch_failures
        );
        Ok(report)
    }

    /// Spawns both worker pools
    ///
    /// Only the first call has an effect.
    pub fn start_workers(&self) {
        let inner = &self.inner;
        if inner.workers_started.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut handles = Vec::with_capacity(inner.worker_pool_size * 2);
        for _ in 0..inner.worker_pool_size {
            let crawl = Arc::clone(inner);
            handles.push(tokio::spawn(async move {
                crawl
                    .crawl_queue
                    .run_worker(|task| crawl.execute_crawl(task))
                    .await;
            }));

            let process = Arc::clone(inner);
            handles.push(tokio::spawn(async move {
                process
                    .process_queue
                    .run_worker(|task| process.execute_process(task))
                    .await;
            }));
        }

        tracing::debug!("Started {} workers per stage", inner.worker_pool_size);
        inner.lock_workers().extend(handles);
    }

    /// Offers a Target for crawling
    ///
    /// Checks run in order: robots.txt, same host, first admission. Only a
    /// Target passing all three is enqueued. Queued tasks run once workers
    /// are started.
    pub async fn add_url_to_crawl_queue(
        &self,
        cancel: &CancellationToken,
        target: Target,
    ) -> Admission {
        self.inner.admit(cancel, target).await
    }

    /// Crawls one page on the calling task, outside the queue
    ///
    /// The page is fetched, its links are admitted to the crawl queue and it
    /// is dispatched to every processor, exactly as a crawl worker would.
    /// The Target is recorded in the dedup ledger so links back to it are
    /// not crawled again. Start the workers to have discovered links and
    /// processors run.
    pub async fn crawl_page(&self, cancel: &CancellationToken, target: Target) {
        self.inner.ledger.try_admit(&target);
        self.inner
            .execute_crawl(CrawlTask {
                target,
                scope: cancel.clone(),
            })
            .await;
    }

    /// Drains both stages in order and joins every worker
    ///
    /// Waits for the crawl stage to become idle, closes it, then does the
    /// same for the post-process stage. Workers are started first if they
    /// were not, so queued work is never stranded.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        self.start_workers();

        inner.set_phase(CrawlPhase::Draining);
        inner.crawl_queue.wait_idle().await;

        inner.set_phase(CrawlPhase::ShuttingDown);
        inner.crawl_queue.close();
        inner.process_queue.wait_idle().await;
        inner.process_queue.close();

        let handles = std::mem::take(&mut *inner.lock_workers());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        inner.set_phase(CrawlPhase::Complete);
    }

    /// Returns the current lifecycle phase
    pub fn phase(&self) -> CrawlPhase {
        CrawlPhase::from_u8(self.inner.phase.load(Ordering::Acquire))
    }

    /// Returns the counters gathered so far
    pub fn report(&self) -> CrawlReport {
        let stats = &self.inner.stats;
        CrawlReport {
            pages_admitted: stats.admitted.load(Ordering::Relaxed),
            pages_fetched: stats.fetched.load(Ordering::Relaxed),
            fetch_failures: stats.fetch_failures.load(Ordering::Relaxed),
            processor_invocations: stats.invocations.load(Ordering::Relaxed),
            processor_failures: stats.processor_failures.load(Ordering::Relaxed),
            elapsed: self.inner.created.elapsed(),
        }
    }

    pub fn robots(&self) -> &RobotsPolicy {
        &self.inner.robots
    }

    pub fn base_url(&self) -> &Target {
        &self.inner.base
    }

    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }
}

impl Inner {
    fn set_phase(&self, phase: CrawlPhase) {
        let previous = CrawlPhase::from_u8(self.phase.swap(phase as u8, Ordering::AcqRel));
        if previous != phase {
            tracing::debug!("Crawl phase {} -> {}", previous, phase);
        }
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `/sitemap.xml` followed by every robots-declared sitemap, without duplicates
    fn sitemap_urls(&self, default: Url) -> Vec<Url> {
        let mut urls = vec![default];
        for declared in self.robots.sitemaps() {
            match Url::parse(declared) {
                Ok(url) if !urls.contains(&url) => urls.push(url),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring sitemap {:?} from robots.txt: {}", declared, e),
            }
        }
        urls
    }

    async fn seed_from_sitemap(&self, cancel: &CancellationToken, sitemap: &Url) {
        let body = match self.fetcher.fetch(cancel, sitemap).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Sitemap unavailable: {}", e);
                return;
            }
        };

        let locations = match parse_sitemap(&body) {
            Ok(locations) => locations,
            Err(e) => {
                tracing::error!("Failed to parse sitemap {}: {}", sitemap, e);
                return;
            }
        };

        tracing::info!("Sitemap {} lists {} URLs", sitemap, locations.len());
        for location in locations {
            match resolve_and_clean(sitemap, &location) {
                Ok(target) => {
                    self.admit(cancel, target).await;
                }
                Err(e) => tracing::warn!("Skipping sitemap entry {:?}: {}", location, e),
            }
        }
    }

    async fn admit(&self, cancel: &CancellationToken, target: Target) -> Admission {
        if !self.robots.is_allowed(target.as_str(), &self.user_agent) {
            tracing::warn!("Robots.txt disallows {}", target);
            return Admission::RobotsDisallowed;
        }

        if !same_host(target.url(), self.base.url()) {
            tracing::debug!("Skipping off-site URL {}", target);
            return Admission::ForeignHost;
        }

        if !self.ledger.try_admit(&target) {
            return Admission::AlreadyAdmitted;
        }

        let url = target.to_string();
        let task = CrawlTask {
            target,
            scope: cancel.clone(),
        };
        match self.crawl_queue.submit(task).await {
            Ok(()) => {
                Stats::bump(&self.stats.admitted);
                tracing::debug!("Queued {}", url);
                Admission::Queued
            }
            Err(e) => {
                tracing::warn!("Dropping {}: {}", url, e);
                Admission::QueueClosed
            }
        }
    }

    async fn execute_crawl(&self, task: CrawlTask) {
        let CrawlTask { target, scope } = task;
        if scope.is_cancelled() {
            tracing::debug!("Skipping {}: crawl cancelled", target);
            return;
        }

        let content = match self.fetcher.fetch(&scope, target.url()).await {
            Ok(content) => content,
            Err(e) if e.is_cancelled() => {
                tracing::debug!("{}", e);
                return;
            }
            Err(e) => {
                Stats::bump(&self.stats.fetch_failures);
                tracing::warn!("Failed to fetch {}: {}", target, e);
                return;
            }
        };
        Stats::bump(&self.stats.fetched);
        tracing::info!("Crawled {}", target);

        for href in extract_links(&content) {
            match resolve_and_clean(self.base.url(), &href) {
                Ok(link) => {
                    self.admit(&scope, link).await;
                }
                Err(e) => tracing::debug!("Skipping link {:?} on {}: {}", href, target, e),
            }
        }

        self.dispatch(&scope, &target, Arc::from(content)).await;
    }

    /// Submits one post-process task per registered processor
    async fn dispatch(&self, scope: &CancellationToken, target: &Target, content: Arc<str>) {
        for processor_index in 0..self.processors.len() {
            let task = ProcessTask {
                target: target.clone(),
                content: Arc::clone(&content),
                processor_index,
                scope: scope.clone(),
            };
            if let Err(e) = self.process_queue.submit(task).await {
                tracing::warn!("Dropping {} for processing: {}", target, e);
            }
        }
    }

    async fn execute_process(&self, task: ProcessTask) {
        if task.scope.is_cancelled() {
            tracing::debug!("Skipping processing of {}: crawl cancelled", task.target);
            return;
        }

        let Some(processor) = self.processors.get(task.processor_index) else {
            return;
        };

        Stats::bump(&self.stats.invocations);
        match processor
            .process(&task.scope, &task.target, &task.content)
            .await
        {
            Ok(()) => {}
            Err(ProcessingError::Cancelled) => {
                tracing::debug!("Processor {} cancelled on {}", processor.name(), task.target);
            }
            Err(e) => {
                Stats::bump(&self.stats.processor_failures);
                tracing::error!("Processor {} failed on {}: {}", processor.name(), task.target, e);
            }
        }
    }
}
