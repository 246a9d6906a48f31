//! Crawl engine - site crawl and category walk orchestration
//!
//! The engine owns everything a crawl touches: the shared fetcher, the
//! document pipeline (and with it the store), the checkpoint manager and
//! the clock. Sites are crawled one at a time, one frontier entry per
//! [`CrawlEngine::step`].

use crate::config::{Config, SiteConfig};
use crate::crawler::backoff::politeness_delay;
use crate::crawler::category::{CategoryWalker, WalkReport, WIKIPEDIA_SOURCE};
use crate::crawler::clock::{Clock, Shutdown, SystemClock};
use crate::crawler::fetcher::{FetchRequest, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::crawler::pipeline::DocumentPipeline;
use crate::extract::is_html;
use crate::state::{CheckpointManager, CheckpointStore, CrawlerState, JsonCheckpointStore};
use crate::storage::{open_storage, Storage};
use crate::url::is_article_url;
use crate::wiki::{EncyclopediaClient, MediaWikiClient};
use crate::{CorpusError, UrlResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Why a site crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The frontier ran dry
    Exhausted,
    /// The per-site article cap was reached
    Capped,
    /// Shutdown was requested
    Interrupted,
}

/// Lifecycle of one site crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeded,
    Draining,
    Finished(FinishReason),
}

/// Progress of one site crawl
#[derive(Debug)]
pub struct SiteCrawl {
    site: SiteConfig,
    base_domain: String,
    frontier: Frontier,
    phase: CrawlPhase,
    articles: u64,
    last_url: Option<String>,
    last_depth: u32,
}

impl SiteCrawl {
    /// Seeds a frontier with the site's start URLs
    pub fn new(site: &SiteConfig) -> UrlResult<Self> {
        let base_domain = site.base_domain()?;
        let mut frontier = Frontier::new();
        frontier.seed(&site.start_urls, &base_domain);

        Ok(Self {
            site: site.clone(),
            base_domain,
            frontier,
            phase: CrawlPhase::Seeded,
            articles: 0,
            last_url: None,
            last_depth: 0,
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn articles(&self) -> u64 {
        self.articles
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    fn finish(&mut self, reason: FinishReason) -> CrawlPhase {
        self.phase = CrawlPhase::Finished(reason);
        self.phase
    }

    fn progress(&self) -> CrawlerState {
        CrawlerState {
            last_url: self.last_url.clone(),
            articles_found: self.articles,
            urls_visited: self.frontier.visited_count() as u64,
            depth: self.last_depth,
            completed: false,
            last_updated: None,
        }
    }
}

/// Summary of a finished site crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub name: String,
    pub articles: u64,
    pub urls_visited: u64,
    pub reason: FinishReason,
}

/// Drives site crawls and the category walk
pub struct CrawlEngine {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    pipeline: DocumentPipeline,
    checkpoints: CheckpointManager,
    clock: Arc<dyn Clock>,
    shutdown: Shutdown,
}

impl CrawlEngine {
    /// Assembles an engine from its parts and loads the last checkpoint
    pub fn new(
        config: Config,
        fetcher: Arc<Fetcher>,
        storage: Box<dyn Storage>,
        checkpoint_store: Box<dyn CheckpointStore>,
        clock: Arc<dyn Clock>,
        shutdown: Shutdown,
    ) -> Self {
        let pipeline = DocumentPipeline::new(
            storage,
            config.filter.clone(),
            config.crawler.recheck_window(),
        );

        let mut checkpoints = CheckpointManager::new(checkpoint_store);
        checkpoints.load();

        Self {
            config: Arc::new(config),
            fetcher,
            pipeline,
            checkpoints,
            clock,
            shutdown,
        }
    }

    /// Wires the production engine: system clock, SQLite store and JSON
    /// checkpoint file from the output section
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built or the database cannot be
    /// opened.
    pub fn from_config(config: Config, shutdown: Shutdown) -> Result<Self, CorpusError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(shutdown.clone()));
        let fetcher = Arc::new(Fetcher::new(&config.fetcher, clock.clone(), shutdown.clone())?);

        let storage = open_storage(Path::new(&config.output.database_path))?;
        tracing::info!("Opened document store at {}", config.output.database_path);

        let checkpoint_store = JsonCheckpointStore::new(&config.output.checkpoint_path);

        Ok(Self::new(
            config,
            fetcher,
            Box::new(storage),
            Box::new(checkpoint_store),
            clock,
            shutdown,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &dyn Storage {
        self.pipeline.storage()
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// MediaWiki client sharing this engine's fetcher
    pub fn wikipedia_client(&self) -> Result<MediaWikiClient, CorpusError> {
        MediaWikiClient::new(
            self.fetcher.clone(),
            &self.config.wikipedia.api_url,
            &self.config.wikipedia.user_agent,
        )
    }

    /// Crawls every configured site in ascending priority order
    ///
    /// Sites with equal priority keep their configured order. A pause
    /// separates consecutive sites; shutdown ends the sequence.
    pub async fn crawl_all_sites(&mut self) -> Vec<SiteReport> {
        let mut sites = self.config.sites.clone();
        sites.sort_by_key(|site| site.priority);

        let mut reports = Vec::new();
        for (i, site) in sites.iter().enumerate() {
            if self.shutdown.is_triggered() {
                break;
            }
            if i > 0 {
                tracing::info!("Pausing before next site");
                self.clock.sleep(self.config.crawler.site_pause()).await;
            }

            match self.crawl_site(site).await {
                Ok(report) => {
                    let interrupted = report.reason == FinishReason::Interrupted;
                    reports.push(report);
                    if interrupted {
                        break;
                    }
                }
                Err(e) => tracing::error!("Skipping site {}: {}", site.name, e),
            }
        }

        let total: u64 = reports.iter().map(|r| r.articles).sum();
        tracing::info!("Site crawl finished: {} articles from {} sites", total, reports.len());
        reports
    }

    /// Crawls one site until its frontier is exhausted, its article cap is
    /// reached, or shutdown is requested
    pub async fn crawl_site(&mut self, site: &SiteConfig) -> Result<SiteReport, CorpusError> {
        let mut crawl = SiteCrawl::new(site)?;

        if let Some(previous) = self.checkpoints.get(&site.name) {
            tracing::info!(
                "Previous run of {}: {} articles, {} URLs (completed: {})",
                site.name,
                previous.articles_found,
                previous.urls_visited,
                previous.completed
            );
        }
        tracing::info!(
            "Starting crawl of {} ({} seeds)",
            site.name,
            crawl.frontier.len()
        );

        let reason = loop {
            if let CrawlPhase::Finished(reason) = self.step(&mut crawl).await {
                break reason;
            }
        };

        let completed = reason != FinishReason::Interrupted;
        let state = if completed {
            CrawlerState {
                last_url: None,
                depth: self.config.crawler.max_depth,
                completed: true,
                ..crawl.progress()
            }
        } else {
            crawl.progress()
        };
        self.checkpoints.save(&site.name, state, self.clock.now());

        tracing::info!(
            "Finished {}: {} articles, {} URLs visited ({:?})",
            site.name,
            crawl.articles,
            crawl.frontier.visited_count(),
            reason
        );

        Ok(SiteReport {
            name: site.name.clone(),
            articles: crawl.articles,
            urls_visited: crawl.frontier.visited_count() as u64,
            reason,
        })
    }

    /// Processes the next frontier entry of `crawl`
    ///
    /// Returns the phase after the step. A finished crawl stays finished.
    pub async fn step(&mut self, crawl: &mut SiteCrawl) -> CrawlPhase {
        if let CrawlPhase::Finished(_) = crawl.phase {
            return crawl.phase;
        }
        if self.shutdown.is_triggered() {
            return crawl.finish(FinishReason::Interrupted);
        }
        if crawl.articles >= self.config.crawler.max_articles_per_site {
            return crawl.finish(FinishReason::Capped);
        }

        let entry = match crawl.frontier.pop() {
            Some(entry) => entry,
            None => return crawl.finish(FinishReason::Exhausted),
        };
        crawl.phase = CrawlPhase::Draining;

        let max_depth = self.config.crawler.max_depth;
        if entry.depth > max_depth || !crawl.frontier.mark_visited(&entry.url) {
            tracing::trace!("Discarding {} (depth {})", entry.url, entry.depth);
            return crawl.phase;
        }
        crawl.last_url = Some(entry.url.clone());
        crawl.last_depth = entry.depth;

        tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);
        let request =
            FetchRequest::get(&entry.url).with_timeout(self.config.fetcher.page_timeout());
        let result = self.fetcher.fetch(&request).await;

        match result {
            Ok(page) => {
                if is_article_url(&entry.url, &crawl.site.article_patterns) {
                    let outcome =
                        self.pipeline
                            .process_page(&entry.url, &page, &crawl.site.name, self.clock.now());
                    if outcome.is_stored() {
                        crawl.articles += 1;
                        self.record_article(crawl);
                    }
                }

                if entry.depth < max_depth && is_html(&page.content_type) {
                    let links = extract_links(&page.body, &page.final_url, &crawl.base_domain);
                    let counts = crawl.frontier.enqueue_discovered(
                        links,
                        entry.depth + 1,
                        &crawl.site.article_patterns,
                    );
                    tracing::trace!(
                        "{}: {} article links, {} other links queued",
                        entry.url,
                        counts.articles,
                        counts.others
                    );
                }
            }
            Err(e) => tracing::warn!("Giving up on {}: {}", entry.url, e),
        }

        self.polite_pause().await;
        crawl.phase
    }

    /// Walks the Wikipedia category tree with `client`
    pub async fn crawl_wikipedia(&mut self, client: &dyn EncyclopediaClient) -> WalkReport {
        tracing::info!(
            "Starting Wikipedia walk from {} root categories",
            self.config.wikipedia.root_categories.len()
        );

        let mut walker = CategoryWalker::new(self.config.wikipedia.clone());
        let report = walker
            .walk(client, &mut self.pipeline, self.clock.as_ref(), &self.shutdown)
            .await;

        let state = CrawlerState {
            last_url: None,
            articles_found: report.documents,
            urls_visited: report.pages_seen as u64,
            depth: self.config.wikipedia.max_depth,
            completed: !report.interrupted,
            last_updated: None,
        };
        self.checkpoints.save(WIKIPEDIA_SOURCE, state, self.clock.now());

        report
    }

    fn record_article(&mut self, crawl: &SiteCrawl) {
        let crawler = &self.config.crawler;

        if crawler.progress_interval > 0 && crawl.articles % crawler.progress_interval == 0 {
            tracing::info!(
                "{}: {} articles, {} URLs visited, {} queued",
                crawl.site.name,
                crawl.articles,
                crawl.frontier.visited_count(),
                crawl.frontier.len()
            );
        }

        if crawler.checkpoint_interval > 0 && crawl.articles % crawler.checkpoint_interval == 0 {
            self.checkpoints
                .save(&crawl.site.name, crawl.progress(), self.clock.now());
        }
    }

    async fn polite_pause(&self) {
        let crawler = &self.config.crawler;
        let delay = politeness_delay(
            Duration::from_millis(crawler.crawl_delay_ms),
            Duration::from_millis(crawler.crawl_jitter_ms),
            rand::random::<f64>(),
        );
        self.clock.sleep(delay).await;
    }
}
