use crate::url::domain::base_domain;
use crate::UrlResult;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the corpus crawler
///
/// Every section has defaults, so an empty file (or no file at all) yields
/// the built-in fashion crawl.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetcher: FetcherConfig,
    pub filter: FilterConfig,
    pub wikipedia: WikipediaConfig,
    pub output: OutputConfig,
    #[serde(rename = "site", default = "default_sites")]
    pub sites: Vec<SiteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            fetcher: FetcherConfig::default(),
            filter: FilterConfig::default(),
            wikipedia: WikipediaConfig::default(),
            output: OutputConfig::default(),
            sites: default_sites(),
        }
    }
}

/// Site crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Stored articles after which a site crawl stops
    #[serde(rename = "max-articles-per-site")]
    pub max_articles_per_site: u64,

    /// Fixed politeness delay after every fetch (milliseconds)
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: u64,

    /// Upper bound of the random delay added to `crawl-delay-ms` (milliseconds)
    #[serde(rename = "crawl-jitter-ms")]
    pub crawl_jitter_ms: u64,

    /// Pause between two consecutive sites (milliseconds)
    #[serde(rename = "site-pause-ms")]
    pub site_pause_ms: u64,

    /// Write a checkpoint every this many stored articles
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: u64,

    /// Log progress every this many stored articles
    #[serde(rename = "progress-interval")]
    pub progress_interval: u64,

    /// Days before a stored document is eligible for re-fetching
    #[serde(rename = "recheck-days")]
    pub recheck_days: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_articles_per_site: 1000,
            crawl_delay_ms: 3000,
            crawl_jitter_ms: 2000,
            site_pause_ms: 10_000,
            checkpoint_interval: 20,
            progress_interval: 10,
            recheck_days: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn recheck_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.recheck_days))
    }

    pub fn site_pause(&self) -> Duration {
        Duration::from_millis(self.site_pause_ms)
    }
}

/// HTTP fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Attempts per URL before giving up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Default per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Timeout used for site pages (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Cooldown after a 403/429 response (seconds)
    #[serde(rename = "rate-limit-cooldown-secs")]
    pub rate_limit_cooldown_secs: u64,

    /// Cap on the exponential backoff (seconds)
    #[serde(rename = "max-backoff-secs")]
    pub max_backoff_secs: u64,

    /// Upper bound of the random backoff jitter (seconds)
    #[serde(rename = "backoff-jitter-secs")]
    pub backoff_jitter_secs: u64,

    /// Accept self-signed or otherwise invalid TLS certificates
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            request_timeout_secs: 45,
            page_timeout_secs: 60,
            rate_limit_cooldown_secs: 30,
            max_backoff_secs: 60,
            backoff_jitter_secs: 5,
            accept_invalid_certs: false,
        }
    }
}

impl FetcherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

/// Article acceptance gates
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum word count of accepted content
    #[serde(rename = "min-words")]
    pub min_words: usize,

    /// Minimum number of distinct keywords found in accepted content
    #[serde(rename = "min-keyword-hits")]
    pub min_keyword_hits: usize,

    /// Topic keywords, matched case-insensitively as substrings
    pub keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_words: 200,
            min_keyword_hits: 3,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Wikipedia category walk configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    /// MediaWiki Action API endpoint
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Prefix that turns a page title into its article URL
    #[serde(rename = "article-base-url")]
    pub article_base_url: String,

    /// User-Agent sent with API requests
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Categories the walk starts from
    #[serde(rename = "root-categories")]
    pub root_categories: Vec<String>,

    /// Stored documents after which the walk stops
    #[serde(rename = "max-documents")]
    pub max_documents: u64,

    /// Maximum subcategory depth below a root category
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Delay after each category member (milliseconds)
    #[serde(rename = "member-delay-ms")]
    pub member_delay_ms: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            article_base_url: "https://en.wikipedia.org/wiki/".to_string(),
            user_agent: "FashionCorpusCrawler/1.0 (research corpus builder)".to_string(),
            root_categories: vec![
                "Category:Fashion".to_string(),
                "Category:Clothing".to_string(),
                "Category:Textiles".to_string(),
                "Category:Fashion_designers".to_string(),
            ],
            max_documents: 30_000,
            max_depth: 3,
            member_delay_ms: 100,
        }
    }
}

impl WikipediaConfig {
    pub fn member_delay(&self) -> Duration {
        Duration::from_millis(self.member_delay_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the crawler checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Path to the JSON corpus statistics
    #[serde(rename = "statistics-path")]
    pub statistics_path: String,

    /// Path to the text corpus report
    #[serde(rename = "report-path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "fashion_corpus.db".to_string(),
            checkpoint_path: "crawler_state.json".to_string(),
            statistics_path: "corpus_statistics.json".to_string(),
            report_path: "corpus_report.txt".to_string(),
        }
    }
}

/// A site to crawl, with its seeds and article heuristics
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Source name stored with every document from this site
    pub name: String,

    /// Site root; its host is the crawl boundary
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Seed URLs, enqueued at depth 0
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Lower values are crawled first
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Path fragments that mark article URLs on this site
    #[serde(rename = "article-patterns", default)]
    pub article_patterns: Vec<String>,
}

impl SiteConfig {
    pub fn new(
        name: &str,
        base_url: &str,
        start_paths: &[&str],
        priority: u32,
        patterns: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            start_urls: start_paths
                .iter()
                .map(|p| format!("{}{}", base_url, p))
                .collect(),
            priority,
            article_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Host the crawl of this site is confined to
    pub fn base_domain(&self) -> UrlResult<String> {
        base_domain(&self.base_url)
    }
}

fn default_priority() -> u32 {
    1
}

/// The fashion publications crawled when no `[[site]]` table is configured
pub fn default_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig::new(
            "Vogue",
            "https://www.vogue.com",
            &["/fashion", "/fashion/articles", "/runway", "/trends"],
            1,
            &["/article/", "/story/", "/runway/", "/trends/"],
        ),
        SiteConfig::new(
            "Harper's Bazaar",
            "https://www.harpersbazaar.com",
            &["/fashion/", "/fashion/trends/", "/fashion/designers/"],
            1,
            &["/fashion/", "/style/", "/trends/", "/designers/"],
        ),
        SiteConfig::new(
            "ELLE",
            "https://www.elle.com",
            &["/fashion/", "/trends/", "/runway/"],
            1,
            &["/fashion/", "/trends/", "/runway/", "/style/"],
        ),
        SiteConfig::new(
            "Business of Fashion",
            "https://www.businessoffashion.com",
            &["/articles", "/news", "/analysis"],
            2,
            &["/articles/", "/news/", "/analysis/"],
        ),
        SiteConfig::new(
            "The Fashion Law",
            "https://www.thefashionlaw.com",
            &["/category/fashion/", "/category/business/"],
            2,
            &["/category/"],
        ),
    ]
}

const DEFAULT_KEYWORDS: &[&str] = &[
    "fashion",
    "clothing",
    "textile",
    "designer",
    "model",
    "runway",
    "collection",
    "couture",
    "haute",
    "tailoring",
    "fabric",
    "silk",
    "cotton",
    "wool",
    "linen",
    "pattern",
    "sewing",
    "garment",
    "apparel",
    "wardrobe",
    "style",
    "trend",
    "vogue",
    "mode",
    "dress",
    "suit",
    "jacket",
    "skirt",
    "blouse",
    "accessory",
    "jewelry",
    "footwear",
    "handbag",
    "perfume",
    "cosmetics",
    "luxury",
    "brand",
    "retail",
    "manufacturing",
    "sustainable",
    "trendy",
    "outfit",
    "chic",
    "elegant",
    "catwalk",
    "fashion show",
    "design",
    "couturier",
    "atelier",
];
