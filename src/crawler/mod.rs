//! Crawler module for page fetching and corpus building
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry, backoff and header rotation
//! - Link extraction and the per-site frontier
//! - The extraction and storage pipeline
//! - The Wikipedia category walk
//! - Overall crawl coordination

mod backoff;
mod category;
mod clock;
mod coordinator;
mod fetcher;
mod frontier;
mod headers;
mod parser;
mod pipeline;

pub use backoff::{politeness_delay, BackoffPolicy, FailureKind};
pub use category::{CategoryWalker, WalkReport, WIKIPEDIA_SOURCE};
pub use clock::{Clock, ManualClock, Shutdown, SystemClock};
pub use coordinator::{CrawlEngine, CrawlPhase, FinishReason, SiteCrawl, SiteReport};
pub use fetcher::{build_http_client, FetchError, FetchFailure, FetchRequest, FetchedPage, Fetcher};
pub use frontier::{EnqueueCounts, Frontier, FrontierEntry};
pub use headers::{HeaderProfile, HeaderRotation, RandomRotation, RoundRobinRotation, HEADER_PROFILES};
pub use parser::extract_links;
pub use pipeline::{DocumentOutcome, DocumentPipeline};
