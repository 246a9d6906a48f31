//! Configuration module for the corpus crawler
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default that reproduces the built-in fashion crawl.
//!
//! # Example
//!
//! ```no_run
//! use fashion_corpus::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("corpus.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_sites, Config, CrawlerConfig, FetcherConfig, FilterConfig, OutputConfig, SiteConfig,
    WikipediaConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_or_default, load_config_with_hash, parse_config,
};
