//! URL handling module
//!
//! This module provides URL normalization, site-boundary validation and the
//! article heuristic that orders the crawl frontier.

pub mod domain;
mod normalize;
mod validate;

// Re-export main functions
pub use domain::{base_domain, url_authority};
pub use normalize::normalize_url;
pub use validate::{is_article_url, is_valid_url};
