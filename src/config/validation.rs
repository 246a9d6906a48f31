use crate::config::types::{
    Config, CrawlerConfig, FetcherConfig, FilterConfig, OutputConfig, SiteConfig, WikipediaConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_filter_config(&config.filter)?;
    validate_wikipedia_config(&config.wikipedia)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates site crawl configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_articles_per_site < 1 {
        return Err(ConfigError::Validation(format!(
            "max_articles_per_site must be >= 1, got {}",
            config.max_articles_per_site
        )));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "progress_interval must be >= 1, got {}",
            config.progress_interval
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.request_timeout_secs < 1 || config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got request={}s page={}s",
            config.request_timeout_secs, config.page_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the article acceptance gates
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    let distinct: HashSet<String> = config.keywords.iter().map(|k| k.to_lowercase()).collect();
    if config.min_keyword_hits > distinct.len() {
        return Err(ConfigError::Validation(format!(
            "min_keyword_hits ({}) exceeds the number of distinct keywords ({})",
            config.min_keyword_hits,
            distinct.len()
        )));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates the Wikipedia walk configuration
fn validate_wikipedia_config(config: &WikipediaConfig) -> Result<(), ConfigError> {
    validate_http_url("wikipedia api_url", &config.api_url)?;
    validate_http_url("wikipedia article_base_url", &config.article_base_url)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "wikipedia user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("checkpoint_path", &config.checkpoint_path),
        ("statistics_path", &config.statistics_path),
        ("report_path", &config.report_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates site entries
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name cannot be empty".to_string(),
            ));
        }

        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate site name '{}'",
                site.name
            )));
        }

        validate_http_url(&format!("base URL of '{}'", site.name), &site.base_url)?;

        if site.start_urls.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have at least one start URL",
                site.name
            )));
        }

        for seed in &site.start_urls {
            validate_http_url(&format!("start URL of '{}'", site.name), seed)?;
        }
    }

    Ok(())
}

/// Checks that a URL parses, has a host and uses http(s)
fn validate_http_url(what: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            what, value
        )));
    }

    Ok(())
}
