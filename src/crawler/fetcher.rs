//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client
//! - Rotating browser header profiles into the session headers
//! - Retry logic with rate-limit cooldowns and exponential backoff
//! - Error classification

use crate::config::FetcherConfig;
use crate::crawler::backoff::{BackoffPolicy, FailureKind};
use crate::crawler::clock::{Clock, Shutdown};
use crate::crawler::headers::{HeaderRotation, RandomRotation, HEADER_PROFILES};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// A request for the fetcher
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    /// Query parameters (GET and POST)
    pub query: Vec<(String, String)>,
    /// JSON body (POST only)
    pub json: Option<serde_json::Value>,
    /// Overrides the client's default timeout
    pub timeout: Option<Duration>,
    /// Overrides session headers for this request only
    pub headers: HeaderMap,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            query: Vec::new(),
            json: None,
            timeout: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            json: Some(body),
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_query<K: Into<String>, V: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A successful (status 200) response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    /// Content-Type header value, empty when absent
    pub content_type: String,
    pub body: String,
}

/// Why one attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("rate limited (HTTP {0})")]
    RateLimited(u16),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("connection error: {0}")]
    Connect(String),

    #[error("request error: {0}")]
    Transport(String),
}

impl FetchFailure {
    /// Network failure kind, `None` for HTTP status failures
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::RateLimited(_) | Self::Status(_) => None,
            Self::Timeout(_) => Some(FailureKind::Timeout),
            Self::Tls(_) => Some(FailureKind::Tls),
            Self::Connect(_) => Some(FailureKind::Connect),
            Self::Transport(_) => Some(FailureKind::Other),
        }
    }
}

/// Errors returned by [`Fetcher::fetch`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("giving up on {url} after {attempts} attempts, last failure: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: FetchFailure,
    },

    #[error("unsupported HTTP method {0}")]
    UnsupportedMethod(String),

    #[error("fetch of {0} interrupted by shutdown")]
    Interrupted(String),
}

/// Builds the shared HTTP client
///
/// Headers come from the rotated session profile, not from the client.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
}

/// HTTP fetcher with retry, backoff and header rotation
///
/// One fetcher serves the whole process; its session headers are shared by
/// the site crawler and the Wikipedia client.
pub struct Fetcher {
    client: Client,
    session_headers: Mutex<HeaderMap>,
    rotation: Box<dyn HeaderRotation>,
    policy: BackoffPolicy,
    clock: Arc<dyn Clock>,
    shutdown: Shutdown,
}

impl Fetcher {
    /// Creates a fetcher with random header rotation
    pub fn new(
        config: &FetcherConfig,
        clock: Arc<dyn Clock>,
        shutdown: Shutdown,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;

        let mut session_headers = HeaderMap::new();
        HEADER_PROFILES[0].merge_into(&mut session_headers);

        Ok(Self {
            client,
            session_headers: Mutex::new(session_headers),
            rotation: Box::new(RandomRotation),
            policy: BackoffPolicy::from_config(config),
            clock,
            shutdown,
        })
    }

    /// Replaces the header rotation strategy
    pub fn with_rotation(mut self, rotation: Box<dyn HeaderRotation>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Snapshot of the current session headers
    pub fn session_headers(&self) -> HeaderMap {
        self.session_headers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Fetches `url` with GET and the default timeout
    pub async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetch(&FetchRequest::get(url)).await
    }

    /// Fetches a request, retrying until it succeeds or attempts run out
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Return the page |
    /// | HTTP 403 / 429 | Cooldown, retry without backoff |
    /// | Other HTTP status | Backoff, retry |
    /// | Timeout | 10s, then backoff, retry |
    /// | TLS / connection / other error | 5s, then backoff, retry |
    /// | Method other than GET/POST | Fail immediately |
    ///
    /// Every attempt counts toward the ceiling. No wait follows the last
    /// attempt.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        if request.method != Method::GET && request.method != Method::POST {
            return Err(FetchError::UnsupportedMethod(request.method.to_string()));
        }

        let attempts = self.policy.max_attempts.max(1);
        let mut last_failure = None;

        for attempt in 0..attempts {
            if self.shutdown.is_triggered() {
                return Err(FetchError::Interrupted(request.url.clone()));
            }

            let headers = self.rotate_headers(&request.headers);
            let failure = match self.send(request, headers).await {
                Ok(page) => return Ok(page),
                Err(failure) => failure,
            };

            let is_last = attempt + 1 == attempts;
            match &failure {
                FetchFailure::RateLimited(status) => {
                    tracing::warn!("Access denied for {} (HTTP {})", request.url, status);
                    if !is_last {
                        self.clock.sleep(self.policy.rate_limit_cooldown).await;
                    }
                }
                FetchFailure::Status(status) => {
                    tracing::warn!("Unexpected status for {}: {}", request.url, status);
                    if !is_last {
                        self.backoff(attempt).await;
                    }
                }
                network => {
                    tracing::warn!(
                        "{} for {} (attempt {}/{})",
                        network,
                        request.url,
                        attempt + 1,
                        attempts
                    );
                    if !is_last {
                        if let Some(kind) = network.kind() {
                            self.clock.sleep(self.policy.failure_delay(kind)).await;
                        }
                        self.backoff(attempt).await;
                    }
                }
            }

            last_failure = Some(failure);
        }

        let last = last_failure
            .unwrap_or_else(|| FetchFailure::Transport("no attempt was made".to_string()));
        tracing::error!(
            "Failed to fetch {} after {} attempts: {}",
            request.url,
            attempts,
            last
        );

        Err(FetchError::Exhausted {
            url: request.url.clone(),
            attempts,
            last,
        })
    }

    /// Merges the next profile into the session and returns the headers for
    /// this attempt
    fn rotate_headers(&self, overrides: &HeaderMap) -> HeaderMap {
        let index = self.rotation.next_index(HEADER_PROFILES.len()) % HEADER_PROFILES.len();
        let profile = HEADER_PROFILES[index];

        let mut headers = {
            let mut session = self
                .session_headers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            profile.merge_into(&mut session);
            session.clone()
        };
        tracing::trace!("Using header profile {}", profile.name);

        for (name, value) in overrides {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    async fn backoff(&self, attempt: u32) {
        let fraction: f64 = rand::random();
        let delay = self.policy.backoff_delay(attempt, fraction);
        tracing::debug!("Backing off for {:.1}s", delay.as_secs_f64());
        self.clock.sleep(delay).await;
    }

    /// Performs one attempt
    async fn send(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<FetchedPage, FetchFailure> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchFailure::RateLimited(status.as_u16()));
        }
        if status != StatusCode::OK {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(classify_error)?;

        Ok(FetchedPage {
            url: request.url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Sorts a transport error into the failure classes the retry loop knows
fn classify_error(error: reqwest::Error) -> FetchFailure {
    let message = error.to_string();

    if error.is_timeout() {
        FetchFailure::Timeout(message)
    } else if is_tls_error(&error) {
        FetchFailure::Tls(message)
    } else if error.is_connect() {
        FetchFailure::Connect(message)
    } else {
        FetchFailure::Transport(message)
    }
}

/// reqwest has no TLS predicate; look through the source chain instead
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return true;
        }
        source = cause.source();
    }
    false
}
