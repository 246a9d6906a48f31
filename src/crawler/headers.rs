//! Browser header profiles and rotation strategies

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A named set of request headers imitating one browser
#[derive(Debug, Clone, Copy)]
pub struct HeaderProfile {
    pub name: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
}

impl HeaderProfile {
    /// Writes this profile over `session`, keeping headers it does not set
    pub fn merge_into(&self, session: &mut HeaderMap) {
        for &(name, value) in self.headers {
            session.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
    }

    pub fn user_agent(&self) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(name, _)| *name == "user-agent")
            .map(|(_, value)| *value)
    }
}

/// Encoding and connection headers are left to the HTTP client.
pub const HEADER_PROFILES: [HeaderProfile; 3] = [
    HeaderProfile {
        name: "chrome-windows",
        headers: &[
            (
                "user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            (
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
            ("accept-language", "en-US,en;q=0.5"),
            ("upgrade-insecure-requests", "1"),
            ("cache-control", "max-age=0"),
        ],
    },
    HeaderProfile {
        name: "safari-macos",
        headers: &[
            (
                "user-agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Safari/605.1.15",
            ),
            (
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
            ("accept-language", "en-US,en;q=0.9"),
        ],
    },
    HeaderProfile {
        name: "chrome-linux",
        headers: &[
            (
                "user-agent",
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            (
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
            ("accept-language", "en-US,en;q=0.5"),
        ],
    },
];

/// Chooses which profile the next attempt uses
pub trait HeaderRotation: Send + Sync {
    /// Index into a pool of `pool_len` profiles; `pool_len` is never zero
    fn next_index(&self, pool_len: usize) -> usize;
}

/// Uniformly random choice, used in production
#[derive(Debug, Default)]
pub struct RandomRotation;

impl HeaderRotation for RandomRotation {
    fn next_index(&self, pool_len: usize) -> usize {
        rand::thread_rng().gen_range(0..pool_len)
    }
}

/// Deterministic cycling through the pool
#[derive(Debug, Default)]
pub struct RoundRobinRotation {
    next: AtomicUsize,
}

impl RoundRobinRotation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeaderRotation for RoundRobinRotation {
    fn next_index(&self, pool_len: usize) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % pool_len
    }
}
