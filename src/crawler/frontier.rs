//! Per-site crawl frontier
//!
//! A double-ended queue of `(url, depth)` entries plus the set of URLs
//! already dequeued. Article-like links jump the queue so a site's articles
//! are reached before its hub pages are exhausted.

use crate::url::{is_article_url, normalize_url};
use std::collections::{HashSet, VecDeque};

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Counts of links accepted by [`Frontier::enqueue_discovered`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueCounts {
    pub articles: usize,
    pub others: usize,
}

/// Queue and visited set of one site crawl
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes each seed and appends it at depth 0
    pub fn seed<'a>(&mut self, seeds: impl IntoIterator<Item = &'a String>, base_domain: &str) {
        for seed in seeds {
            // Article patterns see the normalized form, so `/fashion/` seeds stay hubs
            self.queue
                .push_back(FrontierEntry::new(normalize_url(seed, base_domain), 0));
        }
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Records `url` as dequeued; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Enqueues links discovered on a page at `depth`
    ///
    /// Already visited links are dropped. Article-like links go to the head
    /// of the queue in discovery order; the rest go to the tail.
    pub fn enqueue_discovered(
        &mut self,
        links: Vec<String>,
        depth: u32,
        article_patterns: &[String],
    ) -> EnqueueCounts {
        let mut articles = Vec::new();
        let mut counts = EnqueueCounts::default();

        for link in links {
            if self.visited.contains(&link) {
                continue;
            }
            if is_article_url(&link, article_patterns) {
                articles.push(FrontierEntry::new(link, depth));
            } else {
                self.queue.push_back(FrontierEntry::new(link, depth));
                counts.others += 1;
            }
        }

        counts.articles = articles.len();
        for entry in articles.into_iter().rev() {
            self.queue.push_front(entry);
        }

        counts
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Entries in dequeue order
    pub fn iter(&self) -> impl Iterator<Item = &FrontierEntry> {
        self.queue.iter()
    }
}
