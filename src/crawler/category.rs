//! Depth-bounded walk of the Wikipedia category tree
//!
//! The walk uses an explicit stack of frames instead of recursion. Each
//! frame holds a category's member list and a cursor, so members are
//! handled in the same depth-first pre-order a recursive walk would use:
//! a subcategory is finished before the next member of its parent.

use crate::config::WikipediaConfig;
use crate::crawler::clock::{Clock, Shutdown};
use crate::crawler::pipeline::DocumentPipeline;
use crate::storage::DocumentCandidate;
use crate::wiki::{article_url, CategoryMember, EncyclopediaClient, MemberKind};
use std::collections::HashSet;

/// Source name stored with every Wikipedia document
pub const WIKIPEDIA_SOURCE: &str = "Wikipedia";

/// Summary of a finished walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Documents stored
    pub documents: u64,
    /// Distinct `(category, depth)` pairs entered
    pub categories_visited: usize,
    /// Article members looked at
    pub pages_seen: usize,
    pub interrupted: bool,
}

#[derive(Debug)]
struct Frame {
    category: String,
    depth: u32,
    members: Vec<CategoryMember>,
    next: usize,
}

/// Walks categories and feeds their articles through the pipeline
pub struct CategoryWalker {
    config: WikipediaConfig,
    visited_categories: HashSet<(String, u32)>,
    visited_pages: HashSet<i64>,
    documents: u64,
}

impl CategoryWalker {
    pub fn new(config: WikipediaConfig) -> Self {
        Self {
            config,
            visited_categories: HashSet::new(),
            visited_pages: HashSet::new(),
            documents: 0,
        }
    }

    /// Walks every root category until the tree or the document cap is
    /// exhausted, or shutdown is requested
    pub async fn walk(
        &mut self,
        client: &dyn EncyclopediaClient,
        pipeline: &mut DocumentPipeline,
        clock: &dyn Clock,
        shutdown: &Shutdown,
    ) -> WalkReport {
        let roots = self.config.root_categories.clone();
        let mut interrupted = false;

        'roots: for root in roots {
            if self.capped() {
                break;
            }

            let mut stack: Vec<Frame> = Vec::new();
            if let Some(frame) = self.enter(client, &root, 0).await {
                stack.push(frame);
            }

            while let Some(frame) = stack.last_mut() {
                if shutdown.is_triggered() {
                    interrupted = true;
                    break 'roots;
                }
                if self.capped() {
                    break 'roots;
                }

                let member = match frame.members.get(frame.next).cloned() {
                    Some(member) => member,
                    None => {
                        if let Some(done) = stack.pop() {
                            tracing::trace!("Finished {} (depth {})", done.category, done.depth);
                        }
                        continue;
                    }
                };
                frame.next += 1;
                let depth = frame.depth;

                match member.kind {
                    MemberKind::Article => {
                        self.process_article(client, pipeline, clock, &member).await;
                    }
                    MemberKind::Category
                        if depth < self.config.max_depth
                            && !member.title.to_lowercase().contains("disambiguation") =>
                    {
                        if let Some(child) = self.enter(client, &member.title, depth + 1).await {
                            stack.push(child);
                        }
                    }
                    _ => {}
                }

                clock.sleep(self.config.member_delay()).await;
            }
        }

        let report = WalkReport {
            documents: self.documents,
            categories_visited: self.visited_categories.len(),
            pages_seen: self.visited_pages.len(),
            interrupted,
        };
        tracing::info!(
            "Wikipedia walk finished: {} articles from {} categories",
            report.documents,
            report.categories_visited
        );
        report
    }

    fn capped(&self) -> bool {
        self.documents >= self.config.max_documents
    }

    /// Marks a category visited and lists its members
    ///
    /// Returns None when the category is out of bounds, already visited at
    /// this depth, or cannot be listed.
    async fn enter(
        &mut self,
        client: &dyn EncyclopediaClient,
        category: &str,
        depth: u32,
    ) -> Option<Frame> {
        if depth > self.config.max_depth || self.capped() {
            return None;
        }
        if !self.visited_categories.insert((category.to_string(), depth)) {
            return None;
        }

        tracing::info!("Processing category: {} (depth {})", category, depth);

        match client.category_members(category).await {
            Ok(members) if members.is_empty() => {
                tracing::warn!("Category not found or empty: {}", category);
                None
            }
            Ok(members) => Some(Frame {
                category: category.to_string(),
                depth,
                members,
                next: 0,
            }),
            Err(e) => {
                tracing::error!("Could not list category {}: {}", category, e);
                None
            }
        }
    }

    async fn process_article(
        &mut self,
        client: &dyn EncyclopediaClient,
        pipeline: &mut DocumentPipeline,
        clock: &dyn Clock,
        member: &CategoryMember,
    ) {
        if !self.visited_pages.insert(member.page_id) {
            return;
        }

        let url = article_url(&self.config.article_base_url, &member.title);
        if pipeline.is_recent(&url, clock.now()) {
            tracing::debug!("Skipping recently crawled {}", url);
            return;
        }

        let page = match client.page(&member.title).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                tracing::debug!("Page vanished: {}", member.title);
                return;
            }
            Err(e) => {
                tracing::warn!("Could not load page {}: {}", member.title, e);
                return;
            }
        };

        let outcome = pipeline.process_text(
            DocumentCandidate {
                url,
                title: Some(page.title),
                content: page.text,
                source: WIKIPEDIA_SOURCE.to_string(),
                page_id: Some(page.page_id),
            },
            clock.now(),
        );

        if outcome.is_stored() {
            self.documents += 1;
            if self.documents % 10 == 0 {
                tracing::info!("Found {} Wikipedia articles", self.documents);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::crawler::clock::ManualClock;
    use crate::storage::SqliteStorage;
    use crate::wiki::EncyclopediaPage;
    use crate::CorpusError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Category tree held in memory; records every call
    #[derive(Default)]
    struct FakeWiki {
        categories: HashMap<String, Vec<CategoryMember>>,
        pages: HashMap<String, EncyclopediaPage>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeWiki {
        fn category(mut self, name: &str, members: Vec<CategoryMember>) -> Self {
            self.categories.insert(name.to_string(), members);
            self
        }

        fn page(mut self, title: &str, id: i64, text: String) -> Self {
            self.pages.insert(
                title.to_string(),
                EncyclopediaPage {
                    title: title.to_string(),
                    page_id: id,
                    text,
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EncyclopediaClient for FakeWiki {
        async fn page(&self, title: &str) -> Result<Option<EncyclopediaPage>, CorpusError> {
            self.calls.lock().unwrap().push(format!("page:{}", title));
            Ok(self.pages.get(title).cloned())
        }

        async fn category_members(
            &self,
            category: &str,
        ) -> Result<Vec<CategoryMember>, CorpusError> {
            self.calls.lock().unwrap().push(format!("list:{}", category));
            match self.categories.get(category) {
                Some(members) => Ok(members.clone()),
                None => Err(CorpusError::Encyclopedia(format!("no such category {}", category))),
            }
        }
    }

    fn article(title: &str, id: i64) -> CategoryMember {
        CategoryMember {
            title: title.to_string(),
            page_id: id,
            kind: MemberKind::Article,
        }
    }

    fn subcategory(title: &str) -> CategoryMember {
        CategoryMember {
            title: title.to_string(),
            page_id: 0,
            kind: MemberKind::Category,
        }
    }

    fn fashion_text() -> String {
        let words = ["garment", "textile", "fashion", "silk", "tailoring"];
        (0..250).map(|i| words[i % 5]).collect::<Vec<_>>().join(" ")
    }

    fn config(roots: &[&str], max_depth: u32, max_documents: u64) -> WikipediaConfig {
        WikipediaConfig {
            root_categories: roots.iter().map(|r| r.to_string()).collect(),
            max_depth,
            max_documents,
            ..WikipediaConfig::default()
        }
    }

    fn pipeline() -> DocumentPipeline {
        DocumentPipeline::new(
            Box::new(SqliteStorage::new_in_memory().unwrap()),
            FilterConfig::default(),
            chrono::Duration::days(30),
        )
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_depth_first_pre_order() {
        let wiki = FakeWiki::default()
            .category("Category:Root", vec![
                article("A", 1),
                subcategory("Category:Child"),
                article("C", 3),
            ])
            .category("Category:Child", vec![article("B", 2)])
            .page("A", 1, fashion_text())
            .page("B", 2, fashion_text())
            .page("C", 3, fashion_text());

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:Root"], 3, 100));
        let report = walker.walk(&wiki, &mut pipeline, &clock, &Shutdown::new()).await;

        assert_eq!(
            wiki.calls(),
            vec!["list:Category:Root", "page:A", "list:Category:Child", "page:B", "page:C"]
        );
        assert_eq!(report.documents, 3);
        assert_eq!(report.categories_visited, 2);
        assert!(!report.interrupted);

        let doc = pipeline
            .storage()
            .get_document("https://en.wikipedia.org/wiki/A")
            .unwrap()
            .unwrap();
        assert_eq!(doc.source, WIKIPEDIA_SOURCE);
        assert_eq!(doc.page_id, Some(1));
    }

    #[tokio::test]
    async fn test_depth_limit_and_disambiguation() {
        let wiki = FakeWiki::default()
            .category("Category:Root", vec![
                subcategory("Category:Level1"),
                subcategory("Category:Fashion (disambiguation)"),
            ])
            .category("Category:Level1", vec![subcategory("Category:Level2")])
            .category("Category:Level2", vec![article("Deep", 9)]);

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:Root"], 1, 100));
        walker.walk(&wiki, &mut pipeline, &clock, &Shutdown::new()).await;

        assert_eq!(wiki.calls(), vec!["list:Category:Root", "list:Category:Level1"]);
    }

    #[tokio::test]
    async fn test_cycles_guarded_by_category_and_depth() {
        let wiki = FakeWiki::default()
            .category("Category:A", vec![subcategory("Category:B")])
            .category("Category:B", vec![subcategory("Category:A")]);

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:A", "Category:A"], 3, 100));
        let report = walker.walk(&wiki, &mut pipeline, &clock, &Shutdown::new()).await;

        // A@0, B@1, A@2, B@3; the repeated root is already visited at depth 0
        assert_eq!(report.categories_visited, 4);
        assert_eq!(wiki.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_document_cap_stops_walk() {
        let wiki = FakeWiki::default()
            .category("Category:Root", vec![article("A", 1), article("B", 2), article("C", 3)])
            .category("Category:Other", vec![article("D", 4)])
            .page("A", 1, fashion_text())
            .page("B", 2, fashion_text())
            .page("C", 3, fashion_text())
            .page("D", 4, fashion_text());

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:Root", "Category:Other"], 3, 2));
        let report = walker.walk(&wiki, &mut pipeline, &clock, &Shutdown::new()).await;

        assert_eq!(report.documents, 2);
        assert!(!wiki.calls().contains(&"page:C".to_string()));
        assert!(!wiki.calls().contains(&"list:Category:Other".to_string()));
    }

    #[tokio::test]
    async fn test_each_page_processed_once_and_rejections_not_counted() {
        let wiki = FakeWiki::default()
            .category("Category:Root", vec![
                article("A", 1),
                article("Stub", 5),
                subcategory("Category:Child"),
            ])
            .category("Category:Child", vec![article("A", 1)])
            .page("A", 1, fashion_text())
            .page("Stub", 5, "Too short.".to_string());

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:Root"], 3, 100));
        let report = walker.walk(&wiki, &mut pipeline, &clock, &Shutdown::new()).await;

        assert_eq!(report.documents, 1);
        assert_eq!(report.pages_seen, 2);
        let page_calls = wiki.calls().iter().filter(|c| *c == "page:A").count();
        assert_eq!(page_calls, 1);
    }

    #[tokio::test]
    async fn test_member_delay_and_listing_failure() {
        let wiki = FakeWiki::default()
            .category("Category:Root", vec![article("Missing", 7), subcategory("Category:Broken")]);

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:Root"], 3, 100));
        let report = walker.walk(&wiki, &mut pipeline, &clock, &Shutdown::new()).await;

        assert_eq!(report.documents, 0);
        assert_eq!(
            clock.sleeps(),
            vec![std::time::Duration::from_millis(100); 2]
        );
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_walk() {
        let wiki = FakeWiki::default().category("Category:Root", vec![article("A", 1)]);
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let mut pipeline = pipeline();
        let clock = clock();
        let mut walker = CategoryWalker::new(config(&["Category:Root"], 3, 100));
        let report = walker.walk(&wiki, &mut pipeline, &clock, &shutdown).await;

        assert!(report.interrupted);
        assert_eq!(wiki.calls(), vec!["list:Category:Root"]);
    }
}
