use crate::crawler::{FetchRequest, Fetcher};
use crate::wiki::{CategoryMember, EncyclopediaClient, EncyclopediaPage, MemberKind};
use crate::{ConfigError, CorpusError};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Members requested per listing page (the API maximum for normal users)
const MEMBERS_PER_REQUEST: &str = "500";

/// MediaWiki Action API client
///
/// Requests go through the shared [`Fetcher`], so they get the same retry
/// and backoff treatment as site pages, but carry their own User-Agent as
/// the API etiquette asks.
pub struct MediaWikiClient {
    fetcher: Arc<Fetcher>,
    api_url: String,
    user_agent: HeaderValue,
}

impl MediaWikiClient {
    pub fn new(fetcher: Arc<Fetcher>, api_url: &str, user_agent: &str) -> Result<Self, CorpusError> {
        let user_agent = HeaderValue::from_str(user_agent).map_err(|_| {
            ConfigError::Validation(format!("invalid Wikipedia user agent: {:?}", user_agent))
        })?;

        Ok(Self {
            fetcher,
            api_url: api_url.to_string(),
            user_agent,
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        params: Vec<(&str, String)>,
    ) -> Result<T, CorpusError> {
        let request = FetchRequest::get(&self.api_url)
            .with_query(
                [
                    ("action", "query".to_string()),
                    ("format", "json".to_string()),
                    ("formatversion", "2".to_string()),
                ]
                .into_iter()
                .chain(params),
            )
            .with_header(USER_AGENT, self.user_agent.clone());

        let page = self.fetcher.fetch(&request).await?;
        let response: ApiResponse<T> = serde_json::from_str(&page.body)?;

        if let Some(error) = response.error {
            return Err(CorpusError::Encyclopedia(format!(
                "{}: {}",
                error.code, error.info
            )));
        }

        Ok(response.body)
    }
}

#[async_trait]
impl EncyclopediaClient for MediaWikiClient {
    async fn page(&self, title: &str) -> Result<Option<EncyclopediaPage>, CorpusError> {
        let result: PagesResult = self
            .query(vec![
                ("prop", "extracts".to_string()),
                ("explaintext", "1".to_string()),
                ("redirects", "1".to_string()),
                ("titles", title.to_string()),
            ])
            .await?;

        let page = result
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing && !p.invalid);

        Ok(page.and_then(|p| {
            Some(EncyclopediaPage {
                title: p.title,
                page_id: p.pageid?,
                text: p.extract.unwrap_or_default(),
            })
        }))
    }

    async fn category_members(&self, category: &str) -> Result<Vec<CategoryMember>, CorpusError> {
        let mut members = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut params = vec![
                ("list", "categorymembers".to_string()),
                ("cmtitle", category.to_string()),
                ("cmlimit", MEMBERS_PER_REQUEST.to_string()),
            ];
            if let Some(token) = &continuation {
                params.push(("cmcontinue", token.clone()));
            }

            let result: MembersResult = self.query(params).await?;

            if let Some(query) = result.query {
                members.extend(query.categorymembers.into_iter().map(|m| CategoryMember {
                    kind: MemberKind::from_namespace(m.ns),
                    title: m.title,
                    page_id: m.pageid,
                }));
            }

            continuation = result.continuation.and_then(|c| c.cmcontinue);
            if continuation.is_none() {
                break;
            }
            tracing::trace!("Continuing listing of {}", category);
        }

        tracing::debug!("{} has {} members", category, members.len());
        Ok(members)
    }
}

/// Envelope shared by all API responses; the rest is flattened into `body`
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct PagesResult {
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    pageid: Option<i64>,
    title: String,
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
}

#[derive(Debug, Deserialize)]
struct MembersResult {
    query: Option<MembersQuery>,
    #[serde(rename = "continue")]
    continuation: Option<MembersContinue>,
}

#[derive(Debug, Deserialize)]
struct MembersQuery {
    #[serde(default)]
    categorymembers: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    pageid: i64,
    ns: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct MembersContinue {
    cmcontinue: Option<String>,
}
