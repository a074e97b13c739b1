//! News provider.
//!
//! API: `https://newsapi.org/v2/everything`
//! Auth: API key via `apiKey` query param. Free tier: 100 req/day, and
//! browser/production origins get HTTP 426, so callers must be ready to
//! fall back.
//!
//! Also owns the query vocabulary (featured, search, default) and the
//! static fallback articles shown when the provider is unavailable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::NewsSource;
use crate::types::{BetVisionError, NewsArticle, DEFAULT_ARTICLE_IMAGE};

const PROVIDER: &str = "newsapi";

/// Placeholder title NewsAPI uses for withdrawn articles.
const REMOVED_TITLE: &str = "[Removed]";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Query for the hero article: the big leagues, newest first.
const FEATURED_QUERY: &str = "futebol brasileiro OR Premier League OR La Liga OR Serie A \
     OR Bundesliga OR Ligue 1 OR UEFA Champions League";

/// Query used when the search box holds 2 characters or fewer.
const DEFAULT_SEARCH_QUERY: &str = r#"futebol brasileiro OR "Champions League""#;

/// Keeps free-text searches on football.
const FOOTBALL_KEYWORDS: &str = "futebol OR paulistao OR football OR soccer OR la liga \
     OR premier league OR serie a OR bundesliga OR ligue 1 OR \"Champions League\"";

/// Shortest search term that replaces the default query.
const MIN_SEARCH_TERM_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    PublishedAt,
    Relevancy,
    Popularity,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::PublishedAt => "publishedAt",
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an `/everything` request. The language is a property of
/// the client, not the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub q: String,
    pub sort_by: SortBy,
    pub page_size: u32,
}

impl NewsQuery {
    /// The single most recent headline for the hero panel.
    pub fn featured() -> Self {
        Self {
            q: FEATURED_QUERY.to_string(),
            sort_by: SortBy::PublishedAt,
            page_size: 1,
        }
    }

    /// Relevance-ordered search for a user-entered term.
    pub fn search(term: &str, page_size: u32) -> Self {
        Self {
            q: build_search_query(term),
            sort_by: SortBy::Relevancy,
            page_size,
        }
    }
}

/// Strip query-syntax characters from a user term and collapse whitespace.
pub fn escape_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, '"' | '(' | ')'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the `q` parameter for a search-box term.
///
/// Terms longer than 2 characters are AND-ed with the football keyword
/// disjunction; anything shorter uses the default query.
pub fn build_search_query(term: &str) -> String {
    let escaped = escape_term(term);
    if escaped.chars().count() >= MIN_SEARCH_TERM_CHARS {
        format!("({escaped}) AND ({FOOTBALL_KEYWORDS})")
    } else {
        DEFAULT_SEARCH_QUERY.to_string()
    }
}

// ---------------------------------------------------------------------------
// Fallback content
// ---------------------------------------------------------------------------

/// Hero article used when the provider fails or returns nothing usable.
pub fn fallback_featured(now: DateTime<Utc>) -> NewsArticle {
    NewsArticle {
        title: "Transfer market: big European clubs are watching Brasileirão talent".to_string(),
        description: Some(
            "Transfer windows stay busy as international scouts focus on South American football."
                .to_string(),
        ),
        url: "#".to_string(),
        image_url: DEFAULT_ARTICLE_IMAGE.to_string(),
        source: "BetVision News".to_string(),
        published_at: now,
    }
}

/// Two static analysis cards for an empty article list.
pub fn fallback_articles(now: DateTime<Utc>) -> Vec<NewsArticle> {
    const IMAGE: &str = "https://images.unsplash.com/photo-1522778119026-d647f0596c20";
    [
        "Analysis: Flamengo stay favourites at the Maracanã",
        "Stats: Palmeiras and the power of set pieces",
    ]
    .into_iter()
    .map(|title| NewsArticle {
        title: title.to_string(),
        description: None,
        url: "#".to_string(),
        image_url: IMAGE.to_string(),
        source: "BetVision".to_string(),
        published_at: now,
    })
    .collect()
}

// ---------------------------------------------------------------------------
// NewsAPI response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "totalResults")]
    total_results: u32,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(default)]
    source: Option<ApiSource>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    #[serde(default)]
    name: Option<String>,
}

impl ApiArticle {
    /// Convert to a display article; `None` when there is no usable title.
    fn into_article(self, now: DateTime<Utc>) -> Option<NewsArticle> {
        let title = self.title.map(|t| t.trim().to_string()).unwrap_or_default();
        if title.is_empty() || title == REMOVED_TITLE {
            return None;
        }

        let published_at = self
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);

        Some(NewsArticle {
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            url: self.url.unwrap_or_else(|| "#".to_string()),
            image_url: self
                .url_to_image
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ARTICLE_IMAGE.to_string()),
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "unknown".to_string()),
            published_at,
        })
    }
}

/// Parse an `/everything` response body, dropping unusable articles.
pub fn parse_articles(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsArticle>> {
    let data: NewsApiResponse =
        serde_json::from_str(body).context("Failed to parse NewsAPI response")?;

    if data.status == "error" {
        let message = data.message.unwrap_or_else(|| "unspecified error".to_string());
        return Err(BetVisionError::provider(PROVIDER, message).into());
    }

    let received = data.articles.len();
    let articles: Vec<NewsArticle> = data
        .articles
        .into_iter()
        .filter_map(|a| a.into_article(now))
        .collect();

    debug!(
        total_results = data.total_results,
        received,
        usable = articles.len(),
        "Parsed NewsAPI articles"
    );
    Ok(articles)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct NewsApiClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
    language: String,
}

impl NewsApiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        language: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("BetVision/0.1.0")
            .build()
            .context("Failed to build news HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            language: language.to_string(),
        })
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn everything(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| BetVisionError::provider(PROVIDER, "API key not configured"))?;

        let url = format!(
            "{}/everything?q={}&language={}&sortBy={}&pageSize={}&apiKey={}",
            self.base_url,
            urlencoding::encode(&query.q),
            urlencoding::encode(&self.language),
            query.sort_by,
            query.page_size,
            urlencoding::encode(key.expose_secret()),
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("NewsAPI request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BetVisionError::provider(PROVIDER, format!("HTTP {status}")).into());
        }

        let body = resp.text().await.context("Failed to read NewsAPI body")?;
        parse_articles(&body, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
