//! Upstream data providers.
//!
//! Defines the source traits the acquisition engine depends on and the
//! HTTP clients implementing them (API-Football for live fixtures,
//! NewsAPI for articles).

pub mod news;
pub mod sports;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Fixture, NewsArticle};

pub use news::{NewsApiClient, NewsQuery, SortBy};
pub use sports::ApiFootballClient;

/// Source of in-play fixtures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FixturesSource: Send + Sync {
    /// Every fixture currently in play, in provider order.
    async fn fetch_live(&self) -> Result<Vec<Fixture>>;
}

/// Source of news articles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Run an article search. Unusable articles are already dropped.
    async fn everything(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>>;
}
