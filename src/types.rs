//! Shared types for the BetVision scanner.
//!
//! These types form the data model used across all modules. Provider
//! clients convert their wire formats into these before anything else
//! sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A live match with its current score and elapsed time.
///
/// Fixtures are replaced wholesale on every refresh; nothing merges a new
/// fixture into an old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    /// Elapsed match time in minutes.
    pub elapsed: u32,
    pub home: Team,
    pub away: Team,
    pub home_goals: u32,
    pub away_goals: u32,
    pub league: League,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    /// Crest image URL; empty when the provider has none.
    pub crest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: u32,
    pub name: String,
}

impl Fixture {
    pub fn total_goals(&self) -> u32 {
        self.home_goals.saturating_add(self.away_goals)
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} - {} {} ({}')",
            self.league.name,
            self.home.name,
            self.home_goals,
            self.away_goals,
            self.away.name,
            self.elapsed,
        )
    }
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

/// Image shown when an article has none of its own.
pub const DEFAULT_ARTICLE_IMAGE: &str =
    "https://images.unsplash.com/photo-1574629810360-7efbbe195018";

/// A news article, read-only display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

impl fmt::Display for NewsArticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.title)
    }
}

// ---------------------------------------------------------------------------
// Community
// ---------------------------------------------------------------------------

/// A tip posted on the community board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityTopic {
    pub id: u64,
    pub user: String,
    pub avatar: String,
    /// Subject line, usually the fixture ("Real Madrid x City").
    pub title: String,
    /// Free-text tip label ("Over 2.5 goals").
    pub tip: String,
    pub comments: u32,
}

// ---------------------------------------------------------------------------
// Fetch state
// ---------------------------------------------------------------------------

/// Lifecycle of one published resource within a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Published,
    /// The provider failed and a predefined fallback value was published.
    PublishedFallback,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => write!(f, "idle"),
            FetchState::Loading => write!(f, "loading"),
            FetchState::Published => write!(f, "published"),
            FetchState::PublishedFallback => write!(f, "published-fallback"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for BetVision.
#[derive(Debug, thiserror::Error)]
pub enum BetVisionError {
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Topic not found: {0}")]
    TopicNotFound(u64),
}

impl BetVisionError {
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        BetVisionError::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn sample_fixture(id: u64, league_id: u32) -> Fixture {
    Fixture {
        id,
        elapsed: 30,
        home: Team { name: format!("Home {id}"), crest: String::new() },
        away: Team { name: format!("Away {id}"), crest: String::new() },
        home_goals: 0,
        away_goals: 0,
        league: League { id: league_id, name: format!("League {league_id}") },
    }
}
