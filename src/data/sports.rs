//! Live fixtures provider.
//!
//! API: `https://v3.football.api-sports.io/fixtures?live=all`
//! Auth: `x-rapidapi-key` header plus `x-rapidapi-host`. Free tier is 100
//! req/day, which is why the engine caches this feed.
//!
//! The provider reports auth and quota problems in an `errors` field with
//! HTTP 200, so a non-empty `errors` value is treated as a failure too.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::FixturesSource;
use crate::types::{BetVisionError, Fixture, League, Team};

const PROVIDER: &str = "api-football";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiFixturesResponse {
    #[serde(default)]
    errors: serde_json::Value,
    #[serde(default)]
    results: u32,
    #[serde(default)]
    response: Vec<ApiFixture>,
}

#[derive(Debug, Deserialize)]
struct ApiFixture {
    fixture: ApiFixtureInfo,
    teams: ApiTeams,
    #[serde(default)]
    goals: ApiGoals,
    league: ApiLeague,
}

#[derive(Debug, Deserialize)]
struct ApiFixtureInfo {
    id: u64,
    #[serde(default)]
    status: ApiStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    elapsed: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiTeams {
    home: ApiTeam,
    away: ApiTeam,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    name: String,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiGoals {
    #[serde(default)]
    home: Option<u32>,
    #[serde(default)]
    away: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiLeague {
    id: u32,
    #[serde(default)]
    name: String,
}

impl From<ApiTeam> for Team {
    fn from(team: ApiTeam) -> Self {
        Team {
            name: team.name,
            crest: team.logo.unwrap_or_default(),
        }
    }
}

impl From<ApiFixture> for Fixture {
    fn from(api: ApiFixture) -> Self {
        Fixture {
            id: api.fixture.id,
            elapsed: api.fixture.status.elapsed.unwrap_or(0),
            home: api.teams.home.into(),
            away: api.teams.away.into(),
            home_goals: api.goals.home.unwrap_or(0),
            away_goals: api.goals.away.unwrap_or(0),
            league: League {
                id: api.league.id,
                name: api.league.name,
            },
        }
    }
}

/// `errors` is `[]` when fine and an object keyed by problem otherwise.
fn has_errors(errors: &serde_json::Value) -> bool {
    match errors {
        serde_json::Value::Null => false,
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Parse a `/fixtures` response body into fixtures.
pub fn parse_fixtures(body: &str) -> Result<Vec<Fixture>> {
    let data: ApiFixturesResponse =
        serde_json::from_str(body).context("Failed to parse API-Football response")?;

    if has_errors(&data.errors) {
        return Err(BetVisionError::provider(PROVIDER, data.errors.to_string()).into());
    }

    debug!(results = data.results, parsed = data.response.len(), "Parsed live fixtures");
    Ok(data.response.into_iter().map(Fixture::from).collect())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ApiFootballClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl ApiFootballClient {
    pub fn new(base_url: &str, api_key: Option<SecretString>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("BetVision/0.1.0")
            .build()
            .context("Failed to build API-Football HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Host part of the base URL, sent as `x-rapidapi-host`.
    fn host(&self) -> &str {
        let without_scheme = self
            .base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(self.base_url.as_str());
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }
}

#[async_trait]
impl FixturesSource for ApiFootballClient {
    async fn fetch_live(&self) -> Result<Vec<Fixture>> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| BetVisionError::provider(PROVIDER, "API key not configured"))?;

        let url = format!("{}/fixtures?live=all", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("x-rapidapi-key", key.expose_secret())
            .header("x-rapidapi-host", self.host())
            .send()
            .await
            .context("API-Football request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BetVisionError::provider(PROVIDER, format!("HTTP {status}")).into());
        }

        let body = resp.text().await.context("Failed to read API-Football body")?;
        parse_fixtures(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
