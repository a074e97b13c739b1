//! Fake providers for integration testing.
//!
//! Deterministic `FixturesSource` / `NewsSource` implementations that
//! record every call, can be slowed down with a per-call delay and can
//! be forced to fail. All state is in-memory.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use betvision::data::{FixturesSource, NewsQuery, NewsSource};
use betvision::types::{Fixture, League, NewsArticle, Team, DEFAULT_ARTICLE_IMAGE};

/// Build a live fixture in the given league.
pub fn fixture(id: u64, league_id: u32) -> Fixture {
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

/// Build an article with the given title.
pub fn article(title: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        description: None,
        url: format!("https://news.example.com/{}", title.replace(' ', "-")),
        image_url: DEFAULT_ARTICLE_IMAGE.to_string(),
        source: "Fake".to_string(),
        published_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Fake live-fixtures feed.
#[derive(Clone)]
pub struct FakeFixtures {
    fixtures: Arc<Mutex<Vec<Fixture>>>,
    calls: Arc<Mutex<u32>>,
    delay: Arc<Mutex<Duration>>,
    /// Answers consumed in call order before falling back to `fixtures`.
    script: Arc<Mutex<VecDeque<(Duration, Vec<Fixture>)>>>,
    /// If set, every call returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl FakeFixtures {
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self {
            fixtures: Arc::new(Mutex::new(fixtures)),
            calls: Arc::new(Mutex::new(0)),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            script: Arc::new(Mutex::new(VecDeque::new())),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Queue one answer returned after `delay`.
    pub fn push(&self, delay: Duration, fixtures: Vec<Fixture>) {
        self.script.lock().unwrap().push_back((delay, fixtures));
    }
}

#[async_trait]
impl FixturesSource for FakeFixtures {
    async fn fetch_live(&self) -> Result<Vec<Fixture>> {
        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        if let Some((delay, fixtures)) = next {
            tokio::time::sleep(delay).await;
            return Ok(fixtures);
        }
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(self.fixtures.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

/// One scripted answer: wait `delay`, then return `result`.
pub struct Scripted {
    pub delay: Duration,
    pub result: Result<Vec<NewsArticle>, String>,
}

/// Fake news provider.
///
/// Scripted answers are consumed in call order; once they run out every
/// call returns the default articles immediately.
#[derive(Clone)]
pub struct FakeNews {
    default_articles: Arc<Mutex<Vec<NewsArticle>>>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    queries: Arc<Mutex<Vec<NewsQuery>>>,
}

impl FakeNews {
    pub fn new(default_articles: Vec<NewsArticle>) -> Self {
        Self {
            default_articles: Arc::new(Mutex::new(default_articles)),
            script: Arc::new(Mutex::new(VecDeque::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful answer after `delay`.
    pub fn push_ok(&self, delay: Duration, articles: Vec<NewsArticle>) {
        self.script.lock().unwrap().push_back(Scripted { delay, result: Ok(articles) });
    }

    /// Queue a failure after `delay`.
    pub fn push_err(&self, delay: Duration, msg: &str) {
        self.script.lock().unwrap().push_back(Scripted { delay, result: Err(msg.to_string()) });
    }

    /// Every query received so far.
    pub fn queries(&self) -> Vec<NewsQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Queries that were searches (not the featured headline).
    pub fn searches(&self) -> Vec<NewsQuery> {
        self.queries().into_iter().filter(|q| q.page_size != 1).collect()
    }
}

#[async_trait]
impl NewsSource for FakeNews {
    async fn everything(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>> {
        self.queries.lock().unwrap().push(query.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted { delay, result }) => {
                tokio::time::sleep(delay).await;
                result.map_err(|msg| anyhow!(msg))
            }
            None => Ok(self.default_articles.lock().unwrap().clone()),
        }
    }
}
