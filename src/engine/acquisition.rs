//! Data acquisition.
//!
//! Fetches live fixtures and news, shields the rest of the system from
//! provider failures, and republishes a normalised [`Snapshot`] through a
//! `watch` channel on start and on every refresh tick.
//!
//! Every resource (fixtures, featured article, article list) moves through
//! `Idle → Loading → Published | PublishedFallback`. Each request takes a
//! monotonic token for its resource and only the holder of the latest
//! token may publish, so a slow response can never overwrite a newer one.
//! After [`Acquisition::dispose`] nothing is published at all.

use chrono::{Duration as ChronoDuration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::scanner::{self, DEFAULT_FALLBACK_FIXTURES, DEFAULT_LEAGUE_ALLOW_LIST};
use super::scheduler::{spawn_periodic, Debouncer, PollHandle};
use crate::config::AppConfig;
use crate::data::news::{fallback_articles, fallback_featured};
use crate::data::{FixturesSource, NewsQuery, NewsSource};
use crate::storage::{KeyValueStore, LocalCache, FIXTURES_CACHE_KEY};
use crate::types::{FetchState, Fixture, NewsArticle};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub struct AcquisitionConfig {
    pub refresh_interval: Duration,
    pub search_debounce: Duration,
    /// Freshness window of the cached fixtures feed.
    pub fixtures_ttl: ChronoDuration,
    pub league_allow_list: Vec<u32>,
    pub fallback_fixture_count: usize,
    /// Maximum number of articles published per search.
    pub search_page_size: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(600_000),
            search_debounce: Duration::from_millis(1000),
            fixtures_ttl: ChronoDuration::minutes(10),
            league_allow_list: DEFAULT_LEAGUE_ALLOW_LIST.to_vec(),
            fallback_fixture_count: DEFAULT_FALLBACK_FIXTURES,
            search_page_size: 10,
        }
    }
}

impl From<&AppConfig> for AcquisitionConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            refresh_interval: cfg.refresh_interval(),
            search_debounce: cfg.search_debounce(),
            fixtures_ttl: cfg.fixtures_cache_ttl(),
            league_allow_list: cfg.scanner.league_allow_list.clone(),
            fallback_fixture_count: cfg.scanner.fallback_fixture_count,
            search_page_size: cfg.scanner.search_page_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// Everything a view needs, republished after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub fixtures: Vec<Fixture>,
    pub fixtures_state: FetchState,
    pub featured: Option<NewsArticle>,
    pub featured_state: FetchState,
    pub articles: Vec<NewsArticle>,
    pub articles_state: FetchState,
    pub search_term: String,
}

impl Snapshot {
    /// Whether the fixtures panel should show its loading placeholder.
    pub fn is_loading(&self) -> bool {
        self.fixtures_state == FetchState::Loading
    }

    fn state_mut(&mut self, resource: Resource) -> &mut FetchState {
        match resource {
            Resource::Fixtures => &mut self.fixtures_state,
            Resource::Featured => &mut self.featured_state,
            Resource::Articles => &mut self.articles_state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Fixtures,
    Featured,
    Articles,
}

impl Resource {
    fn index(self) -> usize {
        match self {
            Resource::Fixtures => 0,
            Resource::Featured => 1,
            Resource::Articles => 2,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Fixtures => write!(f, "fixtures"),
            Resource::Featured => write!(f, "featured"),
            Resource::Articles => write!(f, "articles"),
        }
    }
}

/// Latest request token issued per resource.
#[derive(Default)]
struct RequestTokens([AtomicU64; 3]);

impl RequestTokens {
    fn issue(&self, resource: Resource) -> u64 {
        self.0[resource.index()].fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, resource: Resource, token: u64) -> bool {
        self.0[resource.index()].load(Ordering::SeqCst) == token
    }
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

struct Inner {
    fixtures: Arc<dyn FixturesSource>,
    news: Arc<dyn NewsSource>,
    cache: LocalCache<Arc<dyn KeyValueStore>>,
    config: AcquisitionConfig,
    state: watch::Sender<Snapshot>,
    tokens: RequestTokens,
    disposed: AtomicBool,
    debouncer: Debouncer,
    poller: Mutex<Option<PollHandle>>,
}

/// The data acquisition component. Cheap to clone; clones share state.
///
/// Spawned timers hold only weak references, so dropping the last handle
/// also stops them. Call [`dispose`](Self::dispose) for an orderly stop.
#[derive(Clone)]
pub struct Acquisition {
    inner: Arc<Inner>,
}

impl Acquisition {
    pub fn new(
        fixtures: Arc<dyn FixturesSource>,
        news: Arc<dyn NewsSource>,
        store: Arc<dyn KeyValueStore>,
        config: AcquisitionConfig,
    ) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        let debouncer = Debouncer::new(config.search_debounce);
        Self {
            inner: Arc::new(Inner {
                fixtures,
                news,
                cache: LocalCache::new(store),
                config,
                state,
                tokens: RequestTokens::default(),
                disposed: AtomicBool::new(false),
                debouncer,
                poller: Mutex::new(None),
            }),
        }
    }

    /// Observe published state.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    /// Current published state.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Refresh everything now and then on every refresh interval.
    ///
    /// Calling this again while running, or after disposal, does nothing.
    pub fn start(&self) {
        if self.is_disposed() {
            warn!("start called on a disposed acquisition");
            return;
        }

        let mut poller = self.inner.poller.lock().unwrap_or_else(PoisonError::into_inner);
        // `dispose` marks first and then takes the poller under this lock.
        if self.is_disposed() {
            return;
        }
        if poller.is_some() {
            debug!("acquisition already started");
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.refresh_interval;
        *poller = Some(spawn_periodic(period, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh_all().await;
                }
            }
        }));

        info!(interval_ms = period.as_millis() as u64, "Acquisition started");
    }

    /// Stop all timers and suppress every later publication.
    pub async fn dispose(&self) {
        if !self.inner.mark_disposed() {
            return;
        }

        self.inner.debouncer.cancel();
        let poller = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = poller {
            if let Err(e) = handle.stop().await {
                warn!(error = %e, "poll loop ended abnormally");
            }
        }

        info!("Acquisition disposed");
    }

    /// Run every fetch once, concurrently.
    pub async fn refresh_all(&self) {
        self.inner.refresh_all().await;
    }

    /// Fetch live fixtures (through the cache) and publish them.
    pub async fn fetch_live_fixtures(&self) {
        self.inner.fetch_live_fixtures().await;
    }

    /// Fetch and publish the hero article, or the fallback article.
    pub async fn fetch_featured_article(&self) {
        self.inner.fetch_featured_article().await;
    }

    /// Record a new search term and schedule a debounced search for it.
    pub fn search_articles(&self, term: impl Into<String>) {
        let term = term.into();

        if !self.inner.publish_any(|s| s.search_term = term.clone()) {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.search_articles_now(&term).await;
            }
        });
    }

    /// Search immediately, bypassing the debounce.
    pub async fn search_articles_now(&self, term: &str) {
        self.inner.search_articles_now(term).await;
    }
}

impl Inner {
    /// Apply `update` unless disposed. Returns whether it was applied.
    fn publish_any(&self, update: impl FnOnce(&mut Snapshot)) -> bool {
        self.apply(|| true, update)
    }

    /// Apply `update` if `token` is still the latest for `resource`.
    fn publish(&self, resource: Resource, token: u64, update: impl FnOnce(&mut Snapshot)) -> bool {
        self.apply(
            || {
                let latest = self.tokens.is_latest(resource, token);
                if !latest {
                    debug!(%resource, token, "discarding stale response");
                }
                latest
            },
            update,
        )
    }

    /// Checks run under the watch lock, which `dispose` also takes, so no
    /// update can land after disposal has returned.
    fn apply(&self, guard: impl FnOnce() -> bool, update: impl FnOnce(&mut Snapshot)) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|snapshot| {
            if self.disposed.load(Ordering::SeqCst) {
                debug!("acquisition disposed; dropping update");
                return false;
            }
            if !guard() {
                return false;
            }
            update(snapshot);
            applied = true;
            true
        });
        applied
    }

    /// Mark disposed under the watch lock. Returns false if already disposed.
    fn mark_disposed(&self) -> bool {
        let mut first = false;
        self.state.send_if_modified(|_| {
            first = !self.disposed.swap(true, Ordering::SeqCst);
            false
        });
        first
    }

    /// Issue a token for `resource` and mark it loading.
    fn begin(&self, resource: Resource) -> u64 {
        let token = self.tokens.issue(resource);
        self.publish_any(|s| *s.state_mut(resource) = FetchState::Loading);
        token
    }

    async fn refresh_all(&self) {
        let term = self.state.borrow().search_term.clone();
        futures::join!(
            self.fetch_live_fixtures(),
            self.fetch_featured_article(),
            self.search_articles_now(&term),
        );
    }

    async fn fetch_live_fixtures(&self) {
        let token = self.begin(Resource::Fixtures);

        let result = self
            .cache
            .get_or_fetch_if(
                FIXTURES_CACHE_KEY,
                Utc::now(),
                self.config.fixtures_ttl,
                || self.fixtures.fetch_live(),
                || self.tokens.is_latest(Resource::Fixtures, token),
            )
            .await;

        match result {
            Ok(raw) => {
                let raw_count = raw.len();
                let selected = scanner::select_fixtures(
                    raw,
                    &self.config.league_allow_list,
                    self.config.fallback_fixture_count,
                );
                info!(raw = raw_count, published = selected.len(), "Live fixtures refreshed");
                self.publish(Resource::Fixtures, token, |s| {
                    s.fixtures = selected;
                    s.fixtures_state = FetchState::Published;
                });
            }
            Err(e) => {
                error!(error = %e, "Live fixtures fetch failed");
                self.publish(Resource::Fixtures, token, |s| {
                    s.fixtures = Vec::new();
                    s.fixtures_state = FetchState::PublishedFallback;
                });
            }
        }
    }

    async fn fetch_featured_article(&self) {
        let token = self.begin(Resource::Featured);

        let article = match self.news.everything(&NewsQuery::featured()).await {
            Ok(articles) => articles.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "Featured article fetch failed, using fallback");
                None
            }
        };

        match article {
            Some(article) => {
                debug!(title = %article.title, "Featured article refreshed");
                self.publish(Resource::Featured, token, |s| {
                    s.featured = Some(article);
                    s.featured_state = FetchState::Published;
                });
            }
            None => {
                info!("No featured article available, publishing fallback");
                let fallback = fallback_featured(Utc::now());
                self.publish(Resource::Featured, token, |s| {
                    s.featured = Some(fallback);
                    s.featured_state = FetchState::PublishedFallback;
                });
            }
        }
    }

    async fn search_articles_now(&self, term: &str) {
        let token = self.begin(Resource::Articles);
        let query = NewsQuery::search(term, self.config.search_page_size);

        match self.news.everything(&query).await {
            Ok(mut articles) => {
                articles.truncate(self.config.search_page_size as usize);
                info!(term, count = articles.len(), "Article search refreshed");
                self.publish(Resource::Articles, token, |s| {
                    s.articles = articles;
                    s.articles_state = FetchState::Published;
                });
            }
            Err(e) => {
                warn!(term, error = %e, "Article search failed, keeping previous results");
                let now = Utc::now();
                self.publish(Resource::Articles, token, |s| {
                    if s.articles.is_empty() {
                        s.articles = fallback_articles(now);
                    }
                    s.articles_state = FetchState::PublishedFallback;
                });
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let poller = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = poller {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
