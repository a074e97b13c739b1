//! BetVision
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the local store, and runs the acquisition engine until Ctrl+C.
//! Each line typed on stdin becomes a (debounced) news search.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use betvision::config::AppConfig;
use betvision::data::{ApiFootballClient, NewsApiClient};
use betvision::engine::{cards, Acquisition, AcquisitionConfig, Snapshot};
use betvision::storage::{CommunityBoard, JsonFileStore, KeyValueStore};

const BANNER: &str = r#"
 ____       _ __     ___     _
| __ )  ___| |\ \   / (_)___(_) ___  _ __
|  _ \ / _ \ __\ \ / /| / __| |/ _ \| '_ \
| |_) |  __/ |_ \ V / | \__ \ | (_) | | | |
|____/ \___|\__| \_/  |_|___/_|\___/|_| |_|

  Live scanner & football news, v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("BETVISION_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        refresh_interval_secs = cfg.scanner.refresh_interval_secs,
        leagues = ?cfg.scanner.league_allow_list,
        "BetVision starting up"
    );

    // -- Storage -----------------------------------------------------------

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&cfg.storage.path));

    let board = CommunityBoard::load(store.clone());
    for topic in board.topics() {
        info!(id = topic.id, user = %topic.user, title = %topic.title, tip = %topic.tip, "Community tip");
    }

    // -- Providers ---------------------------------------------------------

    let fixtures = ApiFootballClient::new(
        &cfg.providers.football_base_url,
        AppConfig::resolve_secret(&cfg.providers.football_api_key_env),
        cfg.request_timeout(),
    )?;
    let news = NewsApiClient::new(
        &cfg.providers.news_base_url,
        AppConfig::resolve_secret(&cfg.providers.news_api_key_env),
        &cfg.providers.news_language,
        cfg.request_timeout(),
    )?;

    let acquisition = Acquisition::new(
        Arc::new(fixtures),
        Arc::new(news),
        store,
        AcquisitionConfig::from(&cfg),
    );

    // -- Main loop ---------------------------------------------------------

    let mut updates = acquisition.subscribe();
    acquisition.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Type a team or competition to search news. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                log_snapshot(&snapshot);
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(term)) => acquisition.search_articles(term.trim()),
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    acquisition.dispose().await;
    info!("BetVision shut down cleanly.");

    Ok(())
}

/// Log the parts of a snapshot a viewer would see.
fn log_snapshot(snapshot: &Snapshot) {
    if snapshot.is_loading() {
        info!("Scanning live fixtures...");
    }

    for card in cards(&snapshot.fixtures) {
        info!(
            fixture = %card.fixture,
            minute = card.fixture.elapsed,
            league = %card.fixture.league.name,
            suggestion = %card.suggestion,
            "Live"
        );
    }

    if let Some(featured) = &snapshot.featured {
        info!(title = %featured.title, source = %featured.source, state = %snapshot.featured_state, "Featured");
    }

    info!(
        fixtures = snapshot.fixtures.len(),
        fixtures_state = %snapshot.fixtures_state,
        articles = snapshot.articles.len(),
        articles_state = %snapshot.articles_state,
        search = %snapshot.search_term,
        "Snapshot published"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("betvision=info"));

    let json_logging = std::env::var("BETVISION_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
