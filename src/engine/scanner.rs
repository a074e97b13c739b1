//! Live scanner view model.
//!
//! Turns the raw live-fixture list into what the scanner panel shows:
//! fixtures from the allowed leagues (or a bounded fallback slice when
//! none of them are live), each paired with its suggestion and the URL of
//! the third-party live-match widget.

use serde::Serialize;
use tracing::debug;

use crate::strategy::{suggest_for, Suggestion};
use crate::types::Fixture;

/// Leagues the scanner prefers, by API-Football id.
pub const DEFAULT_LEAGUE_ALLOW_LIST: [u32; 5] = [742, 140, 71, 39, 2];

/// Fixtures shown when no allowed league is live.
pub const DEFAULT_FALLBACK_FIXTURES: usize = 10;

const WIDGET_BASE: &str = "https://widgets.scoreaxis.com/api/football/live-match";
const WIDGET_ID: &str = "a0somkj2yfa8";

/// Keep fixtures whose league is allowed.
///
/// If that leaves nothing, the first `fallback_len` fixtures of `raw` are
/// returned instead so the panel is never empty while matches are live.
pub fn select_fixtures(raw: Vec<Fixture>, allow_list: &[u32], fallback_len: usize) -> Vec<Fixture> {
    let raw_len = raw.len();
    let (allowed, others): (Vec<Fixture>, Vec<Fixture>) =
        raw.into_iter().partition(|f| allow_list.contains(&f.league.id));

    if !allowed.is_empty() {
        debug!(raw = raw_len, kept = allowed.len(), "Filtered fixtures by league");
        return allowed;
    }

    // Nothing allowed, so `others` is the whole list in original order.
    let fallback: Vec<Fixture> = others.into_iter().take(fallback_len).collect();
    debug!(raw = raw_len, kept = fallback.len(), "No allowed league live, using fallback slice");
    fallback
}

/// URL of the embeddable live-match widget for a fixture.
pub fn widget_url(fixture_id: u64) -> String {
    let body = urlencoding::encode("#0f172a");
    let text = urlencoding::encode("#ffffff");
    let border = urlencoding::encode("#1e293b");
    format!(
        "{WIDGET_BASE}/{fixture_id}?widgetId={WIDGET_ID}&lang=pt&lineupsBlock=1&eventsBlock=1\
         &statsBlock=1&links=0&font=heebo&fontSize=14&widgetWidth=auto\
         &bodyColor={body}&textColor={text}&borderColor={border}&tabColor={border}"
    )
}

/// One row of the scanner panel.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureCard {
    pub fixture: Fixture,
    pub suggestion: Suggestion,
    pub widget_url: String,
}

impl FixtureCard {
    pub fn new(fixture: Fixture) -> Self {
        let suggestion = suggest_for(&fixture);
        let widget_url = widget_url(fixture.id);
        Self { fixture, suggestion, widget_url }
    }
}

/// Cards for every published fixture, in order.
pub fn cards(fixtures: &[Fixture]) -> Vec<FixtureCard> {
    fixtures.iter().cloned().map(FixtureCard::new).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
