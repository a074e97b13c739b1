//! Live "AI suggestion" heuristic.
//!
//! A three-branch threshold on total goals and elapsed minutes. It is a
//! fixed display heuristic, not a model: the thresholds and confidence
//! values are part of the product copy and must not be tuned here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Fixture;

/// Goalless matches past this minute get the +0.5 goals call.
const GOALLESS_AFTER_MINUTE: u32 = 20;

/// Matches with goals before this minute get the +1.5 goals call.
const TRENDING_BEFORE_MINUTE: u32 = 70;

/// Rendering hint for a suggestion badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionStyle {
    Strong,
    Trending,
    Neutral,
}

impl SuggestionStyle {
    /// CSS class the web front end uses for this hint.
    pub fn css_class(self) -> &'static str {
        match self {
            SuggestionStyle::Strong => "text-green-400",
            SuggestionStyle::Trending => "text-yellow-500",
            SuggestionStyle::Neutral => "text-slate-400",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub label: &'static str,
    pub confidence_percent: u8,
    pub style: SuggestionStyle,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.label, self.confidence_percent)
    }
}

/// Map the current score and elapsed time to a suggestion.
///
/// Rules are checked in order and the first match wins:
/// 1. no goals and more than 20 minutes played: "likely +0.5 goals" (89%)
/// 2. at least one goal and fewer than 70 minutes played:
///    "trending +1.5 goals (live)" (76%)
/// 3. anything else: "analyzing attack flow" (65%)
pub fn suggest(home_goals: u32, away_goals: u32, elapsed_minutes: u32) -> Suggestion {
    let total_goals = home_goals.saturating_add(away_goals);

    if total_goals == 0 && elapsed_minutes > GOALLESS_AFTER_MINUTE {
        Suggestion {
            label: "likely +0.5 goals",
            confidence_percent: 89,
            style: SuggestionStyle::Strong,
        }
    } else if total_goals >= 1 && elapsed_minutes < TRENDING_BEFORE_MINUTE {
        Suggestion {
            label: "trending +1.5 goals (live)",
            confidence_percent: 76,
            style: SuggestionStyle::Trending,
        }
    } else {
        Suggestion {
            label: "analyzing attack flow",
            confidence_percent: 65,
            style: SuggestionStyle::Neutral,
        }
    }
}

/// Suggestion for a fixture's current state.
pub fn suggest_for(fixture: &Fixture) -> Suggestion {
    suggest(fixture.home_goals, fixture.away_goals, fixture.elapsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
