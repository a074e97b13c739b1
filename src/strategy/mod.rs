//! Per-fixture betting suggestions shown on scanner cards.

pub mod suggestion;

pub use suggestion::{suggest, suggest_for, Suggestion, SuggestionStyle};
