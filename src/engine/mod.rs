//! Core engine: acquisition, scheduling and the live scanner view.

pub mod acquisition;
pub mod scanner;
pub mod scheduler;

pub use acquisition::{Acquisition, AcquisitionConfig, Snapshot};
pub use scanner::{cards, select_fixtures, widget_url, FixtureCard};
