//! Adaptive football fixture poller.
//!
//! Fetches one team's fixtures from API-Football, polls faster while a match
//! is live or about to kick off, and exposes next-match, live-score and
//! calendar views over the latest snapshot.

pub mod config;
pub mod fixtures;
pub mod poller;
pub mod server;
pub mod views;

pub use fixtures::{
    ApiFootball, Fixture, FixtureError, FixtureQuery, FixtureSet, FixtureSource, FixtureStatus,
};
pub use poller::{FixturePoller, IntervalPolicy, PollHealth, PollState, PollerTask};
