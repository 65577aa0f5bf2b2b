//! Read-only projections over a fixture snapshot.
//!
//! All views take the instant to evaluate against, so the same snapshot
//! gives the same answer for the same `now`.

pub mod calendar;
pub mod sensors;

pub use calendar::{calendar_window, current_event, CalendarEvent, MATCH_DURATION_MINUTES};
pub use sensors::{live_score, next_match, LiveMatch, LiveScore, NextMatch, UpcomingMatch};

use chrono::{DateTime, Utc};

use crate::fixtures::{Fixture, FixtureSet};

/// Fixtures are sorted by kickoff, so the first hit is the earliest.
fn first_unfinished(fixtures: &FixtureSet, now: DateTime<Utc>) -> Option<&Fixture> {
    fixtures.iter().find(|f| f.kickoff >= now || f.is_live())
}
