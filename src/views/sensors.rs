use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fixtures::{Fixture, FixtureSet, FixtureStatus};

pub const NO_UPCOMING_MATCH: &str = "No upcoming matches";
pub const NO_LIVE_MATCH: &str = "No Live Match";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingMatch {
    pub fixture_id: u64,
    /// "Home vs Away"
    pub summary: String,
    pub kickoff: DateTime<Utc>,
    pub status: FixtureStatus,
    pub league: String,
    pub round: String,
    pub venue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextMatch {
    Upcoming(UpcomingMatch),
    NoUpcomingMatch,
}

impl NextMatch {
    /// Display text: the pairing, or the "no upcoming matches" sentinel.
    pub fn state(&self) -> &str {
        match self {
            NextMatch::Upcoming(m) => &m.summary,
            NextMatch::NoUpcomingMatch => NO_UPCOMING_MATCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMatch {
    pub fixture_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: FixtureStatus,
    pub status_long: String,
    pub elapsed_minutes: u32,
}

impl LiveMatch {
    fn from_fixture(f: &Fixture) -> Self {
        LiveMatch {
            fixture_id: f.id,
            home_team: f.home_team.clone(),
            away_team: f.away_team.clone(),
            home_score: f.home_score,
            away_score: f.away_score,
            status: f.status.clone(),
            status_long: f.status_long.clone(),
            elapsed_minutes: f.elapsed_minutes.unwrap_or(0),
        }
    }

    /// "Home 2 - 1 Away"
    pub fn scoreline(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.home_team, self.home_score, self.away_score, self.away_team
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveScore {
    Live(LiveMatch),
    NoLiveMatch,
}

impl LiveScore {
    pub fn state(&self) -> String {
        match self {
            LiveScore::Live(m) => m.scoreline(),
            LiveScore::NoLiveMatch => NO_LIVE_MATCH.to_string(),
        }
    }
}

/// Earliest fixture kicking off at or after `now`, or already live.
pub fn next_match(fixtures: &FixtureSet, now: DateTime<Utc>) -> NextMatch {
    match super::first_unfinished(fixtures, now) {
        Some(f) => NextMatch::Upcoming(UpcomingMatch {
            fixture_id: f.id,
            summary: f.title(),
            kickoff: f.kickoff,
            status: f.status.clone(),
            league: f.league_name.clone(),
            round: f.round_label.clone().unwrap_or_else(|| "Unknown".into()),
            venue: f.venue_name.clone().unwrap_or_else(|| "Unknown".into()),
        }),
        None => NextMatch::NoUpcomingMatch,
    }
}

/// First live fixture in kickoff order.
pub fn live_score(fixtures: &FixtureSet) -> LiveScore {
    fixtures
        .iter()
        .find(|f| f.is_live())
        .map(|f| LiveScore::Live(LiveMatch::from_fixture(f)))
        .unwrap_or(LiveScore::NoLiveMatch)
}
