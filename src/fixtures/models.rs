use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Match status as reported by API-Football's `fixture.status.short` code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FixtureStatus {
    /// Kickoff time not yet defined
    TimeToBeDefined,
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    ExtraTime,
    /// Break between regular and extra time
    BreakTime,
    Penalties,
    Suspended,
    Interrupted,
    /// In progress, phase not reported
    Live,
    Finished,
    FinishedAfterExtraTime,
    FinishedAfterPenalties,
    Postponed,
    Cancelled,
    Abandoned,
    TechnicalLoss,
    WalkOver,
    /// Any code we don't know about, kept verbatim
    Other(String),
}

impl FixtureStatus {
    pub fn from_short(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "TBD" => FixtureStatus::TimeToBeDefined,
            "NS" => FixtureStatus::NotStarted,
            "1H" => FixtureStatus::FirstHalf,
            "HT" => FixtureStatus::HalfTime,
            "2H" => FixtureStatus::SecondHalf,
            "ET" => FixtureStatus::ExtraTime,
            "BT" => FixtureStatus::BreakTime,
            "P" => FixtureStatus::Penalties,
            "SUSP" => FixtureStatus::Suspended,
            "INT" => FixtureStatus::Interrupted,
            "LIVE" => FixtureStatus::Live,
            "FT" => FixtureStatus::Finished,
            "AET" => FixtureStatus::FinishedAfterExtraTime,
            "PEN" => FixtureStatus::FinishedAfterPenalties,
            "PST" => FixtureStatus::Postponed,
            "CANC" => FixtureStatus::Cancelled,
            "ABD" => FixtureStatus::Abandoned,
            "AWD" => FixtureStatus::TechnicalLoss,
            "WO" => FixtureStatus::WalkOver,
            _ => FixtureStatus::Other(code.trim().to_string()),
        }
    }

    pub fn as_short(&self) -> &str {
        match self {
            FixtureStatus::TimeToBeDefined => "TBD",
            FixtureStatus::NotStarted => "NS",
            FixtureStatus::FirstHalf => "1H",
            FixtureStatus::HalfTime => "HT",
            FixtureStatus::SecondHalf => "2H",
            FixtureStatus::ExtraTime => "ET",
            FixtureStatus::BreakTime => "BT",
            FixtureStatus::Penalties => "P",
            FixtureStatus::Suspended => "SUSP",
            FixtureStatus::Interrupted => "INT",
            FixtureStatus::Live => "LIVE",
            FixtureStatus::Finished => "FT",
            FixtureStatus::FinishedAfterExtraTime => "AET",
            FixtureStatus::FinishedAfterPenalties => "PEN",
            FixtureStatus::Postponed => "PST",
            FixtureStatus::Cancelled => "CANC",
            FixtureStatus::Abandoned => "ABD",
            FixtureStatus::TechnicalLoss => "AWD",
            FixtureStatus::WalkOver => "WO",
            FixtureStatus::Other(code) => code,
        }
    }

    /// Whether the match is in an active phase. Suspended and interrupted
    /// matches count as live: they can resume at any minute.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            FixtureStatus::FirstHalf
                | FixtureStatus::HalfTime
                | FixtureStatus::SecondHalf
                | FixtureStatus::ExtraTime
                | FixtureStatus::BreakTime
                | FixtureStatus::Penalties
                | FixtureStatus::Suspended
                | FixtureStatus::Interrupted
                | FixtureStatus::Live
        )
    }
}

impl Serialize for FixtureStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_short())
    }
}

/// One scheduled, in-progress or finished match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    /// API-Football fixture ID
    pub id: u64,
    pub kickoff: DateTime<Utc>,
    pub status: FixtureStatus,
    /// Human-readable status, e.g. "First Half"
    pub status_long: String,
    /// Only set while the fixture is live
    pub elapsed_minutes: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub league_name: String,
    pub round_label: Option<String>,
    pub venue_name: Option<String>,
    pub venue_city: Option<String>,
}

impl Fixture {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// "Home vs Away"
    pub fn title(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// Result of one successful fetch: fixtures ordered by kickoff, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FixtureSet {
    fixtures: Vec<Fixture>,
}

impl FixtureSet {
    /// Build a set from fixtures in any order. The first occurrence of a
    /// duplicated id wins; the sort is stable so equal kickoffs keep their
    /// input order.
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        let mut seen = HashSet::new();
        let mut fixtures: Vec<Fixture> = fixtures
            .into_iter()
            .filter(|f| seen.insert(f.id))
            .collect();
        fixtures.sort_by_key(|f| f.kickoff);
        FixtureSet { fixtures }
    }

    pub fn empty() -> Self {
        FixtureSet::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fixture> {
        self.fixtures.iter()
    }

    pub fn as_slice(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }
}

impl<'a> IntoIterator for &'a FixtureSet {
    type Item = &'a Fixture;
    type IntoIter = std::slice::Iter<'a, Fixture>;

    fn into_iter(self) -> Self::IntoIter {
        self.fixtures.iter()
    }
}
