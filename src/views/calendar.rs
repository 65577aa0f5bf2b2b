use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::fixtures::{Fixture, FixtureSet};

/// Matches are shown as two-hour blocks, half time included.
pub const MATCH_DURATION_MINUTES: i64 = 120;

/// A fixture rendered as a calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    /// Fixture id, stable across refreshes
    pub uid: u64,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub location: String,
}

impl CalendarEvent {
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let location = match &fixture.venue_name {
            Some(name) => format!(
                "{}, {}",
                name,
                fixture.venue_city.as_deref().unwrap_or_default()
            ),
            None => "Unknown Venue".to_string(),
        };

        CalendarEvent {
            uid: fixture.id,
            summary: fixture.title(),
            start: fixture.kickoff,
            end: fixture.kickoff + Duration::minutes(MATCH_DURATION_MINUTES),
            description: format!(
                "League: {}\nRound: {}",
                fixture.league_name,
                fixture.round_label.as_deref().unwrap_or_default()
            ),
            location,
        }
    }
}

/// Every fixture whose kickoff lies in `[start, end]`, in kickoff order.
pub fn calendar_window(
    fixtures: &FixtureSet,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    fixtures
        .iter()
        .filter(|f| start <= f.kickoff && f.kickoff <= end)
        .map(CalendarEvent::from_fixture)
        .collect()
}

/// The earliest fixture that has not finished: either kicking off at or
/// after `now`, or currently live.
pub fn current_event(fixtures: &FixtureSet, now: DateTime<Utc>) -> Option<CalendarEvent> {
    super::first_unfinished(fixtures, now).map(CalendarEvent::from_fixture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::models::tests::fixture;
    use crate::fixtures::FixtureStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_event_fields() {
        let f = fixture(9, now(), FixtureStatus::NotStarted);
        let ev = CalendarEvent::from_fixture(&f);
        assert_eq!(ev.uid, 9);
        assert_eq!(ev.summary, "Arsenal vs Chelsea");
        assert_eq!(ev.start, f.kickoff);
        assert_eq!(ev.end - ev.start, Duration::minutes(120));
        assert_eq!(ev.description, "League: Premier League\nRound: Regular Season - 12");
        assert_eq!(ev.location, "Emirates Stadium, London");
    }

    #[test]
    fn test_event_location_fallbacks() {
        let mut f = fixture(9, now(), FixtureStatus::NotStarted);
        f.venue_city = None;
        assert_eq!(CalendarEvent::from_fixture(&f).location, "Emirates Stadium, ");
        f.venue_name = None;
        f.venue_city = Some("London".into());
        assert_eq!(CalendarEvent::from_fixture(&f).location, "Unknown Venue");
        f.round_label = None;
        assert_eq!(
            CalendarEvent::from_fixture(&f).description,
            "League: Premier League\nRound: "
        );
    }

    #[test]
    fn test_event_start_recovers_kickoff() {
        let kickoff = Utc.timestamp_opt(1_700_000_123, 0).unwrap();
        let ev = CalendarEvent::from_fixture(&fixture(1, kickoff, FixtureStatus::NotStarted));
        assert_eq!(ev.start, kickoff);
        assert_eq!(ev.end, kickoff + Duration::minutes(MATCH_DURATION_MINUTES));
    }

    #[test]
    fn test_window_is_inclusive() {
        let set = FixtureSet::new(vec![
            fixture(1, now() - Duration::days(1), FixtureStatus::Finished),
            fixture(2, now(), FixtureStatus::NotStarted),
            fixture(3, now() + Duration::days(7), FixtureStatus::NotStarted),
            fixture(4, now() + Duration::days(8), FixtureStatus::NotStarted),
        ]);
        let events = calendar_window(&set, now(), now() + Duration::days(7));
        let ids: Vec<u64> = events.iter().map(|e| e.uid).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_window_reversed_is_empty() {
        let set = FixtureSet::new(vec![fixture(1, now(), FixtureStatus::NotStarted)]);
        assert!(calendar_window(&set, now() + Duration::hours(1), now() - Duration::hours(1))
            .is_empty());
    }

    #[test]
    fn test_current_event_prefers_live_past_fixture() {
        let set = FixtureSet::new(vec![
            fixture(1, now() - Duration::days(7), FixtureStatus::Finished),
            fixture(2, now() - Duration::minutes(30), FixtureStatus::FirstHalf),
            fixture(3, now() + Duration::days(7), FixtureStatus::NotStarted),
        ]);
        assert_eq!(current_event(&set, now()).map(|e| e.uid), Some(2));
    }

    #[test]
    fn test_current_event_none_when_all_past() {
        let set = FixtureSet::new(vec![fixture(
            1,
            now() - Duration::days(7),
            FixtureStatus::Finished,
        )]);
        assert!(current_event(&set, now()).is_none());
        assert!(current_event(&FixtureSet::empty(), now()).is_none());
    }
}
