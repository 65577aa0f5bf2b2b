use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::error::FixtureError;
use super::models::{Fixture, FixtureSet, FixtureStatus};
use super::provider::FixtureSource;

pub const DEFAULT_API_URL: &str = "https://v3.football.api-sports.io";
pub const DEFAULT_API_HOST: &str = "v3.football.api-sports.io";

/// Which fixtures to ask for: one team, in one league, for one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureQuery {
    pub team_id: u32,
    pub league_id: u32,
    pub season: u32,
}

/// Fixture source backed by the API-Football v3 `/fixtures` endpoint.
/// Docs: <https://www.api-football.com/documentation-v3#tag/Fixtures>
pub struct ApiFootball {
    http: Client,
    api_key: String,
    api_host: String,
    /// Base URL for overriding in tests
    base_url: String,
    query: FixtureQuery,
}

impl ApiFootball {
    pub fn new(api_key: &str, query: FixtureQuery, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("API key must not be empty");
        }
        if query.team_id == 0 || query.league_id == 0 || query.season == 0 {
            anyhow::bail!("team, league and season must be positive integers");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiFootball {
            http,
            api_key: api_key.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
            query,
        })
    }

    /// Point the client at another deployment (or a local stub).
    pub fn with_endpoint(mut self, base_url: &str, api_host: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.api_host = api_host.to_string();
        self
    }
}

#[async_trait]
impl FixtureSource for ApiFootball {
    fn name(&self) -> &str {
        "API-Football"
    }

    async fn fetch_fixtures(&self) -> Result<FixtureSet, FixtureError> {
        let url = format!("{}/fixtures", self.base_url);
        debug!(
            "Fetching fixtures from {} (team={}, league={}, season={})",
            url, self.query.team_id, self.query.league_id, self.query.season
        );

        let resp = self
            .http
            .get(&url)
            .header("x-apisports-key", &self.api_key)
            .header("x-apisports-host", &self.api_host)
            .query(&[
                ("team", self.query.team_id),
                ("season", self.query.season),
                ("league", self.query.league_id),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FixtureError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FixtureError::Fetch(format!("API returned HTTP {}", status)));
        }

        let body = resp.bytes().await?;
        parse_fixtures_response(&body)
    }
}

/// Turn a `/fixtures` response body into a sorted `FixtureSet`.
///
/// Whole-payload problems (bad JSON, missing `response`, non-empty `errors`)
/// fail the fetch; a broken individual item is skipped.
pub fn parse_fixtures_response(body: &[u8]) -> Result<FixtureSet, FixtureError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| FixtureError::Fetch(format!("invalid JSON body: {}", e)))?;

    if let Some(messages) = api_errors(&raw) {
        return Err(FixtureError::Fetch(format!(
            "API reported errors: {}",
            messages.join("; ")
        )));
    }

    let items = raw
        .get("response")
        .and_then(Value::as_array)
        .ok_or_else(|| FixtureError::Fetch("payload has no `response` array".to_string()))?;

    let fixtures: Vec<Fixture> = items.iter().filter_map(parse_fixture).collect();
    if fixtures.len() < items.len() {
        debug!(
            "Dropped {} malformed fixture(s) of {}",
            items.len() - fixtures.len(),
            items.len()
        );
    }

    Ok(FixtureSet::new(fixtures))
}

/// API-Sports reports request problems as `errors`, either a list or a
/// `{field: message}` map, while still answering HTTP 200. Any other
/// non-empty value (`true`, a non-zero number) also counts as an error.
fn api_errors(raw: &Value) -> Option<Vec<String>> {
    let messages: Vec<String> = match raw.get("errors")? {
        Value::Array(list) => list.iter().map(value_text).collect(),
        Value::Object(map) => map
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, value_text(msg)))
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Bool(true) => vec!["true".to_string()],
        Value::Number(n) if n.as_f64() != Some(0.0) => vec![n.to_string()],
        _ => Vec::new(),
    };
    if messages.is_empty() {
        None
    } else {
        Some(messages)
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawItem {
    fixture: RawFixture,
    #[serde(default)]
    league: Option<RawLeague>,
    #[serde(default)]
    teams: Option<RawTeams>,
    #[serde(default)]
    goals: Option<RawGoals>,
}

#[derive(Deserialize)]
struct RawFixture {
    id: Option<u64>,
    timestamp: Option<i64>,
    #[serde(default)]
    status: Option<RawStatus>,
    #[serde(default)]
    venue: Option<RawVenue>,
}

#[derive(Deserialize, Default)]
struct RawStatus {
    long: Option<String>,
    short: Option<String>,
    elapsed: Option<u32>,
}

#[derive(Deserialize, Default)]
struct RawVenue {
    name: Option<String>,
    city: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawLeague {
    name: Option<String>,
    round: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawTeams {
    home: Option<RawTeam>,
    away: Option<RawTeam>,
}

#[derive(Deserialize)]
struct RawTeam {
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawGoals {
    home: Option<u32>,
    away: Option<u32>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn parse_fixture(item: &Value) -> Option<Fixture> {
    let raw = match RawItem::deserialize(item) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Skipping malformed fixture: {}", e);
            return None;
        }
    };

    let id = raw.fixture.id?;
    let kickoff = match raw.fixture.timestamp.filter(|ts| *ts > 0) {
        Some(ts) => DateTime::<Utc>::from_timestamp(ts, 0)?,
        None => {
            debug!("Skipping fixture {} without a kickoff timestamp", id);
            return None;
        }
    };

    let status_raw = raw.fixture.status.unwrap_or_default();
    let status = FixtureStatus::from_short(status_raw.short.as_deref().unwrap_or(""));
    let elapsed_minutes = status_raw.elapsed.filter(|_| status.is_live());

    let teams = raw.teams.unwrap_or_default();
    let team_name =
        |t: Option<RawTeam>| non_empty(t.and_then(|t| t.name)).unwrap_or_else(|| "Unknown".into());

    let goals = raw.goals.unwrap_or_default();
    let league = raw.league.unwrap_or_default();
    let venue = raw.fixture.venue.unwrap_or_default();

    Some(Fixture {
        id,
        kickoff,
        status_long: non_empty(status_raw.long).unwrap_or_else(|| "Unknown".into()),
        status,
        elapsed_minutes,
        home_team: team_name(teams.home),
        away_team: team_name(teams.away),
        home_score: goals.home.unwrap_or(0),
        away_score: goals.away.unwrap_or(0),
        league_name: non_empty(league.name).unwrap_or_else(|| "Unknown".into()),
        round_label: non_empty(league.round),
        venue_name: non_empty(venue.name),
        venue_city: non_empty(venue.city),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::HeaderMap,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn item(id: u64, timestamp: Option<i64>, short: &str) -> Value {
        json!({
            "fixture": {
                "id": id,
                "timestamp": timestamp,
                "status": { "long": "Match Finished", "short": short, "elapsed": 90 },
                "venue": { "name": "Emirates Stadium", "city": "London" }
            },
            "league": { "name": "Premier League", "round": "Regular Season - 1" },
            "teams": { "home": { "name": "Arsenal" }, "away": { "name": "Chelsea" } },
            "goals": { "home": 2, "away": null }
        })
    }

    fn body(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn test_parse_sorts_by_kickoff() {
        let payload = json!({
            "errors": [],
            "response": [
                item(3, Some(1_700_300_000), "NS"),
                item(1, Some(1_700_100_000), "FT"),
                item(2, Some(1_700_200_000), "NS"),
            ]
        });
        let set = parse_fixtures_response(&body(payload)).unwrap();
        let ids: Vec<u64> = set.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_fields_and_defaults() {
        let payload = json!({
            "response": [{
                "fixture": {
                    "id": 42,
                    "timestamp": 1_700_000_000,
                    "status": { "long": "First Half", "short": "1H", "elapsed": 23 },
                    "venue": { "name": null, "city": null }
                },
                "league": { "name": null, "round": null },
                "teams": { "home": { "name": "Arsenal" }, "away": {} },
                "goals": { "home": null, "away": 1 }
            }]
        });
        let set = parse_fixtures_response(&body(payload)).unwrap();
        let f = set.get(42).unwrap();
        assert_eq!(f.kickoff.timestamp(), 1_700_000_000);
        assert_eq!(f.status, FixtureStatus::FirstHalf);
        assert_eq!(f.status_long, "First Half");
        assert_eq!(f.elapsed_minutes, Some(23));
        assert_eq!(f.home_team, "Arsenal");
        assert_eq!(f.away_team, "Unknown");
        assert_eq!(f.home_score, 0);
        assert_eq!(f.away_score, 1);
        assert_eq!(f.league_name, "Unknown");
        assert_eq!(f.round_label, None);
        assert_eq!(f.venue_name, None);
    }

    #[test]
    fn test_elapsed_only_kept_while_live() {
        let set = parse_fixtures_response(&body(json!({
            "response": [item(1, Some(1_700_000_000), "FT")]
        })))
        .unwrap();
        assert_eq!(set.get(1).unwrap().elapsed_minutes, None);
    }

    #[test]
    fn test_missing_timestamp_dropped() {
        let mut broken = item(2, None, "NS");
        broken["fixture"]
            .as_object_mut()
            .unwrap()
            .remove("timestamp");
        let payload = json!({
            "response": [
                item(3, Some(1_700_300_000), "NS"),
                broken,
                item(4, None, "NS"),
                item(5, Some(0), "NS"),
                item(1, Some(1_700_100_000), "FT"),
            ]
        });
        let set = parse_fixtures_response(&body(payload)).unwrap();
        let ids: Vec<u64> = set.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_malformed_item_dropped() {
        let mut bad_ts = item(2, None, "NS");
        bad_ts["fixture"]["timestamp"] = json!("tomorrow");
        let payload = json!({
            "response": [
                item(1, Some(1_700_100_000), "NS"),
                bad_ts,
                json!("not a fixture"),
                json!({ "fixture": { "timestamp": 1_700_000_000 } }),
            ]
        });
        let set = parse_fixtures_response(&body(payload)).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().id, 1);
    }

    #[test]
    fn test_errors_list_is_fetch_error() {
        let payload = json!({
            "errors": ["rate limit reached"],
            "response": [item(1, Some(1_700_000_000), "NS")]
        });
        match parse_fixtures_response(&body(payload)) {
            Err(FixtureError::Fetch(msg)) => assert!(msg.contains("rate limit reached")),
            other => panic!("Expected Fetch error, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_map_is_fetch_error() {
        let payload = json!({
            "errors": { "season": "The Season field must contain 4 characters." },
            "response": []
        });
        match parse_fixtures_response(&body(payload)) {
            Err(FixtureError::Fetch(msg)) => assert!(msg.contains("season")),
            other => panic!("Expected Fetch error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_errors_object_is_success() {
        let set = parse_fixtures_response(&body(json!({ "errors": {}, "response": [] }))).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_scalar_errors_flag() {
        for errors in [json!(true), json!(1), json!(2.5)] {
            let payload = json!({ "errors": errors, "response": [] });
            assert!(
                matches!(parse_fixtures_response(&body(payload)), Err(FixtureError::Fetch(_))),
                "errors={} should fail the fetch",
                errors
            );
        }
        for errors in [json!(false), json!(0), json!(null), json!(""), json!([])] {
            let payload = json!({ "errors": errors, "response": [] });
            assert!(
                parse_fixtures_response(&body(payload)).is_ok(),
                "errors={} should not fail the fetch",
                errors
            );
        }
    }

    #[test]
    fn test_invalid_json_and_missing_response() {
        assert!(matches!(
            parse_fixtures_response(b"<html>"),
            Err(FixtureError::Fetch(_))
        ));
        assert!(matches!(
            parse_fixtures_response(&body(json!({ "results": 0 }))),
            Err(FixtureError::Fetch(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_query() {
        let q = FixtureQuery { team_id: 42, league_id: 39, season: 2024 };
        assert!(ApiFootball::new("", q, Duration::from_secs(5)).is_err());
        let zero = FixtureQuery { team_id: 0, ..q };
        assert!(ApiFootball::new("key", zero, Duration::from_secs(5)).is_err());
        assert!(ApiFootball::new("key", q, Duration::from_secs(5)).is_ok());
    }

    // ── HTTP tests against a local stub server ──────────────────────────────

    struct Stub {
        status: StatusCode,
        body: Value,
        delay: Duration,
        seen: Mutex<Option<(HeaderMap, HashMap<String, String>)>>,
    }

    async fn stub_handler(
        State(stub): State<Arc<Stub>>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        *stub.seen.lock().unwrap() = Some((headers, params));
        if !stub.delay.is_zero() {
            tokio::time::sleep(stub.delay).await;
        }
        (stub.status, Json(stub.body.clone()))
    }

    async fn spawn_stub(status: StatusCode, body: Value, delay: Duration) -> (String, Arc<Stub>) {
        let stub = Arc::new(Stub {
            status,
            body,
            delay,
            seen: Mutex::new(None),
        });
        let app = Router::new()
            .route("/fixtures", get(stub_handler))
            .with_state(Arc::clone(&stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), stub)
    }

    fn client(base_url: &str, timeout: Duration) -> ApiFootball {
        ApiFootball::new(
            "secret-key",
            FixtureQuery { team_id: 42, league_id: 39, season: 2024 },
            timeout,
        )
        .unwrap()
        .with_endpoint(base_url, "stub.local")
    }

    #[tokio::test]
    async fn test_fetch_sends_credentials_and_query() {
        let payload = json!({ "errors": [], "response": [item(7, Some(1_700_000_000), "NS")] });
        let (url, stub) = spawn_stub(StatusCode::OK, payload, Duration::ZERO).await;

        let set = client(&url, Duration::from_secs(5)).fetch_fixtures().await.unwrap();
        assert_eq!(set.len(), 1);

        let (headers, params) = stub.seen.lock().unwrap().take().unwrap();
        assert_eq!(headers.get("x-apisports-key").unwrap(), "secret-key");
        assert_eq!(headers.get("x-apisports-host").unwrap(), "stub.local");
        assert_eq!(params.get("team").map(String::as_str), Some("42"));
        assert_eq!(params.get("league").map(String::as_str), Some("39"));
        assert_eq!(params.get("season").map(String::as_str), Some("2024"));
    }

    #[tokio::test]
    async fn test_fetch_unauthorized_is_auth_error() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let (url, _stub) = spawn_stub(status, json!({}), Duration::ZERO).await;
            let err = client(&url, Duration::from_secs(5)).fetch_fixtures().await.unwrap_err();
            assert_eq!(err, FixtureError::Auth { status: status.as_u16() });
        }
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_fetch_error() {
        let (url, _stub) =
            spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, json!({}), Duration::ZERO).await;
        let err = client(&url, Duration::from_secs(5)).fetch_fixtures().await.unwrap_err();
        assert!(matches!(err, FixtureError::Fetch(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_fetch_errors_under_200_is_fetch_error() {
        let payload = json!({ "errors": { "token": "Error/Missing application key." }, "response": [] });
        let (url, _stub) = spawn_stub(StatusCode::OK, payload, Duration::ZERO).await;
        let err = client(&url, Duration::from_secs(5)).fetch_fixtures().await.unwrap_err();
        assert!(matches!(err, FixtureError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr), Duration::from_secs(5))
            .fetch_fixtures()
            .await
            .unwrap_err();
        assert!(matches!(err, FixtureError::Transport(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_transport_error() {
        let (url, _stub) = spawn_stub(
            StatusCode::OK,
            json!({ "response": [] }),
            Duration::from_secs(3),
        )
        .await;
        let err = client(&url, Duration::from_millis(200))
            .fetch_fixtures()
            .await
            .unwrap_err();
        assert!(matches!(err, FixtureError::Transport(_)), "got {:?}", err);
    }
}
