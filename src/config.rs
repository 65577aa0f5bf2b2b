use clap::Parser;
use std::time::Duration;

use crate::fixtures::api_football::{DEFAULT_API_HOST, DEFAULT_API_URL};
use crate::fixtures::FixtureQuery;
use crate::poller::{IntervalError, IntervalPolicy};

/// Football fixture poller with live-score, next-match and calendar views
#[derive(Parser, Debug, Clone)]
#[command(name = "matchday", version, about)]
pub struct Config {
    /// API-Sports key
    #[arg(long, env = "APISPORTS_KEY", hide_env_values = true)]
    pub api_key: String,

    /// API-Football team ID
    #[arg(long, env = "TEAM_ID", value_parser = clap::value_parser!(u32).range(1..))]
    pub team_id: u32,

    /// API-Football league ID
    #[arg(long, env = "LEAGUE_ID", value_parser = clap::value_parser!(u32).range(1..))]
    pub league_id: u32,

    /// Season start year, e.g. 2024
    #[arg(long, env = "SEASON", value_parser = clap::value_parser!(u32).range(1..))]
    pub season: u32,

    /// Polling interval when no match is live or about to start (hours)
    #[arg(long, env = "BASE_INTERVAL_HOURS", default_value = "12")]
    pub base_interval_hours: u64,

    /// Polling interval while a match is live or about to start (minutes)
    #[arg(long, env = "LIVE_INTERVAL_MINUTES", default_value = "5")]
    pub live_interval_minutes: u64,

    /// API-Football base URL
    #[arg(long, env = "API_FOOTBALL_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Value sent in the x-apisports-host header
    #[arg(long, env = "API_FOOTBALL_HOST", default_value = DEFAULT_API_HOST)]
    pub api_host: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Views API listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("APISPORTS_KEY must not be empty");
        }
        if self.base_interval_hours == 0 {
            anyhow::bail!("base_interval_hours must be positive");
        }
        if self.live_interval_minutes == 0 {
            anyhow::bail!("live_interval_minutes must be positive");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("listen_addr '{}' is not a socket address", self.listen_addr);
        }
        Ok(())
    }

    pub fn query(&self) -> FixtureQuery {
        FixtureQuery {
            team_id: self.team_id,
            league_id: self.league_id,
            season: self.season,
        }
    }

    pub fn interval_policy(&self) -> Result<IntervalPolicy, IntervalError> {
        IntervalPolicy::new(
            Duration::from_secs(self.base_interval_hours * 60 * 60),
            Duration::from_secs(self.live_interval_minutes * 60),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
