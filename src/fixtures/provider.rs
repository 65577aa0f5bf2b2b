use async_trait::async_trait;

use super::error::FixtureError;
use super::models::FixtureSet;

/// Trait that every fixture backend must implement.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Fetch the configured team's fixtures, sorted by kickoff.
    async fn fetch_fixtures(&self) -> Result<FixtureSet, FixtureError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
