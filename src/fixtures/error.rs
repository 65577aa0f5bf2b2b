use thiserror::Error;

/// Failures of a single fetch cycle.
///
/// Individual malformed fixtures never show up here: they are dropped while
/// parsing and the rest of the payload is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureError {
    /// The API rejected the key (HTTP 401/403). Polling must stop until the
    /// credentials are replaced.
    #[error("API rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    /// Non-2xx status, an `errors` payload under HTTP 200, or an unreadable body.
    #[error("fixture fetch failed: {0}")]
    Fetch(String),

    /// Connection, DNS, timeout or body-read failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl FixtureError {
    /// Recoverable errors keep the previous snapshot and interval; the next
    /// attempt happens at the already computed interval.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FixtureError::Auth { .. })
    }
}

impl From<reqwest::Error> for FixtureError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FixtureError::Fetch(format!("invalid response body: {}", err))
        } else {
            FixtureError::Transport(err.to_string())
        }
    }
}
