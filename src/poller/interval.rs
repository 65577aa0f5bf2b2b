use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::fixtures::FixtureSet;

/// How far ahead of kickoff polling switches to the live interval.
pub const IMMINENT_WINDOW: Duration = Duration::from_secs(15 * 60);

pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);
pub const DEFAULT_LIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Rejected interval settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("base interval must be positive")]
    ZeroBase,
    #[error("live interval must be positive")]
    ZeroLive,
}

/// Chooses the delay before the next fetch. Both intervals are always
/// non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    /// Used when nothing is live or about to start
    base: Duration,
    /// Used while a match is live or within `imminent_window` of kickoff
    live: Duration,
    imminent_window: Duration,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        IntervalPolicy {
            base: DEFAULT_BASE_INTERVAL,
            live: DEFAULT_LIVE_INTERVAL,
            imminent_window: IMMINENT_WINDOW,
        }
    }
}

/// Why a given interval was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalReason {
    /// Fixture with this id is in a live phase
    Live(u64),
    /// Fixture with this id kicks off within the imminent window
    Imminent(u64),
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalDecision {
    pub interval: Duration,
    pub reason: IntervalReason,
}

impl IntervalPolicy {
    pub fn new(base: Duration, live: Duration) -> Result<Self, IntervalError> {
        if base.is_zero() {
            return Err(IntervalError::ZeroBase);
        }
        if live.is_zero() {
            return Err(IntervalError::ZeroLive);
        }
        Ok(IntervalPolicy {
            base,
            live,
            imminent_window: IMMINENT_WINDOW,
        })
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn live(&self) -> Duration {
        self.live
    }

    pub fn imminent_window(&self) -> Duration {
        self.imminent_window
    }

    /// First matching rule wins: any live fixture, then any fixture whose
    /// kickoff lies in `(now, now + imminent_window]`, otherwise the base
    /// interval. Fixture order is irrelevant.
    pub fn decide(&self, fixtures: &FixtureSet, now: DateTime<Utc>) -> IntervalDecision {
        if let Some(live) = fixtures.iter().find(|f| f.is_live()) {
            return IntervalDecision {
                interval: self.live,
                reason: IntervalReason::Live(live.id),
            };
        }

        let window = chrono::Duration::seconds(self.imminent_window.as_secs() as i64);
        let imminent = fixtures.iter().find(|f| {
            let until = f.kickoff - now;
            until > chrono::Duration::zero() && until <= window
        });
        if let Some(f) = imminent {
            return IntervalDecision {
                interval: self.live,
                reason: IntervalReason::Imminent(f.id),
            };
        }

        IntervalDecision {
            interval: self.base,
            reason: IntervalReason::Idle,
        }
    }

    pub fn next_interval(&self, fixtures: &FixtureSet, now: DateTime<Utc>) -> Duration {
        self.decide(fixtures, now).interval
    }
}
