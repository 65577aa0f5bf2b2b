//! Fetch-then-sleep loop that keeps the latest fixture snapshot.
//!
//! ```text
//!  loop:  FixtureSource::fetch_fixtures()  ──ok──▶ IntervalPolicy::decide()
//!              │                                   │ install new PollState
//!              └──recoverable error──▶ keep snapshot + interval, record error
//!         sleep(interval) | request_refresh() | stop()
//! ```
//!
//! Readers never wait on the network: `snapshot()` clones an `Arc` out of a
//! `tokio::sync::watch` channel, and every write swaps the whole state.

pub mod interval;

pub use interval::{
    IntervalDecision, IntervalError, IntervalPolicy, IntervalReason, DEFAULT_BASE_INTERVAL,
    DEFAULT_LIVE_INTERVAL, IMMINENT_WINDOW,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::fixtures::{FixtureError, FixtureSet, FixtureSource};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollHealth {
    /// No fetch has completed yet
    Pending,
    Healthy,
    /// Last fetch failed; serving the previous snapshot
    Degraded,
    /// Credentials rejected; polling has stopped
    AuthRejected,
}

/// Point-in-time view of the poller. Never mutated once published.
#[derive(Debug, Clone)]
pub struct PollState {
    pub fixtures: Arc<FixtureSet>,
    /// Delay before the next scheduled fetch
    pub interval: Duration,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub health: PollHealth,
}

impl PollState {
    fn initial(interval: Duration) -> Self {
        PollState {
            fixtures: Arc::new(FixtureSet::empty()),
            interval,
            last_success: None,
            last_attempt: None,
            last_error: None,
            health: PollHealth::Pending,
        }
    }
}

struct Shared {
    source: Arc<dyn FixtureSource>,
    policy: IntervalPolicy,
    fetch_timeout: Duration,
    state: watch::Sender<Arc<PollState>>,
    refresh: Notify,
}

/// Adaptive fixture poller. Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct FixturePoller {
    shared: Arc<Shared>,
}

impl FixturePoller {
    pub fn new(
        source: Arc<dyn FixtureSource>,
        policy: IntervalPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(PollState::initial(policy.base())));
        FixturePoller {
            shared: Arc::new(Shared {
                source,
                policy,
                fetch_timeout,
                state,
                refresh: Notify::new(),
            }),
        }
    }

    /// Latest published state. Never blocks on a fetch.
    pub fn snapshot(&self) -> Arc<PollState> {
        Arc::clone(&self.shared.state.borrow())
    }

    /// Receiver that is notified every time a new state is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PollState>> {
        self.shared.state.subscribe()
    }

    /// Wake the running loop for an immediate fetch.
    pub fn request_refresh(&self) {
        self.shared.refresh.notify_one();
    }

    /// Run one fetch cycle and publish the outcome. Returns the interval to
    /// wait before the next cycle.
    pub async fn poll_once(&self) -> Result<Duration, FixtureError> {
        let result = self.fetch().await;
        self.apply(result, Utc::now())
    }

    async fn fetch(&self) -> Result<FixtureSet, FixtureError> {
        let timeout = self.shared.fetch_timeout;
        match tokio::time::timeout(timeout, self.shared.source.fetch_fixtures()).await {
            Ok(result) => result,
            Err(_) => Err(FixtureError::Transport(format!(
                "timed out after {:?}",
                timeout
            ))),
        }
    }

    /// Publish a fetch outcome observed at `now`.
    fn apply(
        &self,
        result: Result<FixtureSet, FixtureError>,
        now: DateTime<Utc>,
    ) -> Result<Duration, FixtureError> {
        let source = self.shared.source.name();
        match result {
            Ok(fixtures) => {
                let decision = self.shared.policy.decide(&fixtures, now);
                debug!(
                    "{}: {} fixture(s), next poll in {:?} ({:?})",
                    source,
                    fixtures.len(),
                    decision.interval,
                    decision.reason
                );
                let fixtures = Arc::new(fixtures);
                self.shared.state.send_modify(|current| {
                    if current.interval != decision.interval {
                        info!(
                            "Polling interval changed: {:?} -> {:?} ({:?})",
                            current.interval, decision.interval, decision.reason
                        );
                    }
                    *current = Arc::new(PollState {
                        fixtures,
                        interval: decision.interval,
                        last_success: Some(now),
                        last_attempt: Some(now),
                        last_error: None,
                        health: PollHealth::Healthy,
                    });
                });
                Ok(decision.interval)
            }
            Err(err) => {
                let health = if err.is_recoverable() {
                    warn!("{}: fetch failed, keeping previous fixtures: {}", source, err);
                    PollHealth::Degraded
                } else {
                    error!("{}: {} - polling stopped until reconfigured", source, err);
                    PollHealth::AuthRejected
                };
                self.shared.state.send_modify(|current| {
                    *current = Arc::new(PollState {
                        fixtures: Arc::clone(&current.fixtures),
                        interval: current.interval,
                        last_success: current.last_success,
                        last_attempt: Some(now),
                        last_error: Some(err.to_string()),
                        health,
                    });
                });
                Err(err)
            }
        }
    }

    /// Spawn the polling loop. The first fetch happens immediately.
    ///
    /// Dropping the returned handle detaches the loop: it keeps polling
    /// until the runtime shuts down or an auth error ends it.
    pub fn start(&self) -> PollerTask {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let poller = self.clone();
        let handle = tokio::spawn(async move { poller.run(shutdown_rx).await });
        PollerTask { shutdown, handle }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Fixture poller started (source={}, base={:?}, live={:?})",
            self.shared.source.name(),
            self.shared.policy.base(),
            self.shared.policy.live()
        );

        loop {
            let outcome = tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                res = self.poll_once() => res,
            };

            let wait = match outcome {
                Ok(interval) => interval,
                Err(err) if !err.is_recoverable() => break,
                Err(_) => self.snapshot().interval,
            };

            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                _ = self.shared.refresh.notified() => {
                    debug!("Refresh requested, polling now");
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Fixture poller stopped");
    }
}

/// Resolves once `stop()` has been called. A dropped handle never stops
/// the loop.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

/// Handle to a running polling loop.
#[must_use = "dropping the handle detaches the poller; keep it to call stop()"]
pub struct PollerTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollerTask {
    /// Signal the loop to stop and wait for it. An in-flight fetch is abandoned.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("Fixture poller task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
