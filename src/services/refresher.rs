//! Refresh orchestration: periodic fan-out over all configured endpoints
//!
//! One pass runs at a time. Results publish wholesale through a watch
//! channel, so observers see either the previous complete pass or the new
//! one, never a partially-updated one. A pass never fails as a whole;
//! per-endpoint failures land in the endpoint's own snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, EndpointConfig};
use crate::types::{RefreshResult, RefreshState, UsageSnapshot};

use super::stats_client::StatsClient;

/// Time between automatic refresh passes
const REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Run one refresh pass over `endpoints`.
///
/// Endpoints fetch concurrently and fail independently; snapshot order
/// matches the input order regardless of completion order.
pub async fn refresh_pass(client: &StatsClient, endpoints: &[EndpointConfig]) -> RefreshResult {
    let fetches = endpoints.iter().map(|endpoint| async move {
        match client.fetch_combined(endpoint).await {
            Ok(combined) => UsageSnapshot::success(endpoint, combined),
            Err(err) => {
                warn!(endpoint = %endpoint.name, error = %err, "fetch cycle failed");
                UsageSnapshot::failure(endpoint, err.to_string())
            }
        }
    });

    RefreshResult {
        snapshots: join_all(fetches).await,
        completed_at: Utc::now(),
    }
}

/// Handle for requesting an out-of-band refresh pass.
///
/// Requests arriving while a pass is in flight collapse into at most one
/// follow-up pass.
#[derive(Clone)]
pub struct RefreshTrigger(mpsc::Sender<()>);

impl RefreshTrigger {
    pub fn request(&self) {
        // A full channel means a pass is already queued; nothing to do
        let _ = self.0.try_send(());
    }
}

/// Owns the refresh timer and publishes [`RefreshState`].
///
/// Collaborators are injected: the store supplies the endpoint list (read
/// once per pass), the client performs the fetch cycles.
pub struct Refresher {
    client: StatsClient,
    store: Arc<ConfigStore>,
    interval: Duration,
    state_tx: watch::Sender<RefreshState>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: mpsc::Receiver<()>,
}

impl Refresher {
    pub fn new(client: StatsClient, store: Arc<ConfigStore>) -> Self {
        Self::with_interval(client, store, REFRESH_INTERVAL)
    }

    pub fn with_interval(client: StatsClient, store: Arc<ConfigStore>, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(RefreshState::default());
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            client,
            store,
            interval,
            state_tx,
            trigger_tx,
            trigger_rx,
        }
    }

    /// Observable refresh state (replace-only)
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.state_tx.subscribe()
    }

    /// Manual-refresh handle for the presentation layer
    pub fn trigger(&self) -> RefreshTrigger {
        RefreshTrigger(self.trigger_tx.clone())
    }

    /// Drive the orchestrator: an immediate first pass, then one per
    /// interval tick, with config changes and manual triggers serviced out
    /// of band. Out-of-band passes do not reset the tick schedule. Runs
    /// until the owning task is dropped.
    pub async fn run(self) {
        let Refresher {
            client,
            store,
            interval,
            state_tx,
            trigger_tx,
            mut trigger_rx,
        } = self;
        // Hold a sender so the trigger arm stays open even when every
        // external handle is dropped
        let _trigger_tx = trigger_tx;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut config_rx = store.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("scheduled refresh");
                    run_pass(&client, &store, &state_tx).await;
                }
                changed = config_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    info!("endpoint config changed, refreshing");
                    run_pass(&client, &store, &state_tx).await;
                }
                received = trigger_rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                    debug!("manual refresh");
                    run_pass(&client, &store, &state_tx).await;
                }
            }
        }
    }
}

async fn run_pass(client: &StatsClient, store: &ConfigStore, state: &watch::Sender<RefreshState>) {
    // The list is a snapshot for the whole pass; edits made mid-pass take
    // effect on the next one
    let endpoints = store.endpoints();

    if endpoints.is_empty() {
        state.send_modify(|s| {
            s.result = Some(RefreshResult {
                snapshots: Vec::new(),
                completed_at: Utc::now(),
            });
            s.refreshing = false;
        });
        return;
    }

    state.send_modify(|s| s.refreshing = true);
    let result = refresh_pass(client, &endpoints).await;
    let failures = result.snapshots.iter().filter(|s| s.error.is_some()).count();
    debug!(
        endpoints = result.snapshots.len(),
        failures, "refresh pass complete"
    );
    state.send_modify(|s| {
        s.result = Some(result);
        s.refreshing = false;
    });
}
