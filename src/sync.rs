use crate::config::Config;
use crate::providers::efa::{EfaClient, EfaError};
use crate::services::{DepartureParser, RefreshOutcome, StopMonitor, TimeNormalizer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Monitors keyed by stop id
pub type MonitorStore = Arc<HashMap<String, Arc<StopMonitor>>>;

/// Polls every configured stop on its own interval
pub struct SyncManager {
    efa_client: EfaClient,
    monitors: MonitorStore,
}

impl SyncManager {
    pub fn new(config: &Config) -> Result<Self, SyncError> {
        let efa_client = EfaClient::from_config(config)?;
        let normalizer = TimeNormalizer::with_offset_hours(config.utc_offset_hours)
            .ok_or(SyncError::InvalidOffset(config.utc_offset_hours))?;
        let parser = DepartureParser::new(normalizer);

        let monitors = config
            .stops
            .iter()
            .map(|stop| {
                let monitor = StopMonitor::new(stop.clone(), efa_client.clone(), parser);
                (stop.stop_id.clone(), Arc::new(monitor))
            })
            .collect();

        Ok(Self {
            efa_client,
            monitors: Arc::new(monitors),
        })
    }

    pub fn efa_client(&self) -> EfaClient {
        self.efa_client.clone()
    }

    /// Get a reference to the monitors for API access
    pub fn monitor_store(&self) -> MonitorStore {
        self.monitors.clone()
    }

    /// Refresh all stops once, concurrently
    pub async fn refresh_all(&self) {
        let results = futures::future::join_all(
            self.monitors.values().map(|monitor| monitor.refresh()),
        )
        .await;

        let updated = results
            .iter()
            .filter(|r| matches!(r, RefreshOutcome::Updated(_)))
            .count();

        info!(
            stops = results.len(),
            updated,
            unchanged = results.len() - updated,
            "Completed departure sync"
        );
    }

    /// Start the background polling loops
    pub async fn start(self: Arc<Self>) {
        info!(stops = self.monitors.len(), "Starting sync manager");

        // Initial sync on startup
        self.refresh_all().await;

        let handles: Vec<_> = self
            .monitors
            .values()
            .cloned()
            .map(|monitor| {
                let stop_id = monitor.stop_id().to_string();
                let period = Duration::from_secs(monitor.stop().poll_interval_secs);
                let handle = tokio::spawn(async move {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    // Skip the first tick which fires immediately (we already synced above)
                    interval.tick().await;

                    loop {
                        interval.tick().await;
                        monitor.refresh().await;
                    }
                });
                (stop_id, handle)
            })
            .collect();

        // The loops only end by panicking
        let (stop_ids, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = futures::future::join_all(handles).await;
        log_stopped_loops(&stop_ids, results);
    }
}

fn log_stopped_loops(stop_ids: &[String], results: Vec<Result<(), tokio::task::JoinError>>) {
    for (stop_id, result) in stop_ids.iter().zip(results) {
        if let Err(e) = result {
            error!(
                stop_id = %stop_id,
                error = %e,
                "Polling loop stopped, stop no longer refreshes"
            );
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("EFA client error: {0}")]
    EfaError(String),
    #[error("Invalid UTC offset: {0}h")]
    InvalidOffset(i32),
}

impl From<EfaError> for SyncError {
    fn from(e: EfaError) -> Self {
        SyncError::EfaError(e.to_string())
    }
}
