//! Per-switch collection loop.
//!
//! Each configured switch gets one [`Collector`] running in its own task. A
//! cycle fetches the switch's ports and, on success, replaces that switch's
//! entry in the [`SnapshotStore`]. A failed cycle is logged and leaves the
//! previous data in place; the next tick simply tries again.

use crate::config::SwitchConfig;
use crate::error::FetchError;
use crate::fetcher::StatsFetcher;
use crate::metrics::MetricsCollector;
use crate::store::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls one switch on a fixed interval
#[derive(Clone)]
pub struct Collector {
    switch: SwitchConfig,
    fetcher: Arc<dyn StatsFetcher>,
    store: SnapshotStore,
    interval: Duration,
    fetch_timeout: Duration,
    metrics: Option<MetricsCollector>,
}

impl Collector {
    pub fn new(
        switch: SwitchConfig,
        fetcher: Arc<dyn StatsFetcher>,
        store: SnapshotStore,
        interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            switch,
            fetcher,
            store,
            interval,
            fetch_timeout,
            metrics: None,
        }
    }

    /// Attach metrics
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn switch_name(&self) -> &str {
        &self.switch.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one collection cycle.
    ///
    /// Returns the number of ports installed. On error the store is not
    /// touched. Success and failure are both recorded in the metrics.
    pub async fn poll_once(&self) -> Result<usize, FetchError> {
        let _timer = self.metrics.as_ref().map(|m| m.start_poll_timer());

        let result = self.fetch().await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(count) => metrics.record_poll_success(&self.switch.name, *count),
                Err(e) => metrics.record_poll_failure(&self.switch.name, e.kind()),
            }
        }

        result
    }

    async fn fetch(&self) -> Result<usize, FetchError> {
        let ports = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&self.switch))
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))??;

        Ok(self.store.replace(&self.switch.name, ports))
    }

    /// Poll immediately, then every interval, until `shutdown` is cancelled.
    ///
    /// Cycles never overlap: a slow fetch delays the next tick instead of
    /// queueing a burst.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            switch = %self.switch.name,
            address = %self.switch.address,
            interval = ?self.interval,
            "Starting collector"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.poll_once() => result,
            };

            match result {
                Ok(count) => {
                    debug!(switch = %self.switch.name, ports = count, "Collected port statistics");
                }
                Err(e) => {
                    warn!(
                        switch = %self.switch.name,
                        address = %self.switch.address,
                        error = %e,
                        "Error collecting stats, keeping previous snapshot"
                    );
                }
            }
        }

        info!(switch = %self.switch.name, "Collector stopped");
    }
}
