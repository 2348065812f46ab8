//! Daemon assembly: shared store, metrics and one collector per switch.

use crate::collector::Collector;
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::fetcher::StatsFetcher;
use crate::metrics::MetricsCollector;
use crate::responder::Responder;
use crate::snmp::PortTableHandler;
use crate::store::SnapshotStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

pub struct Gateway {
    config: GatewayConfig,
    store: SnapshotStore,
    metrics: MetricsCollector,
    collectors: Vec<Collector>,
}

impl Gateway {
    /// Build the gateway. The store starts with an empty entry for every
    /// configured switch.
    pub fn new(config: GatewayConfig, fetcher: Arc<dyn StatsFetcher>) -> Result<Self> {
        let store = SnapshotStore::new(config.switches.iter().map(|s| s.name.clone()));
        let metrics = MetricsCollector::new()?;

        let collectors = config
            .switches
            .iter()
            .map(|switch| {
                Collector::new(
                    switch.clone(),
                    Arc::clone(&fetcher),
                    store.clone(),
                    config.poll_interval(),
                    config.fetch_timeout(),
                )
                .with_metrics(metrics.clone())
            })
            .collect();

        Ok(Self {
            config,
            store,
            metrics,
            collectors,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn responder(&self) -> Responder {
        Responder::new(self.store.clone())
    }

    /// Object table handler for the SNMP agent, counted in the gateway metrics
    pub fn snmp_handler(&self) -> PortTableHandler {
        PortTableHandler::new(self.responder()).with_metrics(self.metrics.clone())
    }

    /// Start one collection task per switch on `tracker`
    pub fn spawn_collectors(&self, tracker: &TaskTracker, shutdown: &CancellationToken) {
        for collector in &self.collectors {
            tracker.spawn(collector.clone().run(shutdown.clone()));
        }
        info!(switches = self.collectors.len(), "Collectors started");
    }

    /// Poll every switch once, concurrently. Returns the number of switches
    /// that failed.
    pub async fn poll_all_once(&self) -> usize {
        let tracker = TaskTracker::new();
        let mut handles = Vec::with_capacity(self.collectors.len());

        for collector in &self.collectors {
            let collector = collector.clone();
            handles.push(tracker.spawn(async move {
                let result = collector.poll_once().await;
                (collector.switch_name().to_string(), result)
            }));
        }
        tracker.close();

        let mut failures = 0;
        for handle in handles {
            match handle.await {
                Ok((_, Ok(_))) => {}
                Ok((switch, Err(e))) => {
                    warn!(switch = %switch, error = %e, "Error collecting stats");
                    failures += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Collection task failed");
                    failures += 1;
                }
            }
        }

        tracker.wait().await;
        failures
    }
}
