//! Prometheus metrics collection for switchsnmpd
//!
//! Tracks collector and SNMP agent activity and renders it in the Prometheus
//! text format for the optional `/metrics` endpoint.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics collector for switchsnmpd
#[derive(Clone)]
pub struct MetricsCollector {
    // Counters
    polls: IntCounterVec,
    poll_failures: IntCounterVec,
    snmp_requests: IntCounterVec,

    // Gauges
    ports: IntGaugeVec,

    // Histograms
    poll_duration_seconds: Histogram,

    registry: Arc<Registry>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let polls = IntCounterVec::new(
            Opts::new(
                "switchsnmpd_polls_total",
                "Successful collection cycles by switch",
            ),
            &["switch"],
        )?;
        registry.register(Box::new(polls.clone()))?;

        let poll_failures = IntCounterVec::new(
            Opts::new(
                "switchsnmpd_poll_failures_total",
                "Failed collection cycles by switch and error kind",
            ),
            &["switch", "kind"],
        )?;
        registry.register(Box::new(poll_failures.clone()))?;

        let snmp_requests = IntCounterVec::new(
            Opts::new(
                "switchsnmpd_snmp_requests_total",
                "SNMP object lookups by request type",
            ),
            &["pdu"],
        )?;
        registry.register(Box::new(snmp_requests.clone()))?;

        let ports = IntGaugeVec::new(
            Opts::new(
                "switchsnmpd_ports",
                "Ports in the current snapshot by switch",
            ),
            &["switch"],
        )?;
        registry.register(Box::new(ports.clone()))?;

        let poll_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "switchsnmpd_poll_duration_seconds",
                "Duration of one collection cycle in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(poll_duration_seconds.clone()))?;

        Ok(Self {
            polls,
            poll_failures,
            snmp_requests,
            ports,
            poll_duration_seconds,
            registry: Arc::new(registry),
        })
    }

    /// Record a successful cycle and the number of ports now published
    pub fn record_poll_success(&self, switch: &str, port_count: usize) {
        self.polls.with_label_values(&[switch]).inc();
        self.ports
            .with_label_values(&[switch])
            .set(i64::try_from(port_count).unwrap_or(i64::MAX));
    }

    /// Record a failed cycle
    pub fn record_poll_failure(&self, switch: &str, kind: &str) {
        self.poll_failures.with_label_values(&[switch, kind]).inc();
    }

    /// Start poll duration timer
    pub fn start_poll_timer(&self) -> prometheus::HistogramTimer {
        self.poll_duration_seconds.start_timer()
    }

    /// Record one object lookup (`get` or `getnext`)
    pub fn record_snmp_request(&self, pdu: &str) {
        self.snmp_requests.with_label_values(&[pdu]).inc();
    }

    /// Gather metrics in Prometheus text format
    pub fn gather_metrics(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buf = vec![];
        encoder.encode(&self.registry.gather(), &mut buf).ok();
        String::from_utf8(buf).unwrap_or_else(|_| String::from("# Error encoding metrics\n"))
    }
}
