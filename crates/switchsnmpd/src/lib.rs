//! Switch Statistics SNMP Gateway
//!
//! Periodically logs in to the web management interface of each configured
//! switch, scrapes its port statistics page, keeps the latest per-port state
//! in memory and serves it read-only over SNMP v2c.

pub mod collector;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod metrics;
pub mod metrics_server;
pub mod model;
pub mod oid;
pub mod responder;
pub mod scrape;
pub mod snmp;
pub mod store;

pub use collector::Collector;
pub use config::{GatewayConfig, SwitchConfig, DEFAULT_CONFIG_PATH};
pub use error::*;
pub use fetcher::{HttpStatsFetcher, StatsFetcher};
pub use gateway::Gateway;
pub use metrics::MetricsCollector;
pub use metrics_server::MetricsServer;
pub use model::{port_map, PortField, PortMap, PortRecord};
pub use oid::Oid;
pub use responder::{ObjectValue, ProtocolObject, Responder};
pub use scrape::parse_port_stats;
pub use snmp::{PortTableHandler, SnmpAgent};
pub use store::{Snapshot, SnapshotStore};
