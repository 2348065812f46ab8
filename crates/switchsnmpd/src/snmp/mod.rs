//! Read-only SNMP v2c agent serving the port table.
//!
//! Protocol handling (BER, community checks, GETBULK, SET refusal, size
//! limits) is done by `async-snmp`; this module only maps the object table
//! onto its [`async_snmp::MibHandler`] interface.

pub mod agent;
pub mod handler;

pub use agent::SnmpAgent;
pub use handler::PortTableHandler;
