//! Translation of the snapshot store into SNMP-addressable objects.
//!
//! [`Responder::respond`] yields the complete object table: six objects per
//! port of every switch, built from one consistent snapshot. The SNMP
//! handler resolves individual OIDs against it.

use crate::model::{link_status_to_int, state_to_int, PortField, PortRecord};
use crate::oid::{port_field_oid, port_field_path, Oid};
use crate::store::{Snapshot, SnapshotStore};
use std::fmt;

/// Typed value of an exported object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectValue {
    /// SNMP INTEGER (state, link status)
    Integer(i32),
    /// SNMP Counter64 (packet counters)
    Counter64(u64),
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectValue::Integer(v) => write!(f, "INTEGER: {}", v),
            ObjectValue::Counter64(v) => write!(f, "Counter64: {}", v),
        }
    }
}

/// One addressable value in a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolObject {
    /// `<base>.<switch>.<port>.<field>`
    pub path: String,
    /// Numeric wire identifier
    pub oid: Oid,
    pub value: ObjectValue,
}

/// Value of `field` for `port`
pub fn field_value(port: &PortRecord, field: PortField) -> ObjectValue {
    match field {
        PortField::State => ObjectValue::Integer(state_to_int(&port.state)),
        PortField::LinkStatus => ObjectValue::Integer(link_status_to_int(&port.link_status)),
        PortField::TxGoodPkt => ObjectValue::Counter64(port.tx_good_pkt),
        PortField::TxBadPkt => ObjectValue::Counter64(port.tx_bad_pkt),
        PortField::RxGoodPkt => ObjectValue::Counter64(port.rx_good_pkt),
        PortField::RxBadPkt => ObjectValue::Counter64(port.rx_bad_pkt),
    }
}

/// Flatten a snapshot into protocol objects, switch by switch, port by port,
/// in [`PortField::ALL`] order.
pub fn objects_from_snapshot(snapshot: &Snapshot) -> Vec<ProtocolObject> {
    let mut objects = Vec::with_capacity(snapshot.port_count() * PortField::ALL.len());

    for (switch, ports) in snapshot.iter() {
        for (port_name, port) in ports {
            for field in PortField::ALL {
                objects.push(ProtocolObject {
                    path: port_field_path(switch, port_name, field),
                    oid: port_field_oid(switch, port_name, field),
                    value: field_value(port, field),
                });
            }
        }
    }

    objects
}

/// Answers queries from the shared store
#[derive(Debug, Clone)]
pub struct Responder {
    store: SnapshotStore,
}

impl Responder {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    /// Full object table as of now. Never fails; an empty store yields an
    /// empty list.
    pub fn respond(&self) -> Vec<ProtocolObject> {
        let snapshot = self.store.snapshot();
        objects_from_snapshot(&snapshot)
    }
}
