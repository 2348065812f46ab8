//! Snapshot store shared between collectors and the SNMP responder.
//!
//! The store maps switch name to that switch's current [`PortMap`]. Each map
//! is held behind an `Arc` and replaced as a whole, so:
//!
//! - a writer swaps one pointer under the write lock,
//! - a reader clones the outer map of pointers under the read lock and then
//!   enumerates without holding any lock.
//!
//! A reader therefore sees, for every switch, either the previous complete
//! port map or the new complete one.

use crate::model::PortMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Consistent point-in-time view of every switch's ports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    switches: BTreeMap<String, Arc<PortMap>>,
}

impl Snapshot {
    /// Iterate switches in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PortMap)> {
        self.switches
            .iter()
            .map(|(name, ports)| (name.as_str(), ports.as_ref()))
    }

    /// Ports of one switch
    pub fn ports(&self, switch: &str) -> Option<&PortMap> {
        self.switches.get(switch).map(Arc::as_ref)
    }

    /// Number of switches in the view
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    /// Total number of ports across all switches
    pub fn port_count(&self) -> usize {
        self.switches.values().map(|ports| ports.len()).sum()
    }
}

/// Shared, cheaply cloneable handle to the snapshot store
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<BTreeMap<String, Arc<PortMap>>>>,
}

impl SnapshotStore {
    /// Create a store with an empty entry for every given switch
    pub fn new<I, S>(switch_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let switches = switch_names
            .into_iter()
            .map(|name| (name.into(), Arc::new(PortMap::new())))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(switches)),
        }
    }

    /// Install `ports` as the current state of `switch`, replacing the
    /// previous map entirely. Returns the number of ports installed.
    pub fn replace(&self, switch: &str, ports: PortMap) -> usize {
        let count = ports.len();
        let ports = Arc::new(ports);

        let mut guard = self.inner.write();
        match guard.get_mut(switch) {
            Some(slot) => *slot = ports,
            None => {
                guard.insert(switch.to_string(), ports);
            }
        }

        count
    }

    /// Take a consistent view of all switches
    pub fn snapshot(&self) -> Snapshot {
        let switches = self.inner.read().clone();
        Snapshot { switches }
    }

    /// Names of all known switches
    pub fn switch_names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }
}
