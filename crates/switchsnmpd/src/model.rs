//! Port records as scraped from a switch, and the per-port fields exported
//! over SNMP.

use std::collections::BTreeMap;
use std::fmt;

/// Administrative state text meaning "enabled"
pub const STATE_ENABLED: &str = "Enable";

/// Link status text meaning "up"
pub const LINK_UP: &str = "Link Up";

/// Last-known state and packet counters of one switch port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub name: String,
    pub state: String,
    pub link_status: String,
    pub tx_good_pkt: u64,
    pub tx_bad_pkt: u64,
    pub rx_good_pkt: u64,
    pub rx_bad_pkt: u64,
}

/// Port name -> record, for one switch
pub type PortMap = BTreeMap<String, PortRecord>;

/// Build a [`PortMap`] from records, keyed by their names. Later duplicates win.
pub fn port_map(records: impl IntoIterator<Item = PortRecord>) -> PortMap {
    records
        .into_iter()
        .map(|record| (record.name.clone(), record))
        .collect()
}

/// The six values exported for every port, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortField {
    State,
    LinkStatus,
    TxGoodPkt,
    TxBadPkt,
    RxGoodPkt,
    RxBadPkt,
}

impl PortField {
    pub const ALL: [PortField; 6] = [
        PortField::State,
        PortField::LinkStatus,
        PortField::TxGoodPkt,
        PortField::TxBadPkt,
        PortField::RxGoodPkt,
        PortField::RxBadPkt,
    ];

    /// Name used as the last identifier segment
    pub fn as_str(&self) -> &'static str {
        match self {
            PortField::State => "state",
            PortField::LinkStatus => "linkStatus",
            PortField::TxGoodPkt => "txGoodPkt",
            PortField::TxBadPkt => "txBadPkt",
            PortField::RxGoodPkt => "rxGoodPkt",
            PortField::RxBadPkt => "rxBadPkt",
        }
    }

    /// Numeric sub-identifier of the field in the wire OID
    pub fn sub_id(&self) -> u32 {
        match self {
            PortField::State => 1,
            PortField::LinkStatus => 2,
            PortField::TxGoodPkt => 3,
            PortField::TxBadPkt => 4,
            PortField::RxGoodPkt => 5,
            PortField::RxBadPkt => 6,
        }
    }

    /// True for the 64-bit packet counters
    pub fn is_counter(&self) -> bool {
        !matches!(self, PortField::State | PortField::LinkStatus)
    }
}

impl fmt::Display for PortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1 for "Enable", 0 for anything else
pub fn state_to_int(state: &str) -> i32 {
    i32::from(state == STATE_ENABLED)
}

/// 1 for "Link Up", 0 for anything else
pub fn link_status_to_int(status: &str) -> i32 {
    i32::from(status == LINK_UP)
}
