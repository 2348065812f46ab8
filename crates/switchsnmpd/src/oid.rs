//! Object identifiers for exported port values.
//!
//! Every value has two names:
//!
//! - a textual path `.1.3.6.1.4.1.12345.<switch>.<port>.<field>` used in
//!   logs and in `--once` output,
//! - a numeric wire OID
//!   `.1.3.6.1.4.1.12345.<len>.<switch bytes>.<len>.<port bytes>.<field id>`.
//!
//! Names are length-prefixed the way SNMP encodes string table indices, so
//! the numeric form is unambiguous whatever characters a port name holds.

use crate::model::PortField;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Enterprise base: .1.3.6.1.4.1.12345
pub const BASE: &[u32] = &[1, 3, 6, 1, 4, 1, 12345];

/// Textual form of [`BASE`]
pub const BASE_PATH: &str = ".1.3.6.1.4.1.12345";

/// Numeric object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid(pub Vec<u32>);

impl Oid {
    pub fn from_slice(arcs: &[u32]) -> Self {
        Oid(arcs.to_vec())
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }

    fn push_name(&mut self, name: &str) {
        self.0.push(name.len() as u32);
        self.0.extend(name.bytes().map(u32::from));
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arc in &self.0 {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err("empty OID".to_string());
        }
        trimmed
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| format!("invalid OID arc '{}' in '{}'", part, s))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
    }
}

/// Root of the exported subtree
pub fn gateway_root() -> Oid {
    Oid::from_slice(BASE)
}

/// Wire OID of one port field
pub fn port_field_oid(switch: &str, port: &str, field: PortField) -> Oid {
    let mut oid = gateway_root();
    oid.push_name(switch);
    oid.push_name(port);
    oid.0.push(field.sub_id());
    oid
}

/// Textual path of one port field
pub fn port_field_path(switch: &str, port: &str, field: PortField) -> String {
    format!("{}.{}.{}.{}", BASE_PATH, switch, port, field.as_str())
}
