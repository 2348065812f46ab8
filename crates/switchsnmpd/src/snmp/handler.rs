//! [`MibHandler`] over the responder's object table.
//!
//! Every lookup, whether GET, GETNEXT or the GETNEXT steps the agent runs
//! for GETBULK, reads one fresh [`Responder::respond`] table. A single varbind
//! is therefore always answered from one consistent snapshot.

use crate::metrics::MetricsCollector;
use crate::oid::BASE;
use crate::responder::{ObjectValue, ProtocolObject, Responder};
use async_snmp::{
    BoxFuture, GetNextResult, GetResult, MibHandler, Oid, RequestContext, Value, VarBind,
};

/// Root registered with the agent
pub fn subtree() -> Oid {
    Oid::from_slice(BASE)
}

fn wire_value(value: ObjectValue) -> Value {
    match value {
        ObjectValue::Integer(v) => Value::Integer(v),
        ObjectValue::Counter64(v) => Value::Counter64(v),
    }
}

/// Object table in OID order.
///
/// The responder orders by name; length-prefixed OIDs sort shorter names
/// first, so the table is re-sorted for GETNEXT.
fn wire_table(objects: Vec<ProtocolObject>) -> Vec<(Oid, Value)> {
    let mut table: Vec<(Oid, Value)> = objects
        .into_iter()
        .map(|o| (Oid::from_slice(o.oid.arcs()), wire_value(o.value)))
        .collect();
    table.sort_by(|a, b| a.0.cmp(&b.0));
    table
}

/// Serves `.1.3.6.1.4.1.12345` from the shared store
#[derive(Clone)]
pub struct PortTableHandler {
    responder: Responder,
    metrics: Option<MetricsCollector>,
}

impl PortTableHandler {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            metrics: None,
        }
    }

    /// Attach metrics
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn count(&self, pdu: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_snmp_request(pdu);
        }
    }

    /// Exact-match lookup
    pub fn lookup(&self, oid: &Oid) -> GetResult {
        self.count("get");
        let table = wire_table(self.responder.respond());
        match table.binary_search_by(|(candidate, _)| candidate.cmp(oid)) {
            Ok(index) => GetResult::Value(table[index].1.clone()),
            Err(_) => GetResult::NoSuchObject,
        }
    }

    /// First object strictly after `oid`
    pub fn lookup_next(&self, oid: &Oid) -> GetNextResult {
        self.count("getnext");
        let table = wire_table(self.responder.respond());
        let index = table.partition_point(|(candidate, _)| candidate <= oid);
        match table.into_iter().nth(index) {
            Some((next, value)) => GetNextResult::Value(VarBind::new(next, value)),
            None => GetNextResult::EndOfMibView,
        }
    }
}

impl MibHandler for PortTableHandler {
    fn get<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetResult> {
        Box::pin(async move { self.lookup(oid) })
    }

    fn get_next<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        oid: &'a Oid,
    ) -> BoxFuture<'a, GetNextResult> {
        Box::pin(async move { self.lookup_next(oid) })
    }
}
