//! Integration tests for switchsnmpd
//!
//! Drives the collection and query path end to end with a scripted fetcher:
//! - collectors installing and replacing per-switch port maps
//! - responder output built from the shared store
//! - collectors running concurrently against slow switches
//! - SNMP GET and GETNEXT over UDP through the agent

use async_snmp::{Auth, Client, Value};
use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use switchsnmpd::oid::{gateway_root, port_field_oid};
use switchsnmpd::{
    port_map, FetchError, Gateway, GatewayConfig, ObjectValue, PortField, PortMap, PortRecord,
    SnapshotStore, SnmpAgent, StatsFetcher, SwitchConfig,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Test fixture: fetcher whose answer per switch can be changed between polls.
/// A switch with no entry fails with a parse error.
#[derive(Default)]
struct ScriptedFetcher {
    pages: Mutex<HashMap<String, PortMap>>,
}

impl ScriptedFetcher {
    fn set(&self, switch: &str, ports: Vec<PortRecord>) {
        self.pages.lock().insert(switch.to_string(), port_map(ports));
    }

    fn fail(&self, switch: &str) {
        self.pages.lock().remove(switch);
    }
}

#[async_trait]
impl StatsFetcher for ScriptedFetcher {
    async fn fetch(&self, switch: &SwitchConfig) -> Result<PortMap, FetchError> {
        self.pages
            .lock()
            .get(&switch.name)
            .cloned()
            .ok_or_else(|| FetchError::parse("switch unreachable"))
    }
}

fn port(name: &str, tx_good: u64, rx_good: u64) -> PortRecord {
    PortRecord {
        name: name.to_string(),
        state: "Enable".to_string(),
        link_status: "Link Up".to_string(),
        tx_good_pkt: tx_good,
        tx_bad_pkt: 0,
        rx_good_pkt: rx_good,
        rx_bad_pkt: 1,
    }
}

fn config(names: &[&str]) -> GatewayConfig {
    let mut yaml = String::from("snmp_port: 1161\nsnmp_community: public\nswitches:\n");
    for name in names {
        yaml.push_str(&format!(
            "  - name: {}\n    address: 127.0.0.1\n    username: admin\n    password: admin\n",
            name
        ));
    }
    let config = GatewayConfig::from_yaml(&yaml).unwrap();
    config.validate().unwrap();
    config
}

fn setup(names: &[&str]) -> (Gateway, Arc<ScriptedFetcher>) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let gateway = Gateway::new(config(names), fetcher.clone()).unwrap();
    (gateway, fetcher)
}

fn paths(gateway: &Gateway) -> Vec<String> {
    gateway
        .responder()
        .respond()
        .into_iter()
        .map(|o| o.path)
        .collect()
}

#[tokio::test]
async fn test_nothing_exported_before_first_poll() {
    let (gateway, _fetcher) = setup(&["sw1", "sw2"]);
    assert!(gateway.responder().respond().is_empty());
}

#[tokio::test]
async fn test_two_switches_one_port_each() {
    let (gateway, fetcher) = setup(&["sw1", "sw2"]);
    fetcher.set("sw1", vec![port("eth0", 100, 200)]);
    fetcher.set("sw2", vec![port("ge1", 5, 6)]);

    assert_eq!(gateway.poll_all_once().await, 0);

    let objects = gateway.responder().respond();
    assert_eq!(objects.len(), 12);
    assert_eq!(objects[0].path, ".1.3.6.1.4.1.12345.sw1.eth0.state");
    assert_eq!(objects[2].value, ObjectValue::Counter64(100));
    assert_eq!(objects[6].path, ".1.3.6.1.4.1.12345.sw2.ge1.state");
    assert_eq!(objects[10].value, ObjectValue::Counter64(6));
}

#[tokio::test]
async fn test_removed_port_disappears() {
    let (gateway, fetcher) = setup(&["sw1"]);
    fetcher.set("sw1", vec![port("p1", 1, 1), port("p2", 2, 2)]);
    gateway.poll_all_once().await;
    assert_eq!(gateway.responder().respond().len(), 12);

    fetcher.set("sw1", vec![port("p2", 3, 3)]);
    gateway.poll_all_once().await;

    let paths = paths(&gateway);
    assert_eq!(paths.len(), 6);
    assert!(paths.iter().all(|p| !p.contains(".p1.")));
}

#[tokio::test]
async fn test_failure_keeps_last_good_data() {
    let (gateway, fetcher) = setup(&["sw1", "sw2"]);
    fetcher.set("sw1", vec![port("eth0", 1, 1)]);
    fetcher.set("sw2", vec![port("eth0", 2, 2)]);
    gateway.poll_all_once().await;
    let before = gateway.responder().respond();

    fetcher.fail("sw1");
    fetcher.set("sw2", vec![port("eth0", 9, 9)]);
    assert_eq!(gateway.poll_all_once().await, 1);

    let after = gateway.responder().respond();
    assert_eq!(&after[..6], &before[..6]);
    assert_eq!(after[8].value, ObjectValue::Counter64(9));
}

#[tokio::test]
async fn test_identical_polls_are_idempotent() {
    let (gateway, fetcher) = setup(&["sw1"]);
    fetcher.set("sw1", vec![port("eth0", 1, 2), port("eth1", 3, 4)]);

    gateway.poll_all_once().await;
    let first = gateway.responder().respond();
    gateway.poll_all_once().await;
    assert_eq!(gateway.responder().respond(), first);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_mixed_port_maps() {
    let store = SnapshotStore::new(["sw1"]);
    let generation = |g: u64| port_map((0..8).map(|i| port(&format!("p{}", i), g, g)));
    store.replace("sw1", generation(0));

    let writer_store = store.clone();
    let writer = tokio::spawn(async move {
        for g in 1..=500u64 {
            writer_store.replace("sw1", generation(g % 2));
            tokio::task::yield_now().await;
        }
    });

    let mut readers = Vec::new();
    for _ in 0..3 {
        let store = store.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                let snapshot = store.snapshot();
                let ports = snapshot.ports("sw1").unwrap();
                assert_eq!(ports.len(), 8);
                let first = ports.values().next().unwrap().tx_good_pkt;
                assert!(ports.values().all(|p| p.tx_good_pkt == first));
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_collectors_run_until_cancelled() {
    let mut config = config(&["sw1"]);
    config.poll_interval_secs = 1;
    let fetcher = Arc::new(ScriptedFetcher::default());
    fetcher.set("sw1", vec![port("eth0", 7, 7)]);
    let gateway = Gateway::new(config, fetcher).unwrap();

    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    gateway.spawn_collectors(&tracker, &token);
    tracker.close();

    // First poll happens immediately
    tokio::time::timeout(Duration::from_secs(5), async {
        while gateway.responder().respond().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), tracker.wait())
        .await
        .unwrap();

    let metrics = gateway.metrics().gather_metrics();
    assert!(metrics.contains("switchsnmpd_ports{switch=\"sw1\"} 1"));
}

/// Fetcher that takes a while and serves a new generation on every call.
/// Each port of a switch carries the generation in its counters.
struct SlowGenerationFetcher {
    ports_per_switch: usize,
    calls: AtomicU64,
}

#[async_trait]
impl StatsFetcher for SlowGenerationFetcher {
    async fn fetch(&self, switch: &SwitchConfig) -> Result<PortMap, FetchError> {
        let generation = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        tokio::task::yield_now().await;
        Ok(port_map((0..self.ports_per_switch).map(|i| {
            port(&format!("{}-p{}", switch.name, i), generation, generation)
        })))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_collectors_keep_each_switch_whole() {
    const PORTS: usize = 4;

    let mut config = config(&["sw1", "sw2"]);
    config.poll_interval_secs = 1;
    let fetcher = Arc::new(SlowGenerationFetcher {
        ports_per_switch: PORTS,
        calls: AtomicU64::new(0),
    });
    let gateway = Gateway::new(config, fetcher.clone()).unwrap();

    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    gateway.spawn_collectors(&tracker, &token);
    tracker.close();

    // Extra cycles from poll_all_once race with the background collectors
    let mut seen = 0;
    while fetcher.calls.load(Ordering::SeqCst) < 40 {
        gateway.poll_all_once().await;

        let objects = gateway.responder().respond();
        if objects.is_empty() {
            continue;
        }
        seen += 1;

        for switch in ["sw1", "sw2"] {
            let prefix = format!(".1.3.6.1.4.1.12345.{}.", switch);
            let own: Vec<_> = objects.iter().filter(|o| o.path.starts_with(&prefix)).collect();
            assert_eq!(own.len(), 6 * PORTS, "incomplete object set for {}", switch);
            assert!(own
                .iter()
                .all(|o| o.path.starts_with(&format!("{}{}-p", prefix, switch))));

            // all ports of one switch come from the same fetch
            let tx_good: Vec<_> = own
                .iter()
                .filter(|o| o.path.ends_with(".txGoodPkt"))
                .map(|o| o.value)
                .collect();
            assert_eq!(tx_good.len(), PORTS);
            assert!(tx_good.iter().all(|v| *v == tx_good[0]));
        }
    }
    assert!(seen > 0);

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), tracker.wait())
        .await
        .unwrap();
}

/// Free UDP port on loopback
fn free_udp_addr() -> SocketAddr {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap()
}

fn wire_oid(switch: &str, port: &str, field: PortField) -> async_snmp::Oid {
    async_snmp::Oid::from_slice(port_field_oid(switch, port, field).arcs())
}

#[tokio::test]
async fn test_snmp_get_over_udp() {
    let (gateway, fetcher) = setup(&["sw1"]);
    fetcher.set("sw1", vec![port("eth0", 100, 200)]);
    gateway.poll_all_once().await;

    let addr = free_udp_addr();
    let agent = SnmpAgent::bind(addr, "public", gateway.snmp_handler())
        .await
        .unwrap();

    let token = CancellationToken::new();
    let server = tokio::spawn(agent.run(token.clone()));

    let client = Client::builder(addr.to_string(), Auth::v2c("public"))
        .timeout(Duration::from_secs(2))
        .connect()
        .await
        .unwrap();

    let tx = client
        .get(&wire_oid("sw1", "eth0", PortField::TxGoodPkt))
        .await
        .unwrap();
    assert!(matches!(tx.value, Value::Counter64(100)));

    let first = client
        .get_next(&async_snmp::Oid::from_slice(gateway_root().arcs()))
        .await
        .unwrap();
    assert_eq!(first.oid, wire_oid("sw1", "eth0", PortField::State));
    assert!(matches!(first.value, Value::Integer(1)));

    // Wrong community gets no answer at all
    let intruder = Client::builder(addr.to_string(), Auth::v2c("wrong"))
        .timeout(Duration::from_millis(300))
        .retries(0)
        .connect()
        .await
        .unwrap();
    assert!(intruder
        .get(&wire_oid("sw1", "eth0", PortField::State))
        .await
        .is_err());

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();

    let metrics = gateway.metrics().gather_metrics();
    assert!(metrics.contains("switchsnmpd_snmp_requests_total{pdu=\"get\"} 1"));
    assert!(metrics.contains("switchsnmpd_snmp_requests_total{pdu=\"getnext\"} 1"));
}
