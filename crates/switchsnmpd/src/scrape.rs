//! Port statistics page parser.
//!
//! The switch serves `port.cgi?page=stats` as an HTML table with one row per
//! port:
//!
//! | Port | State | Link Status | TxGoodPkt | TxBadPkt | RxGoodPkt | RxBadPkt |
//!
//! Firmware markup is loose (unclosed `<tr>`/`<td>`, `&nbsp;` padding), so
//! rows and cells are located by their opening tags rather than by a strict
//! HTML parse.

use crate::error::FetchError;
use crate::model::{PortMap, PortRecord};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

/// Minimum number of cells in a port row
const PORT_ROW_CELLS: usize = 7;

static ROW_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<tr\b[^>]*>"));
static ROW_CLOSE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)</tr\s*>"));
static CELL_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<t[dh]\b[^>]*>"));
static CELL_END: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)</t"));
static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<[^>]*>"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([a-zA-Z]+));"));

// Patterns are literals, checked by test_regexes_compile.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex must compile")
}

#[derive(Debug, PartialEq, Eq)]
enum Counter {
    Value(u64),
    Negative,
    NotNumber,
}

fn parse_counter(cell: &str) -> Counter {
    let digits: String = cell.chars().filter(|c| *c != ',').collect();

    if let Some(rest) = digits.strip_prefix('-') {
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            return Counter::Negative;
        }
        return Counter::NotNumber;
    }

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Counter::NotNumber;
    }

    digits
        .parse::<u64>()
        .map(Counter::Value)
        .unwrap_or(Counter::NotNumber)
}

/// Decode one entity; unknown names and invalid code points stay verbatim.
fn decode_entity(caps: &Captures<'_>) -> String {
    let code = if let Some(dec) = caps.get(1) {
        dec.as_str().parse::<u32>().ok()
    } else if let Some(hex) = caps.get(2) {
        u32::from_str_radix(hex.as_str(), 16).ok()
    } else {
        match caps.get(3).map(|m| m.as_str()) {
            Some("nbsp") => Some(0xa0),
            Some("lt") => Some(u32::from('<')),
            Some("gt") => Some(u32::from('>')),
            Some("quot") => Some(u32::from('"')),
            Some("apos") => Some(u32::from('\'')),
            Some("amp") => Some(u32::from('&')),
            _ => None,
        }
    };

    match code.and_then(char::from_u32) {
        // non-breaking space pads firmware cells
        Some('\u{a0}') => " ".to_string(),
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}

/// Strip tags, decode character references, collapse whitespace.
fn cell_text(raw: &str) -> String {
    let text = TAG.replace_all(raw, " ");
    let text = ENTITY.replace_all(&text, decode_entity);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn split_cells(row: &str) -> Vec<String> {
    CELL_OPEN
        .split(row)
        .skip(1)
        .map(|cell| {
            let end = CELL_END.find(cell).map_or(cell.len(), |m| m.start());
            cell_text(&cell[..end])
        })
        .collect()
}

fn split_rows(html: &str) -> impl Iterator<Item = &str> {
    ROW_OPEN.split(html).skip(1).map(|row| {
        let end = ROW_CLOSE.find(row).map_or(row.len(), |m| m.start());
        &row[..end]
    })
}

fn port_record(cells: &[String]) -> Result<Option<PortRecord>, FetchError> {
    let counters: Vec<Counter> = cells[3..PORT_ROW_CELLS]
        .iter()
        .map(|c| parse_counter(c))
        .collect();

    if counters.iter().all(|c| *c == Counter::NotNumber) {
        // header or layout row
        return Ok(None);
    }

    let values: Vec<u64> = counters
        .iter()
        .filter_map(|c| match c {
            Counter::Value(v) => Some(*v),
            _ => None,
        })
        .collect();

    if values.len() != counters.len() {
        return Err(FetchError::parse(format!(
            "invalid counters in row for port '{}': {:?}",
            cells[0],
            &cells[3..PORT_ROW_CELLS]
        )));
    }

    if cells[0].is_empty() {
        return Err(FetchError::parse("port row without a port name"));
    }

    Ok(Some(PortRecord {
        name: cells[0].clone(),
        state: cells[1].clone(),
        link_status: cells[2].clone(),
        tx_good_pkt: values[0],
        tx_bad_pkt: values[1],
        rx_good_pkt: values[2],
        rx_bad_pkt: values[3],
    }))
}

/// Parse the port statistics page into port records.
///
/// Fails when the page holds no port rows, or when a port row carries a
/// negative or non-numeric counter, so the store never sees partial or
/// negative data.
pub fn parse_port_stats(html: &str) -> Result<PortMap, FetchError> {
    let mut ports = PortMap::new();

    for row in split_rows(html) {
        let cells = split_cells(row);
        if cells.len() < PORT_ROW_CELLS {
            continue;
        }

        if let Some(record) = port_record(&cells)? {
            if ports.contains_key(&record.name) {
                debug!(port = %record.name, "Duplicate port row, keeping the last one");
            }
            ports.insert(record.name.clone(), record);
        }
    }

    if ports.is_empty() {
        return Err(FetchError::parse("no port statistics rows found"));
    }

    Ok(ports)
}
