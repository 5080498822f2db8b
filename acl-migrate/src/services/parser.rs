//! Chunked parser: raw export lines into [`PathEntry`] records.
//!
//! Lines are paired (path, payload). Payloads are not validated; anything that
//! does not look like an entry still passes through as one.

use crate::models::{PathEntry, PermissionEntry};
use migrate_core::workers::WorkerPool;

/// Marks the start of the audit segment of a payload line.
pub const AUDIT_MARKER: &str = "S:";

/// Pair lines into (path, payload) records. An odd trailing line gets an
/// empty payload.
pub fn pair_lines(lines: Vec<String>) -> Vec<(String, String)> {
    let mut records = Vec::with_capacity(lines.len().div_ceil(2));
    let mut iter = lines.into_iter();
    while let Some(path) = iter.next() {
        let payload = iter.next().unwrap_or_default();
        records.push((path, payload));
    }
    records
}

pub fn parse_record(path: String, payload: &str) -> PathEntry {
    let (dacl, audit_suffix) = match payload.split_once(AUDIT_MARKER) {
        Some((dacl, audit)) => (dacl, Some(format!("{}{}", AUDIT_MARKER, audit))),
        None => (payload, None),
    };

    let mut pieces = dacl.split('(');
    let dacl_header = pieces.next().unwrap_or_default().to_string();
    let entries = pieces
        .map(|piece| PermissionEntry::new(format!("({}", piece)))
        .collect();

    PathEntry {
        path,
        dacl_header,
        entries,
        audit_suffix,
    }
}

pub fn parse_chunk(records: Vec<(String, String)>) -> Vec<PathEntry> {
    records
        .into_iter()
        .map(|(path, payload)| parse_record(path, &payload))
        .collect()
}

/// Parse every record on the pool, then re-chunk the concatenated result
/// for the next parallel stage. Record order is preserved.
pub fn parse_export(pool: &WorkerPool, lines: Vec<String>) -> Vec<Vec<PathEntry>> {
    let records = pair_lines(lines);
    let record_count = records.len();

    let parsed = pool.map_chunks(pool.chunk(records), parse_chunk);
    let entries: Vec<PathEntry> = parsed.into_iter().flatten().collect();

    let chunks = pool.chunk(entries);
    tracing::info!(
        paths = record_count,
        chunks = chunks.len(),
        workers = pool.workers(),
        "Parsed permission export"
    );
    chunks
}
