//! Identifier extraction over parsed chunks.

use crate::models::PathEntry;
use migrate_core::workers::WorkerPool;
use std::collections::{BTreeSet, HashSet};

/// Unique domain-relative identifiers referenced in one chunk.
pub fn extract_chunk(chunk: Vec<PathEntry>) -> HashSet<String> {
    chunk
        .iter()
        .flat_map(|path| path.entries.iter())
        .filter_map(|entry| entry.domain_identifier())
        .map(str::to_string)
        .collect()
}

/// Union of every chunk's identifiers. Each worker gets its own copy of its
/// chunk, so the parsed export stays available for synthesis.
pub fn extract_identifiers(pool: &WorkerPool, chunks: &[Vec<PathEntry>]) -> BTreeSet<String> {
    let per_chunk = pool.map_chunks(chunks.to_vec(), extract_chunk);
    let identifiers: BTreeSet<String> = per_chunk.into_iter().flatten().collect();

    tracing::info!(identifiers = identifiers.len(), "Found unique identifiers");
    identifiers
}
