//! Permission synthesis: every original entry is kept, and an entry for the
//! paired target identifier is appended right after each source entry that
//! has a pairing, unless the path already grants to that target.

use crate::models::PathEntry;
use crate::services::pairing::PairingTable;
use migrate_core::workers::WorkerPool;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesizedExport {
    /// Output text with `\n` line breaks.
    pub text: String,
    pub path_count: usize,
    pub entries_in: usize,
    pub entries_out: usize,
}

impl SynthesizedExport {
    pub fn entries_added(&self) -> usize {
        self.entries_out - self.entries_in
    }

    fn merge(mut self, other: SynthesizedExport) -> Self {
        self.text.push_str(&other.text);
        self.path_count += other.path_count;
        self.entries_in += other.entries_in;
        self.entries_out += other.entries_out;
        self
    }
}

/// Augmented copy of one path's entries.
pub fn augment(path: &PathEntry, pairs: &PairingTable) -> PathEntry {
    let current = path.current_identifiers();
    let mut entries = Vec::with_capacity(path.entries.len());

    for entry in &path.entries {
        entries.push(entry.clone());

        let Some(target) = entry.domain_identifier().and_then(|id| pairs.get(id)) else {
            continue;
        };
        if current.contains(target) {
            continue;
        }
        if let Some(synthesized) = entry.with_identifier(target) {
            entries.push(synthesized);
        }
    }

    PathEntry {
        path: path.path.clone(),
        dacl_header: path.dacl_header.clone(),
        entries,
        audit_suffix: path.audit_suffix.clone(),
    }
}

pub fn synthesize_chunk(chunk: Vec<PathEntry>, pairs: &PairingTable) -> SynthesizedExport {
    let mut out = SynthesizedExport::default();
    for path in &chunk {
        let augmented = augment(path, pairs);
        out.path_count += 1;
        out.entries_in += path.entries.len();
        out.entries_out += augmented.entries.len();
        out.text.push_str(&augmented.render());
    }
    out
}

/// Synthesize every chunk on the pool and concatenate in chunk order.
pub fn synthesize(
    pool: &WorkerPool,
    chunks: Vec<Vec<PathEntry>>,
    pairs: &PairingTable,
) -> SynthesizedExport {
    let parts = pool.map_chunks(chunks, |chunk| synthesize_chunk(chunk, pairs));
    let export = parts
        .into_iter()
        .fold(SynthesizedExport::default(), SynthesizedExport::merge);

    tracing::info!(
        paths = export.path_count,
        entries_in = export.entries_in,
        entries_added = export.entries_added(),
        "Created new permission set"
    );
    export
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::parse_record;

    fn pairs() -> PairingTable {
        PairingTable::from_iter([("S-1-5-21-1-1-1-500", "S-1-5-21-2-2-2-777")])
    }

    #[test]
    fn test_augment_appends_after_source_entry() {
        let path = parse_record(
            "C:\\Data".to_string(),
            "D:(A;OI;FA;;;S-1-5-21-1-1-1-500)(A;;FA;;;SY)",
        );
        let out = augment(&path, &pairs());
        let entries: Vec<&str> = out.entries.iter().map(|e| e.as_str()).collect();
        assert_eq!(
            entries,
            vec![
                "(A;OI;FA;;;S-1-5-21-1-1-1-500)",
                "(A;OI;FA;;;S-1-5-21-2-2-2-777)",
                "(A;;FA;;;SY)",
            ]
        );
    }

    #[test]
    fn test_augment_skips_target_already_present() {
        let path = parse_record(
            "C:\\Data".to_string(),
            "D:(A;OI;FA;;;S-1-5-21-1-1-1-500)(A;;0x1200a9;;;S-1-5-21-2-2-2-777)",
        );
        let out = augment(&path, &pairs());
        assert_eq!(out, path);
    }

    #[test]
    fn test_each_source_entry_gets_its_own_augmentation() {
        let path = parse_record(
            "C:\\Data".to_string(),
            "D:(D;;WD;;;S-1-5-21-1-1-1-500)(A;;FA;;;S-1-5-21-1-1-1-500)",
        );
        let out = augment(&path, &pairs());
        assert_eq!(out.entries.len(), 4);
        assert_eq!(out.entries[1].as_str(), "(D;;WD;;;S-1-5-21-2-2-2-777)");
        assert_eq!(out.entries[3].as_str(), "(A;;FA;;;S-1-5-21-2-2-2-777)");
    }

    #[test]
    fn test_synthesize_counts_and_orders_output() {
        let pool = WorkerPool::new(2).unwrap();
        let chunks = vec![
            vec![parse_record("C:\\A".to_string(), "D:(A;;FA;;;S-1-5-21-1-1-1-500)")],
            vec![parse_record("C:\\B".to_string(), "D:(A;;FA;;;SY)S:(AU;SA;FA;;;WD)")],
        ];
        let out = synthesize(&pool, chunks, &pairs());
        pool.shutdown();

        assert_eq!(out.path_count, 2);
        assert_eq!(out.entries_in, 2);
        assert_eq!(out.entries_added(), 1);
        assert_eq!(
            out.text,
            "C:\\A\nD:(A;;FA;;;S-1-5-21-1-1-1-500)(A;;FA;;;S-1-5-21-2-2-2-777)\nC:\\B\nD:(A;;FA;;;SY)S:(AU;SA;FA;;;WD)\n"
        );
    }
}
