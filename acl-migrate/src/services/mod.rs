pub mod correlation;
pub mod export_file;
pub mod extractor;
pub mod pairing;
pub mod parser;
pub mod report;
pub mod resolution;
pub mod synthesizer;

pub use correlation::{CorrelationEngine, CorrelationOutcome};
pub use export_file::{decode_export, encode_export, load_export, split_lines, write_export};
pub use extractor::extract_identifiers;
pub use pairing::{PairingTable, build_pairing_table};
pub use parser::parse_export;
pub use report::MigrationReport;
pub use resolution::{FirstPass, ResolvedIdentities, first_pass};
pub use synthesizer::{SynthesizedExport, synthesize};
