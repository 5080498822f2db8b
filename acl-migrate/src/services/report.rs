//! Machine-readable summary of a migration run.

use crate::models::{CorrelationRecord, IdentifierRecord};
use crate::services::pairing::PairingTable;
use chrono::{DateTime, Utc};
use migrate_core::error::AppError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub generated_utc: DateTime<Utc>,
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub template_domain: String,
    pub target_domain: String,
    pub path_count: usize,
    pub entries_in: usize,
    pub entries_added: usize,
    pub identifiers_found: usize,
    pub unresolved: Vec<IdentifierRecord>,
    pub skipped_disabled: Vec<IdentifierRecord>,
    pub matched_users: Vec<CorrelationRecord>,
    pub matched_groups: Vec<CorrelationRecord>,
    pub unmatched_users: Vec<IdentifierRecord>,
    pub unmatched_groups: Vec<IdentifierRecord>,
    pub pairings: PairingTable,
}

impl MigrationReport {
    pub fn new(run_id: Uuid, input_path: &Path) -> Self {
        Self {
            run_id,
            generated_utc: Utc::now(),
            input_path: input_path.to_path_buf(),
            output_path: None,
            template_domain: String::new(),
            target_domain: String::new(),
            path_count: 0,
            entries_in: 0,
            entries_added: 0,
            identifiers_found: 0,
            unresolved: Vec::new(),
            skipped_disabled: Vec::new(),
            matched_users: Vec::new(),
            matched_groups: Vec::new(),
            unmatched_users: Vec::new(),
            unmatched_groups: Vec::new(),
            pairings: PairingTable::new(),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            template_domain = %self.template_domain,
            target_domain = %self.target_domain,
            paths = self.path_count,
            entries_added = self.entries_added,
            pairs = self.pairings.len(),
            unresolved = self.unresolved.len(),
            unmatched_users = self.unmatched_users.len(),
            unmatched_groups = self.unmatched_groups.len(),
            "Migration complete"
        );
    }

    pub async fn write_json(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;
        tokio::fs::write(path, json).await?;
        tracing::info!(path = %path.display(), "Wrote migration report");
        Ok(())
    }
}
