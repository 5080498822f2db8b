//! Source identifier -> target identifier pairing table.

use crate::models::CorrelationRecord;
use migrate_core::error::AppError;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PairingTable(BTreeMap<String, String>);

impl PairingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pairing. Re-adding the same pair is a no-op; pairing one source
    /// with a second, different target is a conflict.
    pub fn insert(&mut self, source: &str, target: &str) -> Result<(), AppError> {
        match self.0.get(source) {
            Some(existing) if existing == target => Ok(()),
            Some(existing) => Err(AppError::PairingConflict {
                identifier: source.to_string(),
                first: existing.clone(),
                second: target.to_string(),
            }),
            None => {
                self.0.insert(source.to_string(), target.to_string());
                Ok(())
            }
        }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for PairingTable {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        )
    }
}

/// Merge accepted user and group correlations into one table.
pub fn build_pairing_table(
    users: &[CorrelationRecord],
    groups: &[CorrelationRecord],
) -> Result<PairingTable, AppError> {
    let mut table = PairingTable::new();
    for record in users.iter().chain(groups) {
        table.insert(&record.source.identifier, &record.target_identifier)?;
    }

    tracing::info!(pairs = table.len(), "Paired identifiers");
    Ok(table)
}
