//! Identity provider backed by a directory snapshot document.
//!
//! The snapshot records what the local identity context can resolve
//! (`local_accounts`) and what each domain's directory enumerates
//! (`domains`):
//!
//! ```json
//! {
//!   "local_accounts": {
//!     "S-1-5-21-1-1-1-1105": { "account_name": "jdoe", "domain": "OLDCORP", "kind": "user" }
//!   },
//!   "domains": {
//!     "OLDCORP": {
//!       "users": [
//!         { "account_name": "jdoe", "full_name": "Jane Doe", "enabled": true,
//!           "identifier": "S-1-5-21-1-1-1-1105" }
//!       ],
//!       "groups": { "S-1-5-21-1-1-1-2201": "Finance" }
//!     }
//!   }
//! }
//! ```

use super::{AccountKind, DomainConnection, IdentityProvider, ProviderError, ResolvedAccount};
use crate::models::DomainAccount;
use async_trait::async_trait;
use migrate_core::error::AppError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    local_accounts: BTreeMap<String, ResolvedAccount>,
    #[serde(default)]
    domains: BTreeMap<String, SnapshotDomain>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SnapshotDomain {
    #[serde(default)]
    users: Vec<SnapshotUser>,
    #[serde(default)]
    groups: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotUser {
    #[serde(flatten)]
    account: DomainAccount,
    #[serde(default)]
    identifier: Option<String>,
}

impl DirectorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid directory snapshot: {}", e))
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to read directory snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Make `identifier` resolvable through the local account lookup.
    pub fn with_local_account(
        mut self,
        identifier: &str,
        account_name: &str,
        domain: &str,
        kind: AccountKind,
    ) -> Self {
        self.local_accounts.insert(
            identifier.to_string(),
            ResolvedAccount {
                account_name: account_name.to_string(),
                domain: domain.to_string(),
                kind,
            },
        );
        self
    }

    pub fn with_user(
        mut self,
        domain: &str,
        account: DomainAccount,
        identifier: Option<&str>,
    ) -> Self {
        self.domains
            .entry(domain.to_string())
            .or_default()
            .users
            .push(SnapshotUser {
                account,
                identifier: identifier.map(str::to_string),
            });
        self
    }

    pub fn with_group(mut self, domain: &str, identifier: &str, name: &str) -> Self {
        self.domains
            .entry(domain.to_string())
            .or_default()
            .groups
            .insert(identifier.to_string(), name.to_string());
        self
    }

    fn domain(&self, domain: &str) -> Result<&SnapshotDomain, ProviderError> {
        self.domains
            .get(domain)
            .ok_or_else(|| ProviderError::UnknownDomain(domain.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for DirectorySnapshot {
    async fn resolve_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<ResolvedAccount>, ProviderError> {
        Ok(self.local_accounts.get(identifier).cloned())
    }

    async fn resolve_account_name(
        &self,
        domain: &str,
        account_name: &str,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self
            .domain(domain)?
            .users
            .iter()
            .find(|u| u.account.account_name.eq_ignore_ascii_case(account_name))
            .and_then(|u| u.identifier.clone()))
    }

    async fn enumerate_accounts(
        &self,
        connection: &DomainConnection,
    ) -> Result<Vec<DomainAccount>, ProviderError> {
        Ok(self
            .domain(&connection.domain)?
            .users
            .iter()
            .map(|u| u.account.clone())
            .collect())
    }

    async fn enumerate_group_identifiers(
        &self,
        connection: &DomainConnection,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        Ok(self.domain(&connection.domain)?.groups.clone())
    }
}
