//! Identity provider abstractions.
//!
//! The core never talks to an identity backend directly. Every lookup goes
//! through an [`IdentityProvider`], and directory lookups additionally carry
//! the [`DomainConnection`] for the domain they target, bundled in an
//! [`IdentityContext`] that is passed explicitly to each call site.

pub mod snapshot;

use crate::models::{DomainAccount, DomainIdentityCatalog, IdentityCatalogs};
use async_trait::async_trait;
use migrate_core::error::AppError;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub use snapshot::DirectorySnapshot;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::IdentityLookup(anyhow::Error::new(err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Group,
    Alias,
    WellKnownGroup,
    Computer,
}

/// Result of resolving an identifier in the local identity context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolvedAccount {
    pub account_name: String,
    pub domain: String,
    pub kind: AccountKind,
}

/// Where and as whom to reach a domain's directory.
#[derive(Debug, Clone)]
pub struct DomainConnection {
    pub domain: String,
    pub controller: String,
    pub username: String,
    pub password: SecretString,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve an identifier to an account using the local identity context.
    async fn resolve_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<ResolvedAccount>, ProviderError>;

    /// Resolve an account name in `domain` back to its identifier.
    async fn resolve_account_name(
        &self,
        domain: &str,
        account_name: &str,
    ) -> Result<Option<String>, ProviderError>;

    async fn enumerate_accounts(
        &self,
        connection: &DomainConnection,
    ) -> Result<Vec<DomainAccount>, ProviderError>;

    /// Group identifier -> group name.
    async fn enumerate_group_identifiers(
        &self,
        connection: &DomainConnection,
    ) -> Result<BTreeMap<String, String>, ProviderError>;
}

/// Provider plus the connection details of every known domain.
#[derive(Clone)]
pub struct IdentityContext {
    provider: Arc<dyn IdentityProvider>,
    connections: BTreeMap<String, DomainConnection>,
}

impl IdentityContext {
    pub fn new(provider: Arc<dyn IdentityProvider>, connections: Vec<DomainConnection>) -> Self {
        let connections = connections
            .into_iter()
            .map(|c| (c.domain.clone(), c))
            .collect();
        Self {
            provider,
            connections,
        }
    }

    /// Context for local lookups, before any domain is connected.
    pub fn local(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::new(provider, Vec::new())
    }

    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    /// Enumerate accounts and groups of every known domain. A domain whose
    /// enumeration fails gets an empty half and the rest carry on.
    pub async fn load_catalogs(&self) -> IdentityCatalogs {
        let mut catalogs = IdentityCatalogs::new();

        for (domain, connection) in &self.connections {
            let accounts = match self.provider.enumerate_accounts(connection).await {
                Ok(accounts) => accounts,
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "Failed to enumerate accounts");
                    Vec::new()
                }
            };

            let groups = match self.provider.enumerate_group_identifiers(connection).await {
                Ok(groups) => groups,
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "Failed to enumerate groups");
                    BTreeMap::new()
                }
            };

            tracing::info!(
                domain = %domain,
                controller = %connection.controller,
                users = accounts.len(),
                groups = groups.len(),
                "Loaded domain catalog"
            );

            catalogs.insert(domain.clone(), DomainIdentityCatalog::new(accounts, groups));
        }

        catalogs
    }

    /// Identifier of `account_name` in `domain`. Lookup failures are logged
    /// and reported as `None`.
    pub async fn account_identifier(&self, domain: &str, account_name: &str) -> Option<String> {
        match self.provider.resolve_account_name(domain, account_name).await {
            Ok(identifier) => identifier,
            Err(e) => {
                tracing::warn!(
                    domain = %domain,
                    account_name = %account_name,
                    error = %e,
                    "Failed to resolve account name"
                );
                None
            }
        }
    }
}
