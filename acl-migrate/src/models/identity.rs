//! Identity records produced by resolution and correlation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Resolution
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    User,
    Group,
    Unresolved,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Unresolved => "unresolved",
        }
    }
}

/// Which lookup produced a record: the local account lookup or a directory
/// group catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LookupTier {
    Local,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierRecord {
    pub identifier: String,
    pub account_name: Option<String>,
    pub full_name: Option<String>,
    pub domain: Option<String>,
    pub kind: IdentityKind,
    pub tier: LookupTier,
}

impl IdentifierRecord {
    pub fn unresolved(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            account_name: None,
            full_name: None,
            domain: None,
            kind: IdentityKind::Unresolved,
            tier: LookupTier::Local,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.kind != IdentityKind::Unresolved
    }

    pub fn in_domain(&self, domain: &str) -> bool {
        self.domain.as_deref() == Some(domain)
    }

    /// Name used for matching: full name when known, else account name.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.account_name.as_deref())
            .unwrap_or(&self.identifier)
    }
}

// ============================================================================
// Directory catalogs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DomainAccount {
    pub account_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Accounts and groups of one domain, read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainIdentityCatalog {
    /// Account name -> account.
    pub users: BTreeMap<String, DomainAccount>,
    /// Group identifier -> group name.
    pub groups: BTreeMap<String, String>,
}

impl DomainIdentityCatalog {
    pub fn new(accounts: Vec<DomainAccount>, groups: BTreeMap<String, String>) -> Self {
        let users = accounts
            .into_iter()
            .map(|a| (a.account_name.clone(), a))
            .collect();
        Self { users, groups }
    }

    pub fn user(&self, account_name: &str) -> Option<&DomainAccount> {
        self.users.get(account_name)
    }

    pub fn group_name(&self, identifier: &str) -> Option<&str> {
        self.groups.get(identifier).map(String::as_str)
    }
}

/// Catalogs of every known domain, keyed by domain name.
pub type IdentityCatalogs = BTreeMap<String, DomainIdentityCatalog>;

// ============================================================================
// Correlation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Containment,
    Substring,
    TokenOverlap,
    LeadingToken,
    Manual,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Containment => "containment",
            Self::Substring => "substring",
            Self::TokenOverlap => "token_overlap",
            Self::LeadingToken => "leading_token",
            Self::Manual => "manual",
        }
    }
}

/// A source identity accepted for a target-domain counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationRecord {
    pub source: IdentifierRecord,
    pub target_identifier: String,
    pub target_account_name: String,
    pub tier: MatchTier,
}
