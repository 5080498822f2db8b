//! Parsed permission export records.

use std::collections::HashSet;

/// Prefix shared by every domain-relative identifier. Well-known and
/// machine-local identifiers do not carry it.
pub const DOMAIN_IDENTIFIER_PREFIX: &str = "S-1-5-21-";

const IDENTIFIER_DELIMITER: &str = ";;;";

pub fn is_domain_identifier(token: &str) -> bool {
    token.starts_with(DOMAIN_IDENTIFIER_PREFIX)
}

/// One parenthesized access-control entry, kept as the exact input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntry(String);

impl PermissionEntry {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token after the `;;;` delimiter, up to the closing parenthesis.
    pub fn identifier(&self) -> Option<&str> {
        let (_, tail) = self.0.split_once(IDENTIFIER_DELIMITER)?;
        tail.split(')').next()
    }

    /// The identifier, if it is domain-relative.
    pub fn domain_identifier(&self) -> Option<&str> {
        self.identifier().filter(|id| is_domain_identifier(id))
    }

    /// Copy of this entry with the identifier replaced. Flags, inheritance and
    /// rights are carried over unchanged.
    pub fn with_identifier(&self, identifier: &str) -> Option<PermissionEntry> {
        let (head, _) = self.0.split_once(IDENTIFIER_DELIMITER)?;
        Some(PermissionEntry(format!(
            "{}{}{})",
            head, IDENTIFIER_DELIMITER, identifier
        )))
    }
}

impl std::fmt::Display for PermissionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A path line and its parsed payload line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathEntry {
    pub path: String,
    /// Payload text ahead of the first entry, e.g. `D:PAI`.
    pub dacl_header: String,
    pub entries: Vec<PermissionEntry>,
    /// Trailing audit segment starting with `S:`, carried verbatim.
    pub audit_suffix: Option<String>,
}

impl PathEntry {
    /// Domain-relative identifiers already granted on this path.
    pub fn current_identifiers(&self) -> HashSet<&str> {
        self.entries
            .iter()
            .filter_map(PermissionEntry::domain_identifier)
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.path.len() + self.dacl_header.len() + self.entries.len() * 32 + 2,
        );
        out.push_str(&self.path);
        out.push('\n');
        out.push_str(&self.dacl_header);
        for entry in &self.entries {
            out.push_str(entry.as_str());
        }
        if let Some(audit) = &self.audit_suffix {
            out.push_str(audit);
        }
        out.push('\n');
        out
    }
}
