//! Identity resolution pipeline.
//!
//! Tier 1 asks the provider's local account lookup about every identifier.
//! Tier 2 runs once directory catalogs are loaded and probes each domain's
//! group catalog for what tier 1 could not resolve. Anything left after both
//! tiers is reported, not dropped.

use crate::models::{IdentifierRecord, IdentityCatalogs, IdentityKind, LookupTier};
use crate::providers::{AccountKind, IdentityContext};
use std::collections::BTreeSet;

/// Outcome of the local lookup tier.
#[derive(Debug, Clone, Default)]
pub struct FirstPass {
    pub identified: Vec<IdentifierRecord>,
    pub unresolved: Vec<IdentifierRecord>,
}

/// Resolved identities split by kind, plus what neither tier could resolve.
#[derive(Debug, Clone, Default)]
pub struct ResolvedIdentities {
    pub users: Vec<IdentifierRecord>,
    pub groups: Vec<IdentifierRecord>,
    pub unresolved: Vec<IdentifierRecord>,
}

/// Tier 1. Needs no domain connection, so it runs before any are gathered.
/// A failing lookup marks its identifier unresolved and the batch carries on.
pub async fn first_pass(context: &IdentityContext, identifiers: &BTreeSet<String>) -> FirstPass {
    let provider = context.provider();
    let mut records = Vec::with_capacity(identifiers.len());

    for identifier in identifiers {
        let record = match provider.resolve_identifier(identifier).await {
            Ok(Some(account)) => IdentifierRecord {
                identifier: identifier.clone(),
                account_name: Some(account.account_name),
                full_name: None,
                domain: Some(account.domain),
                kind: match account.kind {
                    AccountKind::User => IdentityKind::User,
                    _ => IdentityKind::Group,
                },
                tier: LookupTier::Local,
            },
            Ok(None) => IdentifierRecord::unresolved(identifier.clone()),
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Identifier lookup failed");
                IdentifierRecord::unresolved(identifier.clone())
            }
        };
        records.push(record);
    }

    let pass = separate_unresolved(records);
    tracing::info!(
        identified = pass.identified.len(),
        unresolved = pass.unresolved.len(),
        "Resolved identifiers to accounts"
    );
    pass
}

pub fn separate_unresolved(records: Vec<IdentifierRecord>) -> FirstPass {
    let (identified, unresolved) = records.into_iter().partition(|r| r.is_resolved());
    FirstPass {
        identified,
        unresolved,
    }
}

impl FirstPass {
    /// Domains named by resolved accounts.
    pub fn observed_domains(&self) -> BTreeSet<String> {
        self.identified
            .iter()
            .filter_map(|r| r.domain.clone())
            .collect()
    }

    /// Tier 2, then split by kind. User records pick up their full name from
    /// their domain's catalog.
    pub fn complete(self, catalogs: &IdentityCatalogs) -> ResolvedIdentities {
        let (directory_groups, still_unresolved) = second_pass(self.unresolved, catalogs);

        let mut resolved = ResolvedIdentities {
            unresolved: still_unresolved,
            ..Default::default()
        };

        for mut record in self.identified.into_iter().chain(directory_groups) {
            match record.kind {
                IdentityKind::User => {
                    record.full_name = record
                        .domain
                        .as_deref()
                        .and_then(|d| catalogs.get(d))
                        .zip(record.account_name.as_deref())
                        .and_then(|(catalog, account)| catalog.user(account))
                        .map(|account| account.full_name.clone());
                    resolved.users.push(record);
                }
                IdentityKind::Group => resolved.groups.push(record),
                IdentityKind::Unresolved => resolved.unresolved.push(record),
            }
        }

        tracing::info!(
            users = resolved.users.len(),
            groups = resolved.groups.len(),
            unresolved = resolved.unresolved.len(),
            "Separated users and groups"
        );
        resolved
    }
}

/// Probe every domain's group catalog, in domain-name order. The first
/// domain that knows the identifier wins.
pub fn second_pass(
    unresolved: Vec<IdentifierRecord>,
    catalogs: &IdentityCatalogs,
) -> (Vec<IdentifierRecord>, Vec<IdentifierRecord>) {
    let mut resolved = Vec::new();
    let mut still_unresolved = Vec::new();

    for record in unresolved {
        let hit = catalogs.iter().find_map(|(domain, catalog)| {
            catalog
                .group_name(&record.identifier)
                .map(|name| (domain.clone(), name.to_string()))
        });

        match hit {
            Some((domain, name)) => resolved.push(IdentifierRecord {
                identifier: record.identifier,
                account_name: Some(name),
                full_name: None,
                domain: Some(domain),
                kind: IdentityKind::Group,
                tier: LookupTier::Directory,
            }),
            None => still_unresolved.push(record),
        }
    }

    tracing::info!(
        resolved = resolved.len(),
        still_unresolved = still_unresolved.len(),
        "Checked unresolved identifiers against directory groups"
    );
    (resolved, still_unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DomainAccount, DomainIdentityCatalog};
    use crate::providers::DirectorySnapshot;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn catalogs() -> IdentityCatalogs {
        IdentityCatalogs::from([
            (
                "ALPHA".to_string(),
                DomainIdentityCatalog::new(
                    vec![DomainAccount {
                        account_name: "jdoe".to_string(),
                        full_name: "Jane Doe".to_string(),
                        enabled: true,
                    }],
                    BTreeMap::from([("S-1-5-21-1-1-1-2201".to_string(), "Finance".to_string())]),
                ),
            ),
            (
                "BRAVO".to_string(),
                DomainIdentityCatalog::new(
                    vec![],
                    BTreeMap::from([
                        ("S-1-5-21-1-1-1-2201".to_string(), "Shadow Finance".to_string()),
                        ("S-1-5-21-2-2-2-3000".to_string(), "Ops".to_string()),
                    ]),
                ),
            ),
        ])
    }

    #[test]
    fn test_second_pass_first_domain_wins() {
        let (resolved, still) = second_pass(
            vec![
                IdentifierRecord::unresolved("S-1-5-21-1-1-1-2201"),
                IdentifierRecord::unresolved("S-1-5-21-2-2-2-3000"),
                IdentifierRecord::unresolved("S-1-5-21-9-9-9-9"),
            ],
            &catalogs(),
        );
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].domain.as_deref(), Some("ALPHA"));
        assert_eq!(resolved[0].account_name.as_deref(), Some("Finance"));
        assert_eq!(resolved[0].tier, LookupTier::Directory);
        assert_eq!(resolved[1].domain.as_deref(), Some("BRAVO"));
        assert_eq!(still.len(), 1);
        assert_eq!(still[0].identifier, "S-1-5-21-9-9-9-9");
    }

    #[test]
    fn test_complete_partitions_and_fills_full_names() {
        let pass = FirstPass {
            identified: vec![IdentifierRecord {
                identifier: "S-1-5-21-1-1-1-1105".to_string(),
                account_name: Some("jdoe".to_string()),
                full_name: None,
                domain: Some("ALPHA".to_string()),
                kind: IdentityKind::User,
                tier: LookupTier::Local,
            }],
            unresolved: vec![IdentifierRecord::unresolved("S-1-5-21-1-1-1-2201")],
        };
        assert_eq!(pass.observed_domains(), BTreeSet::from(["ALPHA".to_string()]));

        let resolved = pass.complete(&catalogs());
        assert_eq!(resolved.users.len(), 1);
        assert_eq!(resolved.users[0].full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(resolved.groups.len(), 1);
        assert!(resolved.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_first_pass_runs_without_connections() {
        let snapshot = DirectorySnapshot::new()
            .with_local_account("S-1-5-21-1-1-1-1105", "jdoe", "ALPHA", AccountKind::User)
            .with_local_account("S-1-5-21-1-1-1-2201", "Finance", "ALPHA", AccountKind::Group);
        let context = IdentityContext::local(Arc::new(snapshot));
        let ids = BTreeSet::from([
            "S-1-5-21-1-1-1-1105".to_string(),
            "S-1-5-21-1-1-1-2201".to_string(),
            "S-1-5-21-9-9-9-9".to_string(),
        ]);

        let pass = first_pass(&context, &ids).await;

        assert_eq!(pass.identified.len(), 2);
        assert_eq!(pass.identified[0].kind, IdentityKind::User);
        assert_eq!(pass.identified[1].kind, IdentityKind::Group);
        assert_eq!(pass.unresolved.len(), 1);
        assert_eq!(pass.unresolved[0].identifier, "S-1-5-21-9-9-9-9");
    }
}
