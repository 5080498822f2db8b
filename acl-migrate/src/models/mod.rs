//! Domain models for acl-migrate.

pub mod export;
pub mod identity;

pub use export::{DOMAIN_IDENTIFIER_PREFIX, PathEntry, PermissionEntry, is_domain_identifier};
pub use identity::{
    CorrelationRecord, DomainAccount, DomainIdentityCatalog, IdentifierRecord, IdentityCatalogs,
    IdentityKind, LookupTier, MatchTier,
};
