//! migrate-core: Shared infrastructure for the ACL migration tooling.
pub mod config;
pub mod error;
pub mod observability;
pub mod workers;

pub use rayon;
pub use serde;
pub use tracing;
