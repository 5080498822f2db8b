//! ACL migration - re-points file-system permission exports from a template
//! domain to a target domain.

pub mod config;
pub mod decisions;
pub mod models;
pub mod providers;
pub mod services;
pub mod startup;
