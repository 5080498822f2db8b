//! Common test utilities for acl-migrate integration tests.

#![allow(dead_code)]

use acl_migrate::config::{
    DirectoryConfig, LineEnding, MatchingConfig, MigrateConfig, OutputConfig,
};
use acl_migrate::decisions::{Answer, ScriptedResolver};
use acl_migrate::models::DomainAccount;
use acl_migrate::providers::{AccountKind, DirectorySnapshot};
use acl_migrate::services::encode_export;
use acl_migrate::startup::Application;
use migrate_core::config::Config as CommonConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT: Once = Once::new();

pub const OLD: &str = "OLDCORP";
pub const NEW: &str = "NEWCORP";

pub const JDOE_OLD: &str = "S-1-5-21-1-1-1-500";
pub const JDOE_NEW: &str = "S-1-5-21-2-2-2-777";
pub const FINANCE_OLD: &str = "S-1-5-21-1-1-1-2201";
pub const FINANCE_NEW: &str = "S-1-5-21-2-2-2-3301";
pub const ORPHAN: &str = "S-1-5-21-1-1-1-9999";

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,acl_migrate=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_config(report_path: Option<PathBuf>) -> MigrateConfig {
    MigrateConfig {
        common: CommonConfig {
            worker_count: Some(3),
            ..Default::default()
        },
        service_name: "acl-migrate-test".to_string(),
        log_level: "debug".to_string(),
        directory: DirectoryConfig {
            snapshot_path: PathBuf::new(), // Unused: tests inject the provider
        },
        matching: MatchingConfig::default(),
        output: OutputConfig {
            line_ending: LineEnding::CrLf,
            report_path,
        },
    }
}

pub fn account(name: &str, full: &str) -> DomainAccount {
    DomainAccount {
        account_name: name.to_string(),
        full_name: full.to_string(),
        enabled: true,
    }
}

/// Jane Doe and the Finance group in both domains. Finance is only known to
/// the directory, so it resolves in the second lookup tier.
pub fn snapshot() -> DirectorySnapshot {
    DirectorySnapshot::new()
        .with_local_account(JDOE_OLD, "jdoe", OLD, AccountKind::User)
        .with_user(OLD, account("jdoe", "Jane Doe"), Some(JDOE_OLD))
        .with_group(OLD, FINANCE_OLD, "Finance")
        .with_user(NEW, account("jane.doe", "Jane Doe"), Some(JDOE_NEW))
        .with_group(NEW, FINANCE_NEW, "Finance")
}

pub const EXPORT: &str = "C:\\Data\n\
D:PAI(A;OI;FA;;;S-1-5-21-1-1-1-500)(A;;FA;;;SY)\n\
C:\\Data\\Finance\n\
D:(A;OICI;0x1301bf;;;S-1-5-21-1-1-1-2201)S:AI(AU;SA;FA;;;WD)\n\
C:\\Public\n\
D:(A;;FA;;;BA)(A;;0x1200a9;;;S-1-5-21-1-1-1-9999)\n";

/// Temporary working area holding one input export.
pub struct Workspace {
    pub dir: TempDir,
    pub input: PathBuf,
}

impl Workspace {
    pub fn new(export: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let input = dir.path().join("input.txt");
        std::fs::write(&input, encode_export(export, LineEnding::CrLf))
            .expect("Failed to write input export");
        Self { dir, input }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Answers for the domain prompts: the target domain typed by hand, then
/// controller, user and password for each domain in name order, then
/// template and target selection.
pub fn domain_answers() -> Vec<Answer> {
    let mut answers = vec![Answer::text("newcorp")];
    for domain in [NEW, OLD] {
        answers.push(Answer::text(format!("dc01.{}.local", domain.to_lowercase())));
        answers.push(Answer::text("admin"));
        answers.push(Answer::Secret("secret".to_string()));
    }
    answers.push(Answer::select(OLD));
    answers.push(Answer::select(NEW));
    answers
}

pub fn spawn_app(
    snapshot: DirectorySnapshot,
    answers: Vec<Answer>,
    report_path: Option<PathBuf>,
) -> (Application, Arc<ScriptedResolver>) {
    init_tracing();
    let resolver = Arc::new(ScriptedResolver::new(answers));
    let app = Application::with_ports(test_config(report_path), Arc::new(snapshot), resolver.clone());
    (app, resolver)
}

pub fn read_export(path: &Path) -> String {
    let bytes = std::fs::read(path).expect("Failed to read output export");
    acl_migrate::services::decode_export(&bytes).expect("Output is not valid UTF-16")
}
