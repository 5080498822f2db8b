//! Application wiring and the end-to-end migration run.

use crate::config::MigrateConfig;
use crate::decisions::{DecisionResolver, TerminalResolver, format_rows};
use crate::models::IdentityKind;
use crate::providers::{DirectorySnapshot, DomainConnection, IdentityContext, IdentityProvider};
use crate::services::{
    CorrelationEngine, MigrationReport, build_pairing_table, extract_identifiers, first_pass,
    load_export, parse_export, synthesize, write_export,
};
use migrate_core::error::AppError;
use migrate_core::workers::WorkerPool;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Names listed per row in operator listings.
const NAMES_PER_ROW: usize = 5;

/// Application container: configuration plus the two ports every run talks
/// through.
pub struct Application {
    config: MigrateConfig,
    provider: Arc<dyn IdentityProvider>,
    resolver: Arc<dyn DecisionResolver>,
}

impl Application {
    /// Build with the directory snapshot named in the configuration and the
    /// terminal as the decision surface.
    pub fn build(config: MigrateConfig) -> Result<Self, AppError> {
        let snapshot = DirectorySnapshot::from_path(&config.directory.snapshot_path)?;
        tracing::info!(
            snapshot = %config.directory.snapshot_path.display(),
            "Directory snapshot loaded"
        );
        Ok(Self::with_ports(
            config,
            Arc::new(snapshot),
            Arc::new(TerminalResolver::new()),
        ))
    }

    pub fn with_ports(
        config: MigrateConfig,
        provider: Arc<dyn IdentityProvider>,
        resolver: Arc<dyn DecisionResolver>,
    ) -> Self {
        Self {
            config,
            provider,
            resolver,
        }
    }

    /// Run one migration of `input`. Nothing is written unless every gate
    /// is passed.
    pub async fn run(&self, input: &Path) -> Result<MigrationReport, AppError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("migration", run_id = %run_id);
        self.run_inner(run_id, input).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, input: &Path) -> Result<MigrationReport, AppError> {
        let mut report = MigrationReport::new(run_id, input);
        let resolver = self.resolver.as_ref();

        let lines = load_export(input).await?;

        let pool = WorkerPool::new(self.config.common.workers())?;
        let chunks = parse_export(&pool, lines);
        let identifiers = extract_identifiers(&pool, &chunks);
        report.identifiers_found = identifiers.len();

        let pass = first_pass(&IdentityContext::local(self.provider.clone()), &identifiers).await;

        let domains = self.known_domains(pass.observed_domains()).await?;
        let connections = self.connect_domains(&domains).await?;
        let context = IdentityContext::new(self.provider.clone(), connections);

        let (template, target) = self.select_domains(&domains).await?;
        report.template_domain = template.clone();
        report.target_domain = target.clone();

        let catalogs = context.load_catalogs().await;
        let resolved = pass.complete(&catalogs);
        if !resolved.unresolved.is_empty() {
            let ids: Vec<&str> = resolved
                .unresolved
                .iter()
                .map(|r| r.identifier.as_str())
                .collect();
            resolver.display(&format!(
                "The following identifiers could not be resolved in any domain and will be left as they are:\n{}",
                format_rows(&ids, NAMES_PER_ROW)
            ));
        }
        report.unresolved = resolved.unresolved.clone();

        let engine = CorrelationEngine::new(&context, resolver, &catalogs, &template, &target);

        let users = engine.from_template(&resolved.users);
        let (users, skipped) = engine.skip_disabled_users(users).await?;
        report.skipped_disabled = skipped;
        let outcome = engine.correlate_users(&users).await?;
        report.unmatched_users = outcome.unmatched.clone();
        let matched_users = engine.confirm_unmatched(IdentityKind::User, outcome).await?;

        let groups = engine.from_template(&resolved.groups);
        let matched_groups = if groups.is_empty() {
            Vec::new()
        } else {
            let suffix = self.group_suffix().await?;
            let outcome = engine.correlate_groups(&groups, &suffix).await?;
            report.unmatched_groups = outcome.unmatched.clone();
            engine.confirm_unmatched(IdentityKind::Group, outcome).await?
        };

        let pairs = build_pairing_table(&matched_users, &matched_groups)?;
        let export = synthesize(&pool, chunks, &pairs);
        pool.shutdown();

        report.path_count = export.path_count;
        report.entries_in = export.entries_in;
        report.entries_added = export.entries_added();
        report.matched_users = matched_users;
        report.matched_groups = matched_groups;
        report.pairings = pairs;

        let output = self.output_path().await?;
        write_export(&output, &export.text, self.config.output.line_ending).await?;
        report.output_path = Some(output);

        if let Some(path) = &self.config.output.report_path {
            report.write_json(path).await?;
        }

        report.log_summary();
        Ok(report)
    }

    /// Domains observed in the export, plus one the operator may name.
    async fn known_domains(&self, observed: BTreeSet<String>) -> Result<Vec<String>, AppError> {
        let mut domains = observed;
        let listed: Vec<&str> = domains.iter().map(String::as_str).collect();
        self.resolver.display(&format!(
            "Domains found in the export:\n{}",
            format_rows(&listed, NAMES_PER_ROW)
        ));

        let extra = self
            .resolver
            .free_text(
                "If the target domain is not listed, type its name (leave blank to skip): ",
                &[],
            )
            .await?;
        let extra = extra.trim().to_uppercase();
        if !extra.is_empty() {
            tracing::info!(domain = %extra, "Target domain added manually");
            domains.insert(extra);
        }

        if domains.len() < 2 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "At least two domains are needed, found {}",
                domains.len()
            )));
        }
        Ok(domains.into_iter().collect())
    }

    async fn connect_domains(&self, domains: &[String]) -> Result<Vec<DomainConnection>, AppError> {
        let mut connections = Vec::with_capacity(domains.len());
        for domain in domains {
            let controller = self
                .resolver
                .free_text(&format!("Enter the domain controller for {}: ", domain), &[])
                .await?;
            let username = self
                .resolver
                .free_text(&format!("Enter an admin user name for {}: ", domain), &[])
                .await?;
            let password = self
                .resolver
                .secret(&format!("Enter the password for {}\\{}: ", domain, username.trim()))
                .await?;

            connections.push(DomainConnection {
                domain: domain.clone(),
                controller: controller.trim().to_string(),
                username: username.trim().to_string(),
                password,
            });
        }
        Ok(connections)
    }

    async fn select_domains(&self, domains: &[String]) -> Result<(String, String), AppError> {
        let template = self
            .resolver
            .select_one("Select the template domain:", domains)
            .await?;
        let remaining: Vec<String> = domains.iter().filter(|d| **d != template).cloned().collect();
        let target = self
            .resolver
            .select_one("Select the target domain:", &remaining)
            .await?;

        tracing::info!(template = %template, target = %target, "Domains selected");
        Ok((template, target))
    }

    async fn group_suffix(&self) -> Result<String, AppError> {
        if let Some(suffix) = &self.config.matching.group_suffix {
            return Ok(suffix.clone());
        }
        let suffix = self
            .resolver
            .free_text(
                "Enter the suffix used by target domain group names (leave blank for none): ",
                &[],
            )
            .await?;
        Ok(suffix.trim().to_string())
    }

    async fn output_path(&self) -> Result<PathBuf, AppError> {
        let cwd = std::env::current_dir()?;
        self.resolver
            .display(&format!("The output file will be written under {}", cwd.display()));

        let name = self
            .resolver
            .free_text("Enter the output file name: ", &[])
            .await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::abort("no output file name given"));
        }

        let path = cwd.join(name);
        if tokio::fs::try_exists(&path).await?
            && !self
                .resolver
                .confirm(&format!("{} already exists. Overwrite it?", path.display()))
                .await?
        {
            return Err(AppError::abort("output file exists"));
        }
        Ok(path)
    }
}
