//! Correlation engine: finds each template-domain identity's counterpart in
//! the target domain.
//!
//! Tiers run in decreasing confidence and stop at the first one that yields
//! candidates:
//!
//! | tier          | users                          | groups                           |
//! |---------------|--------------------------------|----------------------------------|
//! | exact         | full name equal                | name equal, with or without suffix |
//! | containment   | full name contains source      | name contains source             |
//! | fallback      | same leading token             | any shared token                 |
//! | manual        | free text over all accounts    | free text over all groups        |
//!
//! A single exact candidate is accepted without asking. Every other tier asks
//! the operator, who may decline; a decline leaves the identity unmatched.

use crate::decisions::{DecisionResolver, MANUAL_DECLINE, NONE_OF_THESE, format_rows};
use crate::models::{
    CorrelationRecord, DomainIdentityCatalog, IdentifierRecord, IdentityCatalogs, IdentityKind,
    MatchTier,
};
use crate::providers::IdentityContext;
use migrate_core::error::AppError;
use std::collections::HashMap;

/// Unknown manual answers are re-asked this many times before the identity
/// is treated as declined.
const MAX_MANUAL_ATTEMPTS: usize = 3;

/// Names listed per row when showing unmatched identities.
const NAMES_PER_ROW: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct CorrelationOutcome {
    pub matched: Vec<CorrelationRecord>,
    pub unmatched: Vec<IdentifierRecord>,
}

/// A target-domain identity offered to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    label: String,
    account_name: String,
    /// Known up front for groups; users are resolved after acceptance.
    identifier: Option<String>,
}

enum Decision {
    Accept(Candidate, MatchTier),
    Decline,
}

pub struct CorrelationEngine<'a> {
    context: &'a IdentityContext,
    resolver: &'a dyn DecisionResolver,
    catalogs: &'a IdentityCatalogs,
    template_domain: &'a str,
    target_domain: &'a str,
    empty: DomainIdentityCatalog,
}

impl<'a> CorrelationEngine<'a> {
    pub fn new(
        context: &'a IdentityContext,
        resolver: &'a dyn DecisionResolver,
        catalogs: &'a IdentityCatalogs,
        template_domain: &'a str,
        target_domain: &'a str,
    ) -> Self {
        Self {
            context,
            resolver,
            catalogs,
            template_domain,
            target_domain,
            empty: DomainIdentityCatalog::default(),
        }
    }

    fn template(&self) -> &DomainIdentityCatalog {
        self.catalogs.get(self.template_domain).unwrap_or(&self.empty)
    }

    fn target(&self) -> &DomainIdentityCatalog {
        self.catalogs.get(self.target_domain).unwrap_or(&self.empty)
    }

    /// Identities belonging to the template domain, in identifier order.
    pub fn from_template(&self, identities: &[IdentifierRecord]) -> Vec<IdentifierRecord> {
        let mut selected: Vec<IdentifierRecord> = identities
            .iter()
            .filter(|r| r.in_domain(self.template_domain))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        selected
    }

    /// Optionally drop users whose template-domain account is disabled.
    /// Returns the kept users and the skipped ones. Users missing from the
    /// catalog are kept.
    pub async fn skip_disabled_users(
        &self,
        users: Vec<IdentifierRecord>,
    ) -> Result<(Vec<IdentifierRecord>, Vec<IdentifierRecord>), AppError> {
        if users.is_empty()
            || !self
                .resolver
                .confirm("Would you like to skip matching disabled users?")
                .await?
        {
            return Ok((users, Vec::new()));
        }

        let template = self.template();
        let (active, disabled): (Vec<_>, Vec<_>) = users.into_iter().partition(|u| {
            u.account_name
                .as_deref()
                .and_then(|a| template.user(a))
                .is_none_or(|account| account.enabled)
        });

        if !disabled.is_empty() {
            let names: Vec<&str> = disabled
                .iter()
                .map(|u| u.account_name.as_deref().unwrap_or(&u.identifier))
                .collect();
            self.resolver.display(&format!(
                "The following users are disabled and will not be mapped to users in the target domain:\n{}",
                format_rows(&names, NAMES_PER_ROW)
            ));
            if !self.resolver.confirm("Do you want to continue?").await? {
                return Err(AppError::abort("disabled users declined"));
            }
        }

        tracing::info!(
            active = active.len(),
            disabled = disabled.len(),
            "Filtered disabled users"
        );
        Ok((active, disabled))
    }

    pub async fn correlate_users(
        &self,
        users: &[IdentifierRecord],
    ) -> Result<CorrelationOutcome, AppError> {
        tracing::info!(users = users.len(), "Correlating users");
        let mut outcome = CorrelationOutcome::default();

        for user in users {
            match self.match_user(user).await? {
                Decision::Accept(candidate, tier) => {
                    let identifier = self
                        .context
                        .account_identifier(self.target_domain, &candidate.account_name)
                        .await;
                    match identifier {
                        Some(identifier) => {
                            outcome.matched.push(accept(user, candidate, identifier, tier))
                        }
                        None => {
                            tracing::warn!(
                                identifier = %user.identifier,
                                target_account = %candidate.account_name,
                                "Matched account has no identifier in target domain"
                            );
                            outcome.unmatched.push(user.clone());
                        }
                    }
                }
                Decision::Decline => outcome.unmatched.push(user.clone()),
            }
        }

        Ok(outcome)
    }

    pub async fn correlate_groups(
        &self,
        groups: &[IdentifierRecord],
        suffix: &str,
    ) -> Result<CorrelationOutcome, AppError> {
        tracing::info!(groups = groups.len(), suffix = %suffix, "Correlating groups");
        let mut outcome = CorrelationOutcome::default();

        for group in groups {
            match self.match_group(group, suffix).await? {
                Decision::Accept(candidate, tier) => match candidate.identifier.clone() {
                    Some(identifier) => {
                        outcome.matched.push(accept(group, candidate, identifier, tier))
                    }
                    None => outcome.unmatched.push(group.clone()),
                },
                Decision::Decline => outcome.unmatched.push(group.clone()),
            }
        }

        Ok(outcome)
    }

    /// Show unmatched identities and ask whether to go on without them.
    pub async fn confirm_unmatched(
        &self,
        kind: IdentityKind,
        outcome: CorrelationOutcome,
    ) -> Result<Vec<CorrelationRecord>, AppError> {
        tracing::info!(
            kind = kind.as_str(),
            matched = outcome.matched.len(),
            unmatched = outcome.unmatched.len(),
            "Correlation finished"
        );

        if outcome.unmatched.is_empty() {
            return Ok(outcome.matched);
        }

        let names: Vec<&str> = outcome
            .unmatched
            .iter()
            .map(IdentifierRecord::display_name)
            .collect();
        self.resolver.display(&format!(
            "The following {}s will not have permissions created in the target domain because no match was found:\n{}",
            kind.as_str(),
            format_rows(&names, NAMES_PER_ROW)
        ));

        if self.resolver.confirm("Do you want to continue?").await? {
            Ok(outcome.matched)
        } else {
            Err(AppError::abort(format!("unmatched {}s declined", kind.as_str())))
        }
    }

    async fn match_user(&self, user: &IdentifierRecord) -> Result<Decision, AppError> {
        let name = user.display_name();
        let account = user.account_name.as_deref().unwrap_or(&user.identifier);
        let targets: Vec<Candidate> = self
            .target()
            .users
            .values()
            .map(|a| Candidate {
                label: user_label(&a.full_name, &a.account_name),
                account_name: a.account_name.clone(),
                identifier: None,
            })
            .collect();
        // Target names fall back to the account name, as source names do.
        let full_names: HashMap<&str, &str> = self
            .target()
            .users
            .values()
            .map(|a| {
                let name = if a.full_name.trim().is_empty() {
                    a.account_name.as_str()
                } else {
                    a.full_name.as_str()
                };
                (a.account_name.as_str(), name)
            })
            .collect();
        let full_name = |c: &Candidate| full_names.get(c.account_name.as_str()).copied().unwrap_or("");
        let mut name_counts: HashMap<String, usize> = HashMap::new();
        for name in full_names.values() {
            *name_counts.entry(name.to_lowercase()).or_default() += 1;
        }

        let exact = filter(&targets, |c| full_name(c) == name);
        if !exact.is_empty() {
            let prompt = format!(
                "Multiple exact matches found for {} ({}), please select the correct one:",
                name, account
            );
            return self.pick_exact(exact, &prompt).await;
        }

        let rough_prompt = format!(
            "No exact match was found for {} ({}), please select from the following rough matches:",
            name, account
        );

        let contained = filter(&targets, |c| full_name(c).contains(name));
        if !contained.is_empty() {
            return self.pick_or_decline(contained, &rough_prompt, MatchTier::Containment).await;
        }

        let leading = leading_token(name);
        let same_lead = filter(&targets, |c| {
            leading.is_some() && leading_token(full_name(c)) == leading
        });
        if !same_lead.is_empty() {
            return self.pick_or_decline(same_lead, &rough_prompt, MatchTier::LeadingToken).await;
        }

        let confirm = format!(
            "No match found for user {}. Would you like to select manually?",
            name
        );
        self.manual(targets, &confirm, "user", |c, answer| {
            let by_name = full_name(c).eq_ignore_ascii_case(answer)
                && name_counts.get(&answer.to_lowercase()) == Some(&1);
            by_name || c.account_name.eq_ignore_ascii_case(answer)
        })
        .await
    }

    async fn match_group(&self, group: &IdentifierRecord, suffix: &str) -> Result<Decision, AppError> {
        let name = group.display_name();
        let targets = group_candidates(self.target());
        fn group_name(c: &Candidate) -> &str {
            c.account_name.as_str()
        }

        let exact = filter(&targets, |c| {
            let target = group_name(c);
            target == name || (!suffix.is_empty() && target == format!("{}{}", name, suffix))
        });
        if !exact.is_empty() {
            let prompt = format!(
                "Multiple exact matches found for {}, please select the correct one:",
                name
            );
            return self.pick_exact(exact, &prompt).await;
        }

        let prompt = format!("Please select from the potential matches for {}: ", name);

        let contained = filter(&targets, |c| group_name(c).contains(name));
        if !contained.is_empty() {
            return self.pick_or_decline(contained, &prompt, MatchTier::Substring).await;
        }

        let tokens: Vec<&str> = name.split_whitespace().collect();
        let overlapping = filter(&targets, |c| {
            group_name(c).split_whitespace().any(|t| tokens.contains(&t))
        });
        if !overlapping.is_empty() {
            return self.pick_or_decline(overlapping, &prompt, MatchTier::TokenOverlap).await;
        }

        let confirm = format!(
            "No rough matches found for {}. Would you like to select manually?",
            name
        );
        self.manual(targets, &confirm, "group", |c, answer| {
            c.account_name.eq_ignore_ascii_case(answer)
        })
        .await
    }

    async fn pick_exact(&self, candidates: Vec<Candidate>, prompt: &str) -> Result<Decision, AppError> {
        if candidates.len() == 1 {
            let candidate = candidates.into_iter().next().ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("exact candidate vanished"))
            })?;
            return Ok(Decision::Accept(candidate, MatchTier::Exact));
        }

        let labels: Vec<String> = candidates.iter().map(|c| c.label.clone()).collect();
        let choice = self.resolver.select_one(prompt, &labels).await?;
        Ok(take_labelled(candidates, &choice)
            .map(|c| Decision::Accept(c, MatchTier::Exact))
            .unwrap_or(Decision::Decline))
    }

    async fn pick_or_decline(
        &self,
        candidates: Vec<Candidate>,
        prompt: &str,
        tier: MatchTier,
    ) -> Result<Decision, AppError> {
        let mut labels: Vec<String> = candidates.iter().map(|c| c.label.clone()).collect();
        labels.push(NONE_OF_THESE.to_string());

        let choice = self.resolver.select_one(prompt, &labels).await?;
        if choice == NONE_OF_THESE {
            return Ok(Decision::Decline);
        }
        Ok(take_labelled(candidates, &choice)
            .map(|c| Decision::Accept(c, tier))
            .unwrap_or(Decision::Decline))
    }

    /// Free-text selection over the whole target catalog. Answers match a
    /// label, or whatever `matches_alias` accepts, case-insensitively.
    async fn manual(
        &self,
        candidates: Vec<Candidate>,
        confirm_prompt: &str,
        noun: &str,
        matches_alias: impl Fn(&Candidate, &str) -> bool,
    ) -> Result<Decision, AppError> {
        if candidates.is_empty() || !self.resolver.confirm(confirm_prompt).await? {
            return Ok(Decision::Decline);
        }

        let mut labels: Vec<String> = candidates.iter().map(|c| c.label.clone()).collect();
        labels.push(MANUAL_DECLINE.to_string());

        self.resolver.display(&format!(
            "Please enter the name of a {} or type \"{}\" to cancel. Use Tab to auto complete.",
            noun, MANUAL_DECLINE
        ));

        for _ in 0..MAX_MANUAL_ATTEMPTS {
            let answer = self
                .resolver
                .free_text(&format!("Select a {} then press Enter: ", noun), &labels)
                .await?;
            let answer = answer.trim();

            if answer == MANUAL_DECLINE || answer.eq_ignore_ascii_case(NONE_OF_THESE) {
                return Ok(Decision::Decline);
            }

            let found = candidates
                .iter()
                .find(|c| c.label == answer)
                .or_else(|| candidates.iter().find(|c| c.label.eq_ignore_ascii_case(answer)))
                .or_else(|| candidates.iter().find(|c| matches_alias(c, answer)));
            if let Some(candidate) = found {
                return Ok(Decision::Accept(candidate.clone(), MatchTier::Manual));
            }

            self.resolver
                .display(&format!("\"{}\" is not a known {}.", answer, noun));
        }

        tracing::warn!(noun, "No valid manual selection, leaving unmatched");
        Ok(Decision::Decline)
    }
}

fn accept(
    source: &IdentifierRecord,
    candidate: Candidate,
    target_identifier: String,
    tier: MatchTier,
) -> CorrelationRecord {
    tracing::info!(
        identifier = %source.identifier,
        source_name = %source.display_name(),
        target_account = %candidate.account_name,
        target_identifier = %target_identifier,
        tier = tier.as_str(),
        "Identity matched"
    );
    CorrelationRecord {
        source: source.clone(),
        target_identifier,
        target_account_name: candidate.account_name,
        tier,
    }
}

fn filter(candidates: &[Candidate], keep: impl Fn(&Candidate) -> bool) -> Vec<Candidate> {
    candidates.iter().filter(|c| keep(c)).cloned().collect()
}

fn take_labelled(candidates: Vec<Candidate>, label: &str) -> Option<Candidate> {
    candidates.into_iter().find(|c| c.label == label)
}

fn leading_token(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

fn user_label(full_name: &str, account_name: &str) -> String {
    if full_name.trim().is_empty() {
        account_name.to_string()
    } else {
        format!("{} ({})", full_name, account_name)
    }
}

/// Target groups as candidates. Names shared by several groups carry the
/// identifier in their label so every label is unique.
fn group_candidates(catalog: &DomainIdentityCatalog) -> Vec<Candidate> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in catalog.groups.values() {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    catalog
        .groups
        .iter()
        .map(|(identifier, name)| Candidate {
            label: if counts.get(name.as_str()).copied().unwrap_or(0) > 1 {
                format!("{} ({})", name, identifier)
            } else {
                name.clone()
            },
            account_name: name.clone(),
            identifier: Some(identifier.clone()),
        })
        .collect()
}
