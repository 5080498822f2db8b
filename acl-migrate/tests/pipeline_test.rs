//! End-to-end migration runs with a scripted operator.

mod common;

use acl_migrate::decisions::Answer;
use acl_migrate::models::MatchTier;
use common::*;
use migrate_core::error::AppError;

fn scenario_a_answers(output: &std::path::Path) -> Vec<Answer> {
    let mut answers = domain_answers();
    answers.push(Answer::Confirm(false)); // keep disabled users
    answers.push(Answer::text("")); // no group suffix
    answers.push(Answer::text(output.display().to_string()));
    answers
}

#[tokio::test]
async fn migration_appends_target_entries() {
    let ws = Workspace::new(EXPORT);
    let output = ws.path("migrated.txt");
    let (app, resolver) = spawn_app(snapshot(), scenario_a_answers(&output), None);

    let report = app.run(&ws.input).await.unwrap();

    assert_eq!(resolver.remaining(), 0);
    assert_eq!(report.path_count, 3);
    assert_eq!(report.entries_in, 5);
    assert_eq!(report.entries_added, 2);
    assert_eq!(report.identifiers_found, 3);

    let text = read_export(&output);
    assert_eq!(
        text,
        "C:\\Data\r\n\
D:PAI(A;OI;FA;;;S-1-5-21-1-1-1-500)(A;OI;FA;;;S-1-5-21-2-2-2-777)(A;;FA;;;SY)\r\n\
C:\\Data\\Finance\r\n\
D:(A;OICI;0x1301bf;;;S-1-5-21-1-1-1-2201)(A;OICI;0x1301bf;;;S-1-5-21-2-2-2-3301)S:AI(AU;SA;FA;;;WD)\r\n\
C:\\Public\r\n\
D:(A;;FA;;;BA)(A;;0x1200a9;;;S-1-5-21-1-1-1-9999)\r\n"
    );
}

#[tokio::test]
async fn exact_matches_need_no_matching_prompts() {
    let ws = Workspace::new(EXPORT);
    let output = ws.path("migrated.txt");
    let (app, resolver) = spawn_app(snapshot(), scenario_a_answers(&output), None);

    let report = app.run(&ws.input).await.unwrap();

    assert_eq!(report.matched_users.len(), 1);
    assert_eq!(report.matched_users[0].tier, MatchTier::Exact);
    assert_eq!(report.matched_groups.len(), 1);
    assert_eq!(report.matched_groups[0].tier, MatchTier::Exact);
    assert_eq!(report.pairings.get(FINANCE_OLD), Some(FINANCE_NEW));

    // Domain setup, skip-disabled, suffix and output name only.
    assert_eq!(resolver.prompts().len(), domain_answers().len() + 3);
}

#[tokio::test]
async fn unresolved_identifiers_are_reported() {
    let ws = Workspace::new(EXPORT);
    let output = ws.path("migrated.txt");
    let report_path = ws.path("report.json");
    let (app, resolver) = spawn_app(
        snapshot(),
        scenario_a_answers(&output),
        Some(report_path.clone()),
    );

    let report = app.run(&ws.input).await.unwrap();

    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].identifier, ORPHAN);
    assert!(resolver.displayed().iter().any(|m| m.contains(ORPHAN)));

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&report_path).unwrap()).unwrap();
    assert_eq!(json["unresolved"][0]["identifier"], ORPHAN);
    assert_eq!(json["template_domain"], OLD);
    assert_eq!(json["target_domain"], NEW);
    assert_eq!(json["pairings"][JDOE_OLD], JDOE_NEW);
}

#[tokio::test]
async fn declined_identity_and_gate_abort_without_output() {
    let export = "C:\\Data\nD:(A;;FA;;;S-1-5-21-1-1-1-1400)\n";
    let snapshot = snapshot()
        .with_local_account(
            "S-1-5-21-1-1-1-1400",
            "bob",
            OLD,
            acl_migrate::providers::AccountKind::User,
        )
        .with_user(OLD, account("bob", "Bob Builder"), Some("S-1-5-21-1-1-1-1400"));

    let ws = Workspace::new(export);
    let output = ws.path("migrated.txt");

    let mut answers = domain_answers();
    answers.push(Answer::Confirm(false)); // keep disabled users
    answers.push(Answer::Confirm(true)); // select manually
    answers.push(Answer::text("None"));
    answers.push(Answer::Confirm(false)); // do not continue
    let (app, resolver) = spawn_app(snapshot, answers, None);

    let err = app.run(&ws.input).await.unwrap_err();

    assert!(err.is_abort());
    assert_eq!(err.exit_code(), 0);
    assert_eq!(resolver.remaining(), 0);
    assert!(resolver.displayed().iter().any(|m| m.contains("Bob Builder")));
    assert!(!output.exists());
}

#[tokio::test]
async fn declining_overwrite_leaves_existing_file() {
    let ws = Workspace::new(EXPORT);
    let output = ws.path("migrated.txt");
    std::fs::write(&output, b"keep me").unwrap();

    let mut answers = scenario_a_answers(&output);
    answers.push(Answer::Confirm(false));
    let (app, _resolver) = spawn_app(snapshot(), answers, None);

    let err = app.run(&ws.input).await.unwrap_err();

    assert!(err.is_abort());
    assert_eq!(std::fs::read(&output).unwrap(), b"keep me");
}

#[tokio::test]
async fn single_domain_is_a_configuration_error() {
    let ws = Workspace::new(EXPORT);
    let (app, _resolver) = spawn_app(snapshot(), vec![Answer::text("")], None);

    let err = app.run(&ws.input).await.unwrap_err();

    assert!(matches!(err, AppError::ConfigError(_)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn empty_input_is_rejected_before_prompting() {
    let ws = Workspace::new("\n\n");
    let (app, resolver) = spawn_app(snapshot(), vec![], None);

    let err = app.run(&ws.input).await.unwrap_err();

    assert!(matches!(err, AppError::InputFormat(_)));
    assert!(resolver.prompts().is_empty());
}

#[tokio::test]
async fn runs_with_same_answers_pair_identically() {
    let ws = Workspace::new(EXPORT);

    let first_out = ws.path("first.txt");
    let (app, _) = spawn_app(snapshot(), scenario_a_answers(&first_out), None);
    let first = app.run(&ws.input).await.unwrap();

    let second_out = ws.path("second.txt");
    let (app, _) = spawn_app(snapshot(), scenario_a_answers(&second_out), None);
    let second = app.run(&ws.input).await.unwrap();

    assert_eq!(first.pairings, second.pairings);
    assert_eq!(read_export(&first_out), read_export(&second_out));
}
