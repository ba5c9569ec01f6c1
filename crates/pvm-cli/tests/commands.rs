//! Commands run end to end against a temporary store.

use std::path::Path;

use clap::{CommandFactory, Parser};
use pvm_cli::cli::Cli;
use pvm_cli::commands::execute;
use pvm_lifecycle::{LifecycleError, RepositoryError};
use pvm_model::VersionStatus;
use tempfile::tempdir;

async fn run(store: &Path, args: &[&str]) -> anyhow::Result<String> {
    let store = store.to_str().expect("utf-8 store path");
    let mut argv = vec!["pvm", "--store", store];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("parse arguments");
    execute(&cli.command, &cli.store).await
}

fn lifecycle_error(error: &anyhow::Error) -> &LifecycleError {
    error
        .downcast_ref::<LifecycleError>()
        .expect("lifecycle error")
}

#[test]
fn cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[tokio::test]
async fn protocol_moves_from_draft_to_active() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    let output = run(&store, &["create", "STUDY-1", "--created-by", "jdoe"])
        .await
        .expect("create");
    assert_eq!(
        output,
        "Created protocol version 1.0 (id 1) for study STUDY-1 as Initial Protocol (Initial Draft)."
    );

    let output = run(&store, &["submit", "STUDY-1", "1"]).await.expect("submit");
    assert_eq!(
        output,
        "Protocol version 1.0 (id 1) is now Submitted for Review."
    );

    let error = run(&store, &["approve", "STUDY-1", "1"])
        .await
        .expect_err("approve before review outcome");
    assert!(matches!(
        lifecycle_error(&error),
        LifecycleError::ActionNotAllowed {
            status: VersionStatus::UnderReview,
            ..
        }
    ));

    let output = run(
        &store,
        &["set-status", "STUDY-1", "1", "amendment-review", "--note", "IRB queried"],
    )
    .await
    .expect("set status");
    assert_eq!(output, "Protocol version 1.0 (id 1) is now Pending Approval.");

    run(&store, &["approve", "STUDY-1", "1"]).await.expect("approve");
    let output = run(&store, &["activate", "STUDY-1", "1"])
        .await
        .expect("activate");
    assert_eq!(output, "Protocol version 1.0 (id 1) is now Active.");

    let output = run(&store, &["show", "STUDY-1", "1"]).await.expect("show");
    assert!(output.contains("Status history"));
    assert!(output.contains("IRB queried"));
    assert!(output.contains("Protocol version activated for use in trial"));
    assert!(output.contains("jdoe"));
}

#[tokio::test]
async fn activation_reports_superseded_version() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    run(&store, &["create", "STUDY-1"]).await.expect("create 1.0");
    run(&store, &["set-status", "STUDY-1", "1", "ACTIVE"])
        .await
        .expect("activate 1.0 directly");
    run(&store, &["create", "STUDY-1", "--summary", "Adds PK sampling"])
        .await
        .expect("create 1.1");
    run(&store, &["set-status", "STUDY-1", "2", "APPROVED"])
        .await
        .expect("approve 1.1 directly");

    let output = run(&store, &["activate", "STUDY-1", "2"])
        .await
        .expect("activate 1.1");
    assert_eq!(
        output,
        "Protocol version 1.1 (id 2) is now Active.\nSuperseded protocol version 1.0 (id 1)."
    );

    let output = run(&store, &["show", "STUDY-1"]).await.expect("show study");
    let overview: Vec<&str> = output.lines().take(5).collect();
    insta::assert_snapshot!(overview.join("\n"), @r"
    Study: STUDY-1
    Versions: 2 (1 approved or active)
    Current: 1.1 (Active)
    Active: 1.1 (Active)
    Next minor version: 1.2
    ");

    let output = run(&store, &["list", "STUDY-1", "--status", "superseded"])
        .await
        .expect("list superseded");
    assert!(output.contains("1.0"));
    assert!(!output.contains("Adds PK sampling"));
}

#[tokio::test]
async fn deleting_active_version_is_refused() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    run(&store, &["create", "STUDY-1"]).await.expect("create");
    run(&store, &["set-status", "STUDY-1", "1", "active"])
        .await
        .expect("activate");

    let error = run(&store, &["delete", "STUDY-1", "1"])
        .await
        .expect_err("delete active");
    let lifecycle = lifecycle_error(&error);
    assert!(matches!(
        lifecycle,
        LifecycleError::DeleteRequiresDraft { .. }
    ));
    assert_eq!(
        lifecycle.user_message(),
        "Only draft protocol versions can be deleted (this version is Active)."
    );

    let output = run(&store, &["list", "STUDY-1"]).await.expect("list");
    assert!(output.contains("ACTIVE"));
}

#[tokio::test]
async fn draft_can_be_updated_and_deleted() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    run(&store, &["create", "STUDY-1"]).await.expect("create");
    let output = run(
        &store,
        &[
            "update",
            "STUDY-1",
            "1",
            "--description",
            "First issue",
            "--effective-date",
            "2025-03-01",
        ],
    )
    .await
    .expect("update");
    assert_eq!(output, "Updated protocol version 1.0 (id 1).");

    let output = run(&store, &["show", "STUDY-1", "1"]).await.expect("show");
    assert!(output.contains("First issue"));
    assert!(output.contains("2025-03-01"));

    let output = run(&store, &["delete", "STUDY-1", "1"]).await.expect("delete");
    assert_eq!(output, "Deleted protocol version 1.0 (id 1).");

    let output = run(&store, &["list", "STUDY-1"]).await.expect("list");
    assert_eq!(output, "No protocol versions found for study STUDY-1.");
}

#[tokio::test]
async fn withdrawn_version_cannot_change_status() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    run(&store, &["create", "STUDY-1"]).await.expect("create");
    run(&store, &["set-status", "STUDY-1", "1", "WITHDRAWN"])
        .await
        .expect("withdraw");

    let error = run(&store, &["set-status", "STUDY-1", "1", "DRAFT"])
        .await
        .expect_err("reopen withdrawn");
    assert!(matches!(
        lifecycle_error(&error),
        LifecycleError::Repository(RepositoryError::TerminalStatus { .. })
    ));
}

#[tokio::test]
async fn safety_amendment_requires_regulatory_approval() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    let error = run(
        &store,
        &[
            "create",
            "STUDY-1",
            "--amendment",
            "safety",
            "--no-regulatory-approval",
        ],
    )
    .await
    .expect_err("create without approval");
    assert!(matches!(
        lifecycle_error(&error),
        LifecycleError::Validation(_)
    ));
    assert!(!store.exists());
}

#[tokio::test]
async fn next_and_compare_report_numbers() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    assert_eq!(
        run(&store, &["next", "STUDY-1"]).await.expect("next"),
        "1.0"
    );
    run(&store, &["create", "STUDY-1", "--version", "1.9"])
        .await
        .expect("create");
    assert_eq!(
        run(&store, &["next", "STUDY-1"]).await.expect("next minor"),
        "1.10"
    );
    assert_eq!(
        run(&store, &["next", "STUDY-1", "--amendment", "major"])
            .await
            .expect("next major"),
        "2.0"
    );
    assert_eq!(
        run(&store, &["compare", "1.10", "1.9"]).await.expect("compare"),
        "1.10 > 1.9"
    );
    assert_eq!(
        run(&store, &["compare", "1.2", "1.2.0"]).await.expect("compare"),
        "1.2 = 1.2.0"
    );
}

#[tokio::test]
async fn reference_tables_list_every_entry() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    let statuses = run(&store, &["statuses"]).await.expect("statuses");
    for status in VersionStatus::ALL {
        assert!(statuses.contains(status.as_str()), "missing {status}");
    }
    assert!(statuses.contains("Pending Approval"));

    let amendments = run(&store, &["amendments"]).await.expect("amendments");
    assert!(amendments.contains("ADMINISTRATIVE"));
    assert!(amendments.contains("Safety-related changes"));
}

#[tokio::test]
async fn blank_study_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("versions.json");

    let error = run(&store, &["list", "  "]).await.expect_err("blank study");
    assert!(error.to_string().contains("invalid study"));
}
