//! Command execution.
//!
//! Every command returns the text to print; `main` owns stdout and the exit
//! code.

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Context, Result};
use pvm_lifecycle::{LifecycleError, ProtocolVersionManager, ProtocolVersionRepository};
use pvm_model::{ProtocolVersion, StudyId, VersionId, VersionStatus, compare_version_numbers};
use pvm_persistence::FileRepository;
use tracing::info;

use crate::cli::{
    Command, CompareArgs, CreateArgs, ListArgs, NextArgs, SetStatusArgs, ShowArgs, UpdateArgs,
    VersionRef,
};
use crate::summary::{
    amendments_table, status_history_table, statuses_table, study_overview, version_detail_table,
    versions_table,
};

type Manager = ProtocolVersionManager<FileRepository>;

/// Run one command against the store at `store`.
pub async fn execute(command: &Command, store: &Path) -> Result<String> {
    match command {
        Command::List(args) => run_list(args, store).await,
        Command::Show(args) => run_show(args, store).await,
        Command::Create(args) => run_create(args, store).await,
        Command::Submit(args) => run_submit(args, store).await,
        Command::Approve(args) => run_approve(args, store).await,
        Command::Activate(args) => run_activate(args, store).await,
        Command::Delete(args) => run_delete(args, store).await,
        Command::Update(args) => run_update(args, store).await,
        Command::Next(args) => run_next(args, store).await,
        Command::Compare(args) => Ok(run_compare(args)),
        Command::Statuses => Ok(statuses_table().to_string()),
        Command::Amendments => Ok(amendments_table().to_string()),
        Command::SetStatus(args) => run_set_status(args, store).await,
    }
}

async fn open(study: &str, store: &Path) -> Result<Manager> {
    let study_id = StudyId::new(study).with_context(|| format!("invalid study {study:?}"))?;
    let manager = ProtocolVersionManager::open(FileRepository::new(store), study_id.as_str())
        .await
        .with_context(|| format!("load protocol versions from {}", store.display()))?;
    Ok(manager)
}

fn loaded(manager: &Manager, version_id: VersionId) -> Result<&ProtocolVersion> {
    manager
        .protocol_versions()
        .iter()
        .find(|version| version.id == version_id)
        .ok_or_else(|| LifecycleError::VersionNotFound(version_id).into())
}

fn describe(version: &ProtocolVersion) -> String {
    format!("protocol version {} (id {})", version.version_number, version.id)
}

async fn run_list(args: &ListArgs, store: &Path) -> Result<String> {
    let manager = open(&args.study.study, store).await?;
    let versions: Vec<ProtocolVersion> = match args.status {
        Some(status) => manager
            .get_versions_by_status(status)
            .into_iter()
            .cloned()
            .collect(),
        None => manager.protocol_versions().to_vec(),
    };
    if versions.is_empty() {
        return Ok(format!(
            "No protocol versions found for study {}.",
            args.study.study.trim()
        ));
    }
    let current = manager.current_protocol_version().map(|version| version.id);
    Ok(versions_table(&versions, current).to_string())
}

async fn run_show(args: &ShowArgs, store: &Path) -> Result<String> {
    let manager = open(&args.study.study, store).await?;
    let Some(id) = args.id else {
        let mut output = study_overview(
            &manager.snapshot(),
            manager.get_approved_versions_count(),
            &manager.generate_next_version_number(),
        );
        if !manager.protocol_versions().is_empty() {
            let current = manager.current_protocol_version().map(|version| version.id);
            output.push_str("\n\n");
            output.push_str(&versions_table(manager.protocol_versions(), current).to_string());
        }
        return Ok(output);
    };

    let version = loaded(&manager, VersionId(id))?;
    let history = manager.repository().status_changes(version.id).await?;
    let mut output = version_detail_table(version).to_string();
    if !history.is_empty() {
        output.push_str("\n\nStatus history\n");
        output.push_str(&status_history_table(&history).to_string());
    }
    Ok(output)
}

async fn run_create(args: &CreateArgs, store: &Path) -> Result<String> {
    let mut manager = open(&args.study.study, store).await?;
    let created = manager.create_protocol_version(&args.to_input()).await?;
    Ok(format!(
        "Created {} for study {} as {} ({}).",
        describe(&created),
        created.study_id,
        created.amendment_type.label(),
        created.status.label()
    ))
}

async fn run_submit(args: &VersionRef, store: &Path) -> Result<String> {
    let mut manager = open(&args.study, store).await?;
    let version_id = VersionId(args.id);
    manager.submit_for_review(version_id).await?;
    now_in_status(&manager, version_id)
}

async fn run_approve(args: &VersionRef, store: &Path) -> Result<String> {
    let mut manager = open(&args.study, store).await?;
    let version_id = VersionId(args.id);
    manager.approve_protocol_version(version_id).await?;
    now_in_status(&manager, version_id)
}

async fn run_activate(args: &VersionRef, store: &Path) -> Result<String> {
    let mut manager = open(&args.study, store).await?;
    let version_id = VersionId(args.id);
    let previously_active: Vec<VersionId> = manager
        .get_versions_by_status(VersionStatus::Active)
        .into_iter()
        .map(|version| version.id)
        .filter(|id| *id != version_id)
        .collect();

    manager.activate_protocol_version(version_id).await?;

    let mut lines = vec![now_in_status(&manager, version_id)?];
    for id in previously_active {
        let version = loaded(&manager, id)?;
        if version.status == VersionStatus::Superseded {
            lines.push(format!("Superseded {}.", describe(version)));
        }
    }
    Ok(lines.join("\n"))
}

async fn run_delete(args: &VersionRef, store: &Path) -> Result<String> {
    let mut manager = open(&args.study, store).await?;
    let version_id = VersionId(args.id);
    let description = describe(loaded(&manager, version_id)?);
    manager.delete_protocol_version(version_id).await?;
    Ok(format!("Deleted {description}."))
}

async fn run_update(args: &UpdateArgs, store: &Path) -> Result<String> {
    let mut manager = open(&args.version.study, store).await?;
    let version_id = VersionId(args.version.id);
    manager
        .update_protocol_version(version_id, &args.to_update())
        .await?;
    Ok(format!("Updated {}.", describe(loaded(&manager, version_id)?)))
}

async fn run_next(args: &NextArgs, store: &Path) -> Result<String> {
    let manager = open(&args.study.study, store).await?;
    Ok(manager.generate_next_version_number_for(args.amendment))
}

fn run_compare(args: &CompareArgs) -> String {
    let symbol = match compare_version_numbers(&args.left, &args.right) {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    };
    format!("{} {symbol} {}", args.left, args.right)
}

async fn run_set_status(args: &SetStatusArgs, store: &Path) -> Result<String> {
    let mut manager = open(&args.version.study, store).await?;
    let version_id = VersionId(args.version.id);
    let from = loaded(&manager, version_id)?.status;

    manager
        .repository()
        .update_version_status(version_id, args.status, args.note.as_deref())
        .await
        .map_err(LifecycleError::from)?;
    info!(
        version_id = %version_id,
        from = %from,
        to = %args.status,
        "Protocol version status set directly"
    );

    manager.load_protocol_versions().await?;
    now_in_status(&manager, version_id)
}

fn now_in_status(manager: &Manager, version_id: VersionId) -> Result<String> {
    let version = loaded(manager, version_id)?;
    Ok(format!(
        "Protocol version {} (id {}) is now {}.",
        version.version_number,
        version.id,
        version.status.label()
    ))
}
