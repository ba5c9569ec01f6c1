//! CLI argument definitions for the protocol version manager.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use pvm_model::{AmendmentType, VersionCreateInput, VersionStatus, VersionUpdate};

#[derive(Parser)]
#[command(
    name = "pvm",
    version,
    about = "Protocol version manager - draft, review, approve and activate protocol versions",
    long_about = "Manage the versions of clinical-trial protocols.\n\n\
                  Versions move from draft through review and approval to the single\n\
                  active version of a study. Versions are kept in a local JSON store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Protocol version store file.
    #[arg(
        long = "store",
        value_name = "PATH",
        env = "PVM_STORE",
        default_value = "protocol-versions.json",
        global = true
    )]
    pub store: PathBuf,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the protocol versions of a study, newest first.
    List(ListArgs),

    /// Summarize a study, or show one version with its status history.
    Show(ShowArgs),

    /// Create a new draft version.
    Create(CreateArgs),

    /// Submit a draft version for review.
    Submit(VersionRef),

    /// Approve a version that passed amendment review.
    Approve(VersionRef),

    /// Activate an approved version, superseding the active one.
    Activate(VersionRef),

    /// Delete a draft version.
    Delete(VersionRef),

    /// Edit the content of a draft version.
    Update(UpdateArgs),

    /// Print the suggested number for the next version.
    Next(NextArgs),

    /// Compare two version numbers.
    Compare(CompareArgs),

    /// List lifecycle statuses and the actions each allows.
    Statuses,

    /// List amendment types.
    Amendments,

    /// Set a version's status directly, e.g. to record a review outcome or a
    /// withdrawal. Store rules still apply.
    SetStatus(SetStatusArgs),
}

#[derive(Args)]
pub struct StudyArg {
    /// Study identifier.
    #[arg(value_name = "STUDY")]
    pub study: String,
}

#[derive(Args)]
pub struct VersionRef {
    /// Study identifier.
    #[arg(value_name = "STUDY")]
    pub study: String,

    /// Protocol version identifier.
    #[arg(value_name = "ID")]
    pub id: u64,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub study: StudyArg,

    /// Only show versions in this status.
    #[arg(long = "status", value_name = "STATUS")]
    pub status: Option<VersionStatus>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub study: StudyArg,

    /// Show a single version instead of the study summary.
    #[arg(value_name = "ID")]
    pub id: Option<u64>,
}

#[derive(Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub study: StudyArg,

    /// Version number (default: generated from the latest version).
    #[arg(long = "version", value_name = "NUMBER")]
    pub version_number: Option<String>,

    /// Amendment type (default: INITIAL for a study's first version, MINOR after).
    #[arg(long = "amendment", value_name = "TYPE")]
    pub amendment: Option<AmendmentType>,

    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Why the protocol is being amended.
    #[arg(long = "reason", value_name = "TEXT")]
    pub reason: Option<String>,

    /// Summary of changes (default: derived from the amendment type).
    #[arg(long = "summary", value_name = "TEXT")]
    pub summary: Option<String>,

    /// Date the version takes effect (YYYY-MM-DD).
    #[arg(long = "effective-date", value_name = "DATE")]
    pub effective_date: Option<NaiveDate>,

    /// Mark the version as not requiring regulatory approval.
    ///
    /// Rejected for MAJOR and SAFETY amendments.
    #[arg(long = "no-regulatory-approval")]
    pub no_regulatory_approval: bool,

    /// Do not notify stakeholders about the new version.
    #[arg(long = "no-notify")]
    pub no_notify: bool,

    /// Author recorded on the version.
    #[arg(long = "created-by", value_name = "NAME")]
    pub created_by: Option<String>,
}

impl CreateArgs {
    pub fn to_input(&self) -> VersionCreateInput {
        VersionCreateInput {
            version_number: self.version_number.clone(),
            amendment_type: self.amendment,
            description: self.description.clone(),
            amendment_reason: self.reason.clone(),
            changes_summary: self.summary.clone(),
            effective_date: self.effective_date,
            requires_regulatory_approval: self.no_regulatory_approval.then_some(false),
            notify_stakeholders: self.no_notify.then_some(false),
            created_by: self.created_by.clone(),
        }
    }
}

#[derive(Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub version: VersionRef,

    /// New description (empty string clears it).
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// New amendment reason (empty string clears it).
    #[arg(long = "reason", value_name = "TEXT")]
    pub reason: Option<String>,

    /// New summary of changes (empty string clears it).
    #[arg(long = "summary", value_name = "TEXT")]
    pub summary: Option<String>,

    /// New effective date (YYYY-MM-DD).
    #[arg(long = "effective-date", value_name = "DATE")]
    pub effective_date: Option<NaiveDate>,
}

impl UpdateArgs {
    pub fn to_update(&self) -> VersionUpdate {
        VersionUpdate {
            description: self.description.clone(),
            amendment_reason: self.reason.clone(),
            changes_summary: self.summary.clone(),
            effective_date: self.effective_date,
        }
    }
}

#[derive(Args)]
pub struct NextArgs {
    #[command(flatten)]
    pub study: StudyArg,

    /// Amendment type the next version would carry.
    #[arg(long = "amendment", value_name = "TYPE", default_value = "MINOR")]
    pub amendment: AmendmentType,
}

#[derive(Args)]
pub struct CompareArgs {
    #[arg(value_name = "A")]
    pub left: String,

    #[arg(value_name = "B")]
    pub right: String,
}

#[derive(Args)]
pub struct SetStatusArgs {
    #[command(flatten)]
    pub version: VersionRef,

    /// Target status.
    #[arg(value_name = "STATUS")]
    pub status: VersionStatus,

    /// Note recorded in the status history.
    #[arg(long = "note", value_name = "TEXT")]
    pub note: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
