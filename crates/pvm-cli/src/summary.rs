//! Table and text rendering for command output.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use pvm_lifecycle::{LifecycleSnapshot, StatusChange};
use pvm_model::{AmendmentType, ProtocolVersion, StudyId, VersionAction, VersionId, VersionStatus};

/// One row per version, newest first. The current version is marked.
pub fn versions_table(versions: &[ProtocolVersion], current: Option<VersionId>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(""),
        header_cell("ID"),
        header_cell("Version"),
        header_cell("Status"),
        header_cell("Amendment"),
        header_cell("Effective"),
        header_cell("Created"),
        header_cell("Summary"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for version in versions {
        let marker = if Some(version.id) == current {
            Cell::new("*").fg(Color::Cyan).add_attribute(Attribute::Bold)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            marker,
            Cell::new(version.id),
            Cell::new(&version.version_number).add_attribute(Attribute::Bold),
            status_cell(version.status),
            Cell::new(version.amendment_type.label()),
            optional_cell(version.effective_date.map(|date| date.to_string())),
            optional_cell(
                version
                    .created_date
                    .map(|date| date.format("%Y-%m-%d %H:%M").to_string()),
            ),
            optional_cell(version.changes_summary.clone()),
        ]);
    }
    table
}

/// Key/value view of one version.
pub fn version_detail_table(version: &ProtocolVersion) -> Table {
    let mut table = Table::new();
    apply_detail_table_style(&mut table);
    let actions: Vec<&str> = version
        .status
        .allowed_actions()
        .iter()
        .map(VersionAction::as_str)
        .collect();
    let rows = [
        ("ID", Some(version.id.to_string())),
        ("Study", Some(version.study_id.to_string())),
        ("Version", Some(version.version_number.clone())),
        (
            "Status",
            Some(format!("{} ({})", version.status.label(), version.status)),
        ),
        ("Amendment", Some(version.amendment_type.label().to_string())),
        ("Description", version.description.clone()),
        ("Reason", version.amendment_reason.clone()),
        ("Summary", version.changes_summary.clone()),
        (
            "Effective",
            version.effective_date.map(|date| date.to_string()),
        ),
        ("Created", version.created_date.map(|date| date.to_rfc3339())),
        ("Created by", version.created_by.clone()),
        (
            "Regulatory approval",
            Some(yes_no(version.requires_regulatory_approval).to_string()),
        ),
        (
            "Notify stakeholders",
            Some(yes_no(version.notify_stakeholders).to_string()),
        ),
        (
            "Allowed actions",
            (!actions.is_empty()).then(|| actions.join(", ")),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![header_cell(label), optional_cell(value)]);
    }
    table
}

/// Status history of one version, oldest first.
pub fn status_history_table(changes: &[StatusChange]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Changed"),
        header_cell("From"),
        header_cell("To"),
        header_cell("Note"),
    ]);
    apply_table_style(&mut table);
    for change in changes {
        table.add_row(vec![
            Cell::new(change.changed_at.format("%Y-%m-%d %H:%M:%S")),
            status_cell(change.from),
            status_cell(change.to),
            optional_cell(change.note.clone()),
        ]);
    }
    table
}

/// The capability table of every status.
pub fn statuses_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Status"),
        header_cell("Label"),
        header_cell("Edit"),
        header_cell("Submit"),
        header_cell("Approve"),
        header_cell("Activate"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    for column in 2..=5 {
        align_column(&mut table, column, CellAlignment::Center);
    }
    for status in VersionStatus::ALL {
        let info = status.info();
        table.add_row(vec![
            status_cell(status),
            Cell::new(info.label),
            flag_cell(info.can_edit),
            flag_cell(info.can_submit),
            flag_cell(info.can_approve),
            flag_cell(info.can_activate),
            Cell::new(info.description),
        ]);
    }
    table
}

pub fn amendments_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Type"),
        header_cell("Label"),
        header_cell("Regulatory approval"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for amendment in AmendmentType::ALL {
        let info = amendment.info();
        table.add_row(vec![
            Cell::new(info.value).add_attribute(Attribute::Bold),
            Cell::new(info.label),
            flag_cell(amendment.requires_regulatory_approval()),
            Cell::new(info.description),
        ]);
    }
    table
}

/// Plain-text overview of a loaded study.
pub fn study_overview(
    snapshot: &LifecycleSnapshot,
    approved_count: usize,
    next_number: &str,
) -> String {
    let study = snapshot.study_id.as_ref().map_or("-", StudyId::as_str);
    let describe = |version: Option<&ProtocolVersion>| {
        version.map_or_else(
            || "none".to_string(),
            |version| format!("{} ({})", version.version_number, version.status.label()),
        )
    };
    let active = snapshot
        .protocol_versions
        .iter()
        .find(|version| version.status == VersionStatus::Active);

    let mut lines = vec![
        format!("Study: {study}"),
        format!(
            "Versions: {} ({approved_count} approved or active)",
            snapshot.protocol_versions.len()
        ),
        format!(
            "Current: {}",
            describe(snapshot.current_protocol_version.as_ref())
        ),
        format!("Active: {}", describe(active)),
        format!("Next minor version: {next_number}"),
    ];
    if let Some(error) = &snapshot.error {
        lines.push(format!("Error: {error}"));
    }
    lines.join("\n")
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_detail_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: VersionStatus) -> Cell {
    Cell::new(status).fg(status_color(status))
}

fn status_color(status: VersionStatus) -> Color {
    match status {
        VersionStatus::Draft => Color::Grey,
        VersionStatus::UnderReview | VersionStatus::AmendmentReview => Color::Yellow,
        VersionStatus::Approved => Color::Blue,
        VersionStatus::Active => Color::Green,
        VersionStatus::Superseded | VersionStatus::Withdrawn => Color::DarkGrey,
    }
}

fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("-")
    }
}

fn optional_cell(value: Option<String>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
