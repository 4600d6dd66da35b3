//! Turning events into the lines a command prints.
//!
//! Item lines are grouped under a `<directory>:` header that is printed only
//! when the directory changes. That "last printed directory" lives in a
//! [`DisplayState`] owned by one operation's output and passed by `&mut`.

use std::path::{Path, PathBuf};

use crate::domain::events::{Event, EventKind, GetEvent, MergingEvent};
use crate::domain::item::PendingChange;
use crate::domain::path::server_path;
use crate::domain::status::{OperationStatus, Severity};

/// Formatting state for one operation's output
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisplayState {
    last_directory: Option<String>,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_directory(&self) -> Option<&str> {
        self.last_directory.as_deref()
    }

    /// Header lines needed before an item in `directory`.
    fn enter(&mut self, directory: &str) -> Vec<String> {
        if self.last_directory.as_deref() == Some(directory) {
            return Vec::new();
        }
        let mut lines = Vec::new();
        if self.last_directory.is_some() {
            lines.push(String::new());
        }
        lines.push(format!("{}:", directory));
        self.last_directory = Some(directory.to_string());
        lines
    }
}

/// Where an item line goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Out(String),
    Err(String),
}

impl Line {
    pub fn text(&self) -> &str {
        match self {
            Line::Out(text) | Line::Err(text) => text,
        }
    }
}

/// Lines to print for `event`; events with nothing to show give none.
pub fn format_event(event: &Event, state: &mut DisplayState) -> Vec<Line> {
    match &event.kind {
        EventKind::Get(get) => format_get(get, state),
        EventKind::Merging(merging) => format_merging(merging, state),
        EventKind::UndonePendingChange { change, .. } => {
            format_change_line("Undoing", change, state)
        }
        EventKind::NewPendingChange { change, .. } => {
            format_change_line(&capitalize(&change.change_type.to_string()), change, state)
        }
        EventKind::Conflict {
            server_item,
            message,
            ..
        } => vec![Line::Err(format!("Conflict: {} - {}", server_item, message))],
        EventKind::NonFatalError(error) => {
            let prefix = match error.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            vec![Line::Err(format!("{}: {}", prefix, error.message))]
        }
        EventKind::Destroy {
            server_item,
            version,
        } => vec![Line::Out(format!("Destroyed: {};C{}", server_item, version))],
        EventKind::Checkin { changeset_id, .. } => {
            vec![Line::Out(format!("Changeset #{} checked in.", changeset_id))]
        }
        EventKind::Shelve { shelveset, .. } => {
            vec![Line::Out(format!("Shelveset {} created.", shelveset))]
        }
        EventKind::ConflictResolved { server_item, .. } => {
            vec![Line::Out(format!("Resolved {}", server_item))]
        }
        _ => Vec::new(),
    }
}

/// One line per pending change, grouped by directory.
pub fn format_pending_change(change: &PendingChange, state: &mut DisplayState) -> Vec<Line> {
    format_change_line(&change.change_type.to_string(), change, state)
}

/// Message for an item that ended up with `status`.
pub fn status_message(path: &str, status: OperationStatus) -> String {
    match status {
        OperationStatus::Getting => format!("Getting {}", path),
        OperationStatus::Replacing => format!("Replacing {}", path),
        OperationStatus::Deleting => format!("Deleting {}", path),
        OperationStatus::Conflict => {
            format!("Conflict: {} - the item has a conflicting change", path)
        }
        OperationStatus::SourceWritable => {
            format!("{} is writable and cannot be replaced", path)
        }
        OperationStatus::TargetWritable => {
            format!("A writable file {} exists at the target location", path)
        }
        OperationStatus::TargetLocalPending => {
            format!("{} has a local pending change at the target location", path)
        }
        OperationStatus::SourceDirectoryNotEmpty => {
            format!("{} is not empty and cannot be removed", path)
        }
        OperationStatus::TargetIsDirectory => {
            format!("A folder exists at the target location {}", path)
        }
        OperationStatus::UnableToRefresh => {
            format!("Unable to refresh {} because it has a pending edit", path)
        }
    }
}

fn format_get(get: &GetEvent, state: &mut DisplayState) -> Vec<Line> {
    let path = get
        .local_item()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| get.server_item.clone());
    format_status_line(get.local_item(), &get.server_item, &path, get.status, state)
}

fn format_merging(merging: &MergingEvent, state: &mut DisplayState) -> Vec<Line> {
    if !merging.status.escalates() {
        let line = format!("merge, {}: {}", merging.change_type, merging.server_item);
        let (directory, _) = split(merging.target_local_item.as_deref(), &merging.server_item);
        let mut lines: Vec<Line> = state.enter(&directory).into_iter().map(Line::Out).collect();
        lines.push(Line::Out(line));
        return lines;
    }
    vec![Line::Err(status_message(&merging.server_item, merging.status))]
}

fn format_status_line(
    local: Option<&Path>,
    server_item: &str,
    full_path: &str,
    status: OperationStatus,
    state: &mut DisplayState,
) -> Vec<Line> {
    if status.escalates() {
        return vec![Line::Err(status_message(full_path, status))];
    }
    let (directory, name) = split(local, server_item);
    let mut lines: Vec<Line> = state.enter(&directory).into_iter().map(Line::Out).collect();
    lines.push(Line::Out(status_message(&name, status)));
    lines
}

fn format_change_line(verb: &str, change: &PendingChange, state: &mut DisplayState) -> Vec<Line> {
    let (directory, name) = split(change.effective_local_item(), &change.server_item);
    let mut lines: Vec<Line> = state.enter(&directory).into_iter().map(Line::Out).collect();
    lines.push(Line::Out(format!("{}: {}", verb, name)));
    lines
}

/// Directory and name of an item, preferring its local path.
fn split(local: Option<&Path>, server_item: &str) -> (String, String) {
    if let Some(local) = local {
        let directory = local
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| local.to_path_buf());
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| local.display().to_string());
        return (directory.display().to_string(), name);
    }
    let directory = server_path::parent(server_item).unwrap_or(server_item);
    (directory.to_string(), server_path::file_name(server_item).to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
