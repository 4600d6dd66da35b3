use std::path::PathBuf;

use super::{
    change::{ChangeType, ItemType},
    item::{PendingChange, WorkspaceKey},
    source::EventSource,
    status::{NonFatalCause, OperationKind, OperationStatus, Severity},
};

/// A version-control occurrence, stamped with the context that caused it.
///
/// Events are immutable once built; the dispatch engine lends each one to
/// every listener of its category.
#[derive(Debug, Clone)]
pub struct Event {
    pub source: EventSource,
    pub kind: EventKind,
}

impl Event {
    pub fn new(source: EventSource, kind: EventKind) -> Self {
        Self { source, kind }
    }

    pub fn category(&self) -> EventCategory {
        self.kind.category()
    }
}

/// Outcome of one item processed by a get (or a get-like) operation
#[derive(Debug, Clone, PartialEq)]
pub struct GetEvent {
    pub operation_id: u64,
    pub workspace: WorkspaceKey,
    pub status: OperationStatus,
    pub server_item: String,
    pub source_local_item: Option<PathBuf>,
    pub target_local_item: Option<PathBuf>,
    pub version: i32,
    pub change_type: ChangeType,
    pub item_type: ItemType,
}

impl GetEvent {
    /// Local path the event is about: the target, else where it used to live.
    pub fn local_item(&self) -> Option<&std::path::Path> {
        self.target_local_item
            .as_deref()
            .or(self.source_local_item.as_deref())
    }
}

/// Outcome of one item processed by a merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergingEvent {
    pub workspace: WorkspaceKey,
    pub status: OperationStatus,
    pub server_item: String,
    pub source_server_item: String,
    pub target_local_item: Option<PathBuf>,
    pub change_type: ChangeType,
}

/// Problem reported mid-operation that does not stop the operation
#[derive(Debug, Clone, PartialEq)]
pub struct NonFatalError {
    pub workspace: Option<WorkspaceKey>,
    pub message: String,
    pub severity: Severity,
    pub cause: Option<NonFatalCause>,
}

impl NonFatalError {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            workspace: None,
            message: message.into(),
            severity: Severity::Error,
            cause: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            workspace: None,
            message: message.into(),
            severity: Severity::Warning,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: NonFatalCause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_workspace(mut self, workspace: WorkspaceKey) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Errors escalate the exit code unless their cause is benign.
    pub fn escalates(&self) -> bool {
        self.severity == Severity::Error
            && !self.cause.as_ref().is_some_and(NonFatalCause::is_benign)
    }
}

/// Every kind of event the engine carries
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Get(GetEvent),

    NewPendingChange { workspace: WorkspaceKey, change: PendingChange },

    UndonePendingChange { workspace: WorkspaceKey, change: PendingChange },

    /// The pending set of a workspace changed and should be re-read
    PendingChangesChanged { workspace: WorkspaceKey },

    /// Candidate (detected but not pended) changes of a local workspace changed
    PendingChangeCandidatesChanged { workspace: WorkspaceKey },

    BeforeCheckinPendingChange { workspace: WorkspaceKey, change: PendingChange },

    BeforeShelvePendingChange { workspace: WorkspaceKey, change: PendingChange },

    Checkin {
        workspace: WorkspaceKey,
        changeset_id: u32,
        committed: Vec<PendingChange>,
        undone: Vec<PendingChange>,
    },

    Shelve {
        workspace: WorkspaceKey,
        shelveset: String,
        changes: Vec<PendingChange>,
        moved: bool,
    },

    Unshelve {
        workspace: WorkspaceKey,
        shelveset: String,
        changes: Vec<PendingChange>,
    },

    Conflict {
        workspace: WorkspaceKey,
        server_item: String,
        message: String,
        resolvable: bool,
    },

    ConflictResolved {
        workspace: WorkspaceKey,
        conflict_id: u32,
        server_item: String,
        changed: Vec<PendingChange>,
    },

    Merging(MergingEvent),

    NonFatalError(NonFatalError),

    OperationStarted { operation: OperationKind },

    OperationCompleted { operation: OperationKind },

    Destroy { server_item: String, version: i32 },

    BranchCommitted {
        source_server_item: String,
        target_server_item: String,
        changeset_id: u32,
    },

    BranchObjectUpdated { root_item: String },

    WorkspaceCreated { workspace: WorkspaceKey },

    WorkspaceDeleted { workspace: WorkspaceKey },

    WorkspaceUpdated { workspace: WorkspaceKey, original_name: String },

    /// Server folder contents changed (add, delete, rename) in a changeset
    FolderContentChanged { changeset_id: u32 },

    ChangesetReconciled { workspace: WorkspaceKey, changeset_id: u32 },

    ScannerModifiedFiles { workspace: WorkspaceKey, paths: Vec<PathBuf> },

    WorkItemsUpdated { ids: Vec<u32> },

    Labeled { label: String, items: Vec<String> },

    LocalWorkspaceScanCompleted { workspace: WorkspaceKey },
}

impl EventKind {
    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::Get(_) => EventCategory::Get,
            EventKind::NewPendingChange { .. } => EventCategory::NewPendingChange,
            EventKind::UndonePendingChange { .. } => EventCategory::UndonePendingChange,
            EventKind::PendingChangesChanged { .. } => EventCategory::PendingChangesChanged,
            EventKind::PendingChangeCandidatesChanged { .. } => {
                EventCategory::PendingChangeCandidatesChanged
            }
            EventKind::BeforeCheckinPendingChange { .. } => EventCategory::BeforeCheckinPendingChange,
            EventKind::BeforeShelvePendingChange { .. } => EventCategory::BeforeShelvePendingChange,
            EventKind::Checkin { .. } => EventCategory::Checkin,
            EventKind::Shelve { .. } => EventCategory::Shelve,
            EventKind::Unshelve { .. } => EventCategory::Unshelve,
            EventKind::Conflict { .. } => EventCategory::Conflict,
            EventKind::ConflictResolved { .. } => EventCategory::ConflictResolved,
            EventKind::Merging(_) => EventCategory::Merging,
            EventKind::NonFatalError(_) => EventCategory::NonFatalError,
            EventKind::OperationStarted { .. } => EventCategory::OperationStarted,
            EventKind::OperationCompleted { .. } => EventCategory::OperationCompleted,
            EventKind::Destroy { .. } => EventCategory::Destroy,
            EventKind::BranchCommitted { .. } => EventCategory::BranchCommitted,
            EventKind::BranchObjectUpdated { .. } => EventCategory::BranchObjectUpdated,
            EventKind::WorkspaceCreated { .. } => EventCategory::WorkspaceCreated,
            EventKind::WorkspaceDeleted { .. } => EventCategory::WorkspaceDeleted,
            EventKind::WorkspaceUpdated { .. } => EventCategory::WorkspaceUpdated,
            EventKind::FolderContentChanged { .. } => EventCategory::FolderContentChanged,
            EventKind::ChangesetReconciled { .. } => EventCategory::ChangesetReconciled,
            EventKind::ScannerModifiedFiles { .. } => EventCategory::ScannerModifiedFiles,
            EventKind::WorkItemsUpdated { .. } => EventCategory::WorkItemsUpdated,
            EventKind::Labeled { .. } => EventCategory::Labeled,
            EventKind::LocalWorkspaceScanCompleted { .. } => {
                EventCategory::LocalWorkspaceScanCompleted
            }
        }
    }
}

/// Key listeners register under; one per event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    Get,
    NewPendingChange,
    UndonePendingChange,
    PendingChangesChanged,
    PendingChangeCandidatesChanged,
    BeforeCheckinPendingChange,
    BeforeShelvePendingChange,
    Checkin,
    Shelve,
    Unshelve,
    Conflict,
    ConflictResolved,
    Merging,
    NonFatalError,
    OperationStarted,
    OperationCompleted,
    Destroy,
    BranchCommitted,
    BranchObjectUpdated,
    WorkspaceCreated,
    WorkspaceDeleted,
    WorkspaceUpdated,
    FolderContentChanged,
    ChangesetReconciled,
    ScannerModifiedFiles,
    WorkItemsUpdated,
    Labeled,
    LocalWorkspaceScanCompleted,
}

impl EventCategory {
    pub const ALL: [EventCategory; 28] = [
        EventCategory::Get,
        EventCategory::NewPendingChange,
        EventCategory::UndonePendingChange,
        EventCategory::PendingChangesChanged,
        EventCategory::PendingChangeCandidatesChanged,
        EventCategory::BeforeCheckinPendingChange,
        EventCategory::BeforeShelvePendingChange,
        EventCategory::Checkin,
        EventCategory::Shelve,
        EventCategory::Unshelve,
        EventCategory::Conflict,
        EventCategory::ConflictResolved,
        EventCategory::Merging,
        EventCategory::NonFatalError,
        EventCategory::OperationStarted,
        EventCategory::OperationCompleted,
        EventCategory::Destroy,
        EventCategory::BranchCommitted,
        EventCategory::BranchObjectUpdated,
        EventCategory::WorkspaceCreated,
        EventCategory::WorkspaceDeleted,
        EventCategory::WorkspaceUpdated,
        EventCategory::FolderContentChanged,
        EventCategory::ChangesetReconciled,
        EventCategory::ScannerModifiedFiles,
        EventCategory::WorkItemsUpdated,
        EventCategory::Labeled,
        EventCategory::LocalWorkspaceScanCompleted,
    ];

    /// Categories describing a single item being processed; these are what
    /// the summary threshold counts.
    pub fn is_item_operation(self) -> bool {
        matches!(
            self,
            EventCategory::Get
                | EventCategory::Merging
                | EventCategory::NewPendingChange
                | EventCategory::UndonePendingChange
                | EventCategory::Destroy
                | EventCategory::ConflictResolved
        )
    }
}
