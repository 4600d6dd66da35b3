use crate::domain::item::{PendingChange, WorkspaceInfo};
use anyhow::Result;

/// Access to the server-side pending set of a workspace
pub trait PendingChangeSource: Send + Sync {
    /// Current pending changes of `workspace`, in server order
    fn pending_changes(&self, workspace: &WorkspaceInfo) -> Result<Vec<PendingChange>>;

    /// Undo the given changes; returns the ones that were actually undone
    fn undo_pending_changes(
        &self,
        workspace: &WorkspaceInfo,
        changes: &[PendingChange],
    ) -> Result<Vec<PendingChange>>;
}
