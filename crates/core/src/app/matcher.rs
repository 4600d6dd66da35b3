//! Matching free path arguments against a workspace's pending changes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::domain::item::{PendingChange, WorkspaceInfo};
use crate::domain::path::{is_wildcard, local_path, matches_wildcard, server_path};
use crate::error::{CoreError, Result};
use crate::ports::LocalItems;

const LOCAL_CASE_SENSITIVE: bool = !cfg!(windows);

/// Changes selected by a set of path arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub changes: Vec<PendingChange>,
    /// Wildcard arguments that matched nothing. Not an error.
    pub unmatched_wildcards: Vec<String>,
}

/// Selects the pending changes named by free path arguments.
pub struct PendingChangeMatcher {
    local_items: Arc<dyn LocalItems>,
    cwd: PathBuf,
}

impl PendingChangeMatcher {
    pub fn new(local_items: Arc<dyn LocalItems>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            local_items,
            cwd: cwd.into(),
        }
    }

    /// Select the changes in `changes` that any of `paths` names.
    ///
    /// Paths may be server paths (`$/...`) or local paths relative to the
    /// current directory, with `*`/`?` wildcards in the last segment.
    /// Results keep the order of `changes` and hold each change once.
    ///
    /// Fails with [`CoreError::NoMatchingPendingChanges`] if any argument
    /// without a wildcard matched nothing; wildcard arguments that matched
    /// nothing are listed in [`MatchOutcome::unmatched_wildcards`].
    pub fn match_pending_changes(
        &self,
        workspace: &WorkspaceInfo,
        changes: &[PendingChange],
        recursive: bool,
        paths: &[String],
    ) -> Result<MatchOutcome> {
        let mut arguments: Vec<Option<MatchedFileArgument>> = paths.iter().map(|_| None).collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut selected = Vec::new();

        for change in changes {
            for (i, path) in paths.iter().enumerate() {
                if arguments[i].is_none() {
                    arguments[i] = Some(self.classify(path)?);
                }
                let Some(argument) = arguments[i].as_mut() else {
                    continue;
                };

                if !argument.matches(change, workspace, recursive) {
                    continue;
                }
                argument.matched = true;

                if seen.insert(change.server_item.to_lowercase()) {
                    debug!("{} matched pending change {}", argument.exact, change.server_item);
                    selected.push(change.clone());
                }
            }
        }

        let mut unmatched_wildcards = Vec::new();
        let mut failed = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            let argument = match arguments[i].take() {
                Some(argument) => argument,
                None => self.classify(path)?,
            };
            if argument.matched {
                continue;
            }
            if argument.is_wildcard() {
                unmatched_wildcards.push(argument.exact);
            } else {
                failed.push(argument.exact);
            }
        }

        if !failed.is_empty() {
            return Err(CoreError::NoMatchingPendingChanges { arguments: failed });
        }

        Ok(MatchOutcome {
            changes: selected,
            unmatched_wildcards,
        })
    }

    fn classify(&self, exact: &str) -> Result<MatchedFileArgument> {
        if server_path::is_server_path(exact) {
            let full = server_path::canonicalize(exact)?;
            let (folder, file_part) = match server_path::parent(&full) {
                Some(parent) => (
                    parent.to_string(),
                    Some(server_path::file_name(&full).to_string()),
                ),
                None => (full.clone(), None),
            };
            return Ok(MatchedFileArgument {
                exact: exact.to_string(),
                target: Target::Server { full, folder },
                file_part,
                matched: false,
            });
        }

        let full = local_path::canonicalize(exact, &self.cwd);
        let name = local_path::file_name(&full).map(str::to_string);
        let names_directory =
            !name.as_deref().is_some_and(is_wildcard) && self.local_items.is_directory(&full);

        let (folder, file_part) = match (names_directory, full.parent(), name) {
            (false, Some(parent), Some(name)) => (parent.to_path_buf(), Some(name)),
            _ => (full.clone(), None),
        };

        Ok(MatchedFileArgument {
            exact: exact.to_string(),
            target: Target::Local { folder },
            file_part,
            matched: false,
        })
    }
}

enum Target {
    Server { full: String, folder: String },
    Local { folder: PathBuf },
}

/// Per-argument scratch state for one matching pass
struct MatchedFileArgument {
    exact: String,
    target: Target,
    file_part: Option<String>,
    matched: bool,
}

impl MatchedFileArgument {
    fn is_wildcard(&self) -> bool {
        self.file_part.as_deref().is_some_and(is_wildcard)
    }

    fn matches(&self, change: &PendingChange, workspace: &WorkspaceInfo, recursive: bool) -> bool {
        match &self.target {
            Target::Server { full, folder } => {
                let item = change.server_item.as_str();
                let direct = server_path::equals(full, item)
                    || (recursive && server_path::is_child(full, item));
                direct || server_wildcard_match(item, folder, self.file_part.as_deref(), recursive)
            }
            Target::Local { folder } => match local_comparison_path(change, workspace) {
                Some(item) => {
                    local_wildcard_match(&item, folder, self.file_part.as_deref(), recursive)
                }
                None => false,
            },
        }
    }
}

/// Local path a change is compared under. Changes with no local item of
/// their own (such as pending deletes) fall back to their source local
/// item, then to their server item mapped through the workspace.
fn local_comparison_path(change: &PendingChange, workspace: &WorkspaceInfo) -> Option<PathBuf> {
    if let Some(local) = change.effective_local_item() {
        return Some(local.to_path_buf());
    }
    workspace.server_to_local(change.effective_server_item())
}

fn server_wildcard_match(item: &str, folder: &str, file_part: Option<&str>, recursive: bool) -> bool {
    let Some(pattern) = file_part else {
        return server_path::equals(item, folder)
            || (recursive && server_path::is_child(folder, item));
    };

    let in_scope = if recursive {
        server_path::is_child(folder, item)
    } else {
        server_path::parent(item).is_some_and(|parent| server_path::equals(parent, folder))
    };
    in_scope && matches_wildcard(server_path::file_name(item), pattern, false)
}

fn local_wildcard_match(item: &Path, folder: &Path, file_part: Option<&str>, recursive: bool) -> bool {
    let Some(pattern) = file_part else {
        return item == folder || (recursive && local_path::is_child(folder, item));
    };

    // A literal name that is not on disk may still be a folder (a pending
    // delete, say); with recursion its contents match too.
    if recursive && !is_wildcard(pattern) && local_path::is_child(&folder.join(pattern), item) {
        return true;
    }

    let in_scope = if recursive {
        local_path::is_child(folder, item)
    } else {
        item.parent() == Some(folder)
    };
    in_scope
        && local_path::file_name(item)
            .is_some_and(|name| matches_wildcard(name, pattern, LOCAL_CASE_SENSITIVE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::ChangeType;
    use crate::domain::item::WorkingFolder;

    struct Dirs(Vec<PathBuf>);

    impl LocalItems for Dirs {
        fn is_directory(&self, path: &Path) -> bool {
            self.0.iter().any(|d| d == path)
        }
    }

    fn workspace() -> WorkspaceInfo {
        WorkspaceInfo {
            name: "ws".to_string(),
            owner: "alice".to_string(),
            computer: "box".to_string(),
            server_uri: "http://tfs:8080/tfs/DefaultCollection".to_string(),
            comment: None,
            working_folders: vec![WorkingFolder {
                server_item: "$/proj".to_string(),
                local_item: PathBuf::from("/proj"),
                cloaked: false,
            }],
        }
    }

    fn edit(name: &str) -> PendingChange {
        PendingChange::new(format!("$/proj/{}", name), ChangeType::EDIT)
            .with_local_item(format!("/proj/{}", name))
    }

    fn matcher(dirs: &[&str]) -> PendingChangeMatcher {
        let dirs = dirs.iter().map(PathBuf::from).collect();
        PendingChangeMatcher::new(Arc::new(Dirs(dirs)), "/proj")
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn server_items(outcome: &MatchOutcome) -> Vec<&str> {
        outcome.changes.iter().map(|c| c.server_item.as_str()).collect()
    }

    #[test]
    fn test_relative_file_argument() {
        let changes = vec![edit("a.txt"), edit("b.txt")];
        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &changes, false, &args(&["a.txt"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt"]);
    }

    #[test]
    fn test_wildcard_matches_every_file_in_folder() {
        let changes = vec![edit("a.txt"), edit("b.txt"), edit("sub/c.txt")];
        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &changes, false, &args(&["*.txt"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt", "$/proj/b.txt"]);
    }

    #[test]
    fn test_recursive_wildcard_reaches_subfolders() {
        let changes = vec![edit("a.txt"), edit("sub/c.txt"), edit("sub/d.log")];
        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &changes, true, &args(&["*.txt"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt", "$/proj/sub/c.txt"]);
    }

    #[test]
    fn test_missing_literal_argument_fails_whole_batch() {
        let changes = vec![edit("a.txt"), edit("b.txt")];
        let err = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &changes, false, &args(&["a.txt", "c.txt"]))
            .unwrap_err();
        match err {
            CoreError::NoMatchingPendingChanges { arguments } => {
                assert_eq!(arguments, vec!["c.txt".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmatched_wildcard_is_only_reported() {
        let changes = vec![edit("a.txt"), edit("b.txt")];
        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &changes, false, &args(&["*.log", "a.txt"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt"]);
        assert_eq!(outcome.unmatched_wildcards, vec!["*.log".to_string()]);

        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &changes, false, &args(&["*.log"]))
            .unwrap();
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn test_directory_argument() {
        let changes = vec![edit("a.txt"), edit("sub/c.txt"), edit("sub/deeper/d.txt")];
        let m = matcher(&["/proj", "/proj/sub"]);

        let err = m
            .match_pending_changes(&workspace(), &changes, false, &args(&["sub"]))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoMatchingPendingChanges { .. }));

        let outcome = m
            .match_pending_changes(&workspace(), &changes, true, &args(&["sub"]))
            .unwrap();
        assert_eq!(
            server_items(&outcome),
            vec!["$/proj/sub/c.txt", "$/proj/sub/deeper/d.txt"]
        );
    }

    #[test]
    fn test_server_argument_file_and_folder_forms() {
        let changes = vec![edit("a.txt"), edit("sub/c.txt")];
        let m = matcher(&[]);

        let outcome = m
            .match_pending_changes(&workspace(), &changes, false, &args(&["$/PROJ/a.txt"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt"]);

        // A server folder is matched directly without asking the server
        // whether it is a folder.
        let outcome = m
            .match_pending_changes(&workspace(), &changes, true, &args(&["$/proj/sub"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/sub/c.txt"]);

        let outcome = m
            .match_pending_changes(&workspace(), &changes, false, &args(&["$/proj/*.TXT"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt"]);
    }

    #[test]
    fn test_change_matching_several_arguments_is_listed_once() {
        let changes = vec![edit("a.txt"), edit("b.txt")];
        let outcome = matcher(&["/proj"])
            .match_pending_changes(
                &workspace(),
                &changes,
                false,
                &args(&["a.txt", "*.txt", "$/proj/a.txt"]),
            )
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/a.txt", "$/proj/b.txt"]);
    }

    #[test]
    fn test_pending_delete_uses_source_local_item() {
        let deleted = PendingChange::new("$/proj/gone.txt", ChangeType::DELETE)
            .with_source_local_item("/proj/gone.txt");
        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &[deleted], false, &args(&["gone.txt"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/gone.txt"]);
    }

    #[test]
    fn test_change_without_local_items_maps_server_item() {
        let deleted = PendingChange::new("$/proj/old/gone.txt", ChangeType::DELETE);
        let outcome = matcher(&["/proj"])
            .match_pending_changes(&workspace(), &[deleted], true, &args(&["old"]))
            .unwrap();
        assert_eq!(server_items(&outcome), vec!["$/proj/old/gone.txt"]);
    }

    #[test]
    fn test_matching_has_no_side_effects() {
        let changes = vec![edit("a.txt"), edit("b.txt")];
        let m = matcher(&["/proj"]);
        let paths = args(&["*.txt"]);
        let first = m.match_pending_changes(&workspace(), &changes, false, &paths).unwrap();
        let second = m.match_pending_changes(&workspace(), &changes, false, &paths).unwrap();
        assert_eq!(first, second);
        assert_eq!(changes, vec![edit("a.txt"), edit("b.txt")]);
    }

    #[test]
    fn test_invalid_server_argument() {
        let err = matcher(&[])
            .match_pending_changes(&workspace(), &[], false, &args(&["$/.."]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidServerPath { .. }));
    }
}
