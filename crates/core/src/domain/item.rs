use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::change::{ChangeType, ItemType, LockLevel};
use super::path::{local_path, server_path};
use crate::error::CoreError;

/// One recorded, not yet committed edit against a versioned item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub server_item: String,
    #[serde(default)]
    pub local_item: Option<PathBuf>,
    /// Server path the item had before a pending rename or branch
    #[serde(default)]
    pub source_server_item: Option<String>,
    #[serde(default)]
    pub source_local_item: Option<PathBuf>,
    pub change_type: ChangeType,
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub lock_level: LockLevel,
}

impl PendingChange {
    pub fn new(server_item: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            server_item: server_item.into(),
            local_item: None,
            source_server_item: None,
            source_local_item: None,
            change_type,
            item_type: ItemType::File,
            version: 0,
            lock_level: LockLevel::None,
        }
    }

    pub fn with_local_item(mut self, local_item: impl Into<PathBuf>) -> Self {
        self.local_item = Some(local_item.into());
        self
    }

    pub fn with_source_local_item(mut self, source_local_item: impl Into<PathBuf>) -> Self {
        self.source_local_item = Some(source_local_item.into());
        self
    }

    pub fn with_source_server_item(mut self, source_server_item: impl Into<String>) -> Self {
        self.source_server_item = Some(source_server_item.into());
        self
    }

    /// Local path to display or compare: the current local item, or the
    /// source local item for changes that no longer have one (pending deletes).
    pub fn effective_local_item(&self) -> Option<&Path> {
        self.local_item
            .as_deref()
            .or(self.source_local_item.as_deref())
    }

    /// Server path to fall back to when neither local item is known.
    pub fn effective_server_item(&self) -> &str {
        self.source_server_item
            .as_deref()
            .unwrap_or(&self.server_item)
    }

    pub fn is_pending_delete(&self) -> bool {
        self.change_type.contains(ChangeType::DELETE)
    }
}

impl fmt::Display for PendingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective_local_item() {
            Some(local) => write!(f, "{} [{}]", local.display(), self.change_type),
            None => write!(f, "{} [{}]", self.server_item, self.change_type),
        }
    }
}

/// `name;owner` pair identifying a workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceKey {
    pub name: String,
    pub owner: String,
}

impl fmt::Display for WorkspaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.name, self.owner)
    }
}

/// User-supplied workspace specifier, `name[;owner]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSpec {
    pub name: String,
    pub owner: Option<String>,
}

impl FromStr for WorkspaceSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, owner) = match s.split_once(';') {
            Some((name, owner)) => (name.trim(), Some(owner.trim())),
            None => (s.trim(), None),
        };

        if name.is_empty() {
            return Err(CoreError::invalid_argument(format!(
                "'{}' is not a valid workspace specification",
                s
            )));
        }

        let owner = match owner {
            Some("") => {
                return Err(CoreError::invalid_argument(format!(
                    "'{}' has an empty workspace owner",
                    s
                )))
            }
            other => other.map(str::to_string),
        };

        Ok(Self {
            name: name.to_string(),
            owner,
        })
    }
}

impl fmt::Display for WorkspaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{};{}", self.name, owner),
            None => f.write_str(&self.name),
        }
    }
}

/// Mapping between a server folder and a local folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingFolder {
    pub server_item: String,
    pub local_item: PathBuf,
    #[serde(default)]
    pub cloaked: bool,
}

/// A workspace as recorded in the local workspace cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub computer: String,
    pub server_uri: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub working_folders: Vec<WorkingFolder>,
}

impl WorkspaceInfo {
    pub fn key(&self) -> WorkspaceKey {
        WorkspaceKey {
            name: self.name.clone(),
            owner: self.owner.clone(),
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn matches_owner(&self, owner: &str) -> bool {
        self.owner.eq_ignore_ascii_case(owner)
    }

    /// Server URIs compare without case and without a trailing slash.
    pub fn matches_server(&self, server_uri: &str) -> bool {
        normalize_uri(&self.server_uri) == normalize_uri(server_uri)
    }

    /// Local folders mapped by this workspace, cloaks excluded.
    pub fn mapped_paths(&self) -> impl Iterator<Item = &Path> {
        self.working_folders
            .iter()
            .filter(|wf| !wf.cloaked)
            .map(|wf| wf.local_item.as_path())
    }

    /// Depth of the deepest mapped folder containing `path`, if any.
    pub fn mapping_depth(&self, path: &Path) -> Option<usize> {
        self.mapped_paths()
            .filter(|mapped| local_path::is_same_or_child(mapped, path))
            .map(|mapped| mapped.components().count())
            .max()
    }

    pub fn maps_local_path(&self, path: &Path) -> bool {
        self.mapping_depth(path).is_some()
    }

    /// Translate a server item to its local path through the closest
    /// working folder. Items under a cloak have no local path.
    pub fn server_to_local(&self, server_item: &str) -> Option<PathBuf> {
        let closest = self
            .working_folders
            .iter()
            .filter(|wf| server_path::is_same_or_child(&wf.server_item, server_item))
            .max_by_key(|wf| wf.server_item.len())?;

        if closest.cloaked {
            return None;
        }

        let relative = server_path::make_relative(server_item, &closest.server_item)?;
        if relative.is_empty() {
            return Some(closest.local_item.clone());
        }
        Some(closest.local_item.join(relative.replace('/', std::path::MAIN_SEPARATOR_STR)))
    }
}

impl fmt::Display for WorkspaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{} ({})", self.name, self.owner, self.server_uri)
    }
}

pub fn normalize_uri(uri: &str) -> String {
    uri.trim_end_matches('/').to_lowercase()
}
