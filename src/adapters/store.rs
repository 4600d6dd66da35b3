use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tfvc_core::domain::item::{PendingChange, WorkspaceInfo};
use tfvc_core::domain::path::server_path;
use tfvc_core::ports::{PendingChangeSource, WorkspaceCache};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Contents of one cached workspace file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub workspace: WorkspaceInfo,
    #[serde(default)]
    pub pending: Vec<PendingChange>,
}

/// Workspace cache and pending-change store over a directory of TOML files.
///
/// Every `*.toml` file anywhere below the root holds one workspace and its
/// pending set. Files that fail to parse are skipped with a warning so one
/// bad file does not hide the rest of the cache.
#[derive(Debug, Clone)]
pub struct TomlWorkspaceStore {
    root: PathBuf,
}

impl TomlWorkspaceStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All workspace files under the root, in path order
    fn find_files(&self) -> Result<Vec<(PathBuf, WorkspaceFile)>> {
        if !self.root.exists() {
            debug!("Workspace cache {} does not exist yet", self.root.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "toml") {
                continue;
            }

            match read_file(path) {
                Ok(file) => files.push((path.to_path_buf(), file)),
                Err(e) => warn!("Skipping workspace file {}: {:#}", path.display(), e),
            }
        }
        Ok(files)
    }

    fn find_file(&self, workspace: &WorkspaceInfo) -> Result<(PathBuf, WorkspaceFile)> {
        self.find_files()?
            .into_iter()
            .find(|(_, file)| {
                file.workspace.matches_name(&workspace.name)
                    && file.workspace.matches_owner(&workspace.owner)
                    && file.workspace.matches_server(&workspace.server_uri)
            })
            .with_context(|| format!("Workspace {} is not in the cache", workspace))
    }

    /// Write a workspace and its pending set, replacing any existing file
    /// for the same workspace.
    pub fn save(&self, workspace: &WorkspaceInfo, pending: &[PendingChange]) -> Result<PathBuf> {
        let path = match self.find_file(workspace) {
            Ok((path, _)) => path,
            Err(_) => self
                .root
                .join(format!("{}@{}.toml", workspace.name, workspace.owner)),
        };

        let file = WorkspaceFile {
            workspace: workspace.clone(),
            pending: pending.to_vec(),
        };
        write_file(&path, &file)?;
        info!("Saved workspace {} to {}", workspace, path.display());
        Ok(path)
    }
}

fn read_file(path: &Path) -> Result<WorkspaceFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read workspace file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse workspace file: {}", path.display()))
}

fn write_file(path: &Path, file: &WorkspaceFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create workspace cache directory")?;
    }
    let contents = toml::to_string_pretty(file).context("Failed to serialize workspace to TOML")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write workspace file: {}", path.display()))
}

impl WorkspaceCache for TomlWorkspaceStore {
    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>> {
        Ok(self
            .find_files()?
            .into_iter()
            .map(|(_, file)| file.workspace)
            .collect())
    }
}

impl PendingChangeSource for TomlWorkspaceStore {
    fn pending_changes(&self, workspace: &WorkspaceInfo) -> Result<Vec<PendingChange>> {
        let (_, file) = self.find_file(workspace)?;
        Ok(file.pending)
    }

    fn undo_pending_changes(
        &self,
        workspace: &WorkspaceInfo,
        changes: &[PendingChange],
    ) -> Result<Vec<PendingChange>> {
        let (path, mut file) = self.find_file(workspace)?;

        let mut undone = Vec::new();
        file.pending.retain(|pending| {
            let selected = changes
                .iter()
                .any(|c| server_path::equals(&c.server_item, &pending.server_item));
            if selected {
                undone.push(pending.clone());
            }
            !selected
        });

        if !undone.is_empty() {
            write_file(&path, &file)?;
        }
        debug!("Undid {} of {} requested change(s)", undone.len(), changes.len());
        Ok(undone)
    }
}
