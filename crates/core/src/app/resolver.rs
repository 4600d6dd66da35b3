use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::domain::item::{WorkspaceInfo, WorkspaceSpec};
use crate::domain::path::{local_path, server_path};
use crate::error::{CoreError, Result, WorkspaceError};
use crate::ports::WorkspaceCache;

/// Picks the workspace a command operates on.
///
/// An explicit `name[;owner]` option always wins. Otherwise the local path
/// arguments are tried in the order given, then the current directory.
pub struct WorkspaceResolver {
    cache: Arc<dyn WorkspaceCache>,
    cwd: PathBuf,
    workspace_option: Option<String>,
    server_filter: Option<String>,
}

impl WorkspaceResolver {
    pub fn new(cache: Arc<dyn WorkspaceCache>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            cwd: cwd.into(),
            workspace_option: None,
            server_filter: None,
        }
    }

    /// The value of a `--workspace name[;owner]` option.
    pub fn with_workspace_option(mut self, spec: Option<String>) -> Self {
        self.workspace_option = spec;
        self
    }

    /// Only consider workspaces on this collection.
    pub fn with_server_filter(mut self, server_uri: Option<String>) -> Self {
        self.server_filter = server_uri;
        self
    }

    /// Resolve the workspace for `path_args`.
    ///
    /// With `ignore_workspace_option` the explicit option is skipped and only
    /// path inference is used.
    pub fn determine_cached_workspace(
        &self,
        path_args: &[String],
        ignore_workspace_option: bool,
    ) -> Result<WorkspaceInfo> {
        if !ignore_workspace_option {
            if let Some(option) = &self.workspace_option {
                return self.workspace_from_option(option);
            }
        }

        for arg in path_args {
            if server_path::is_server_path(arg) {
                continue;
            }
            let path = local_path::canonicalize(arg, &self.cwd);
            if let Some(ws) = self.workspace_for_path(&path)? {
                debug!("Workspace {} inferred from argument {}", ws, arg);
                return Ok(ws);
            }
        }

        if let Some(ws) = self.workspace_for_path(&self.cwd)? {
            debug!("Workspace {} inferred from current directory", ws);
            return Ok(ws);
        }

        Err(WorkspaceError::CouldNotDetermine.into())
    }

    /// Like [`determine_cached_workspace`](Self::determine_cached_workspace),
    /// but an undeterminable workspace is `Ok(None)` for commands that can
    /// run without one. Not-found and ambiguity errors still propagate.
    pub fn try_determine_cached_workspace(
        &self,
        path_args: &[String],
        ignore_workspace_option: bool,
    ) -> Result<Option<WorkspaceInfo>> {
        match self.determine_cached_workspace(path_args, ignore_workspace_option) {
            Ok(ws) => Ok(Some(ws)),
            Err(CoreError::Workspace(WorkspaceError::CouldNotDetermine)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn workspace_from_option(&self, option: &str) -> Result<WorkspaceInfo> {
        let spec: WorkspaceSpec = option.parse()?;
        let mut matches = self.cache.query_workspaces(
            self.server_filter.as_deref(),
            Some(&spec.name),
            spec.owner.as_deref(),
        )?;

        match (matches.len(), spec.owner) {
            (0, _) => Err(WorkspaceError::NotFound {
                spec: option.to_string(),
            }
            .into()),
            (1, _) => Ok(matches.remove(0)),
            (candidates, None) => Err(WorkspaceError::AmbiguousName {
                name: spec.name,
                candidates,
            }
            .into()),
            (candidates, Some(owner)) => Err(WorkspaceError::StillAmbiguous {
                name: spec.name,
                owner,
                candidates,
            }
            .into()),
        }
    }

    fn workspace_for_path(&self, path: &Path) -> Result<Option<WorkspaceInfo>> {
        let found = self.cache.workspace_for_local_path(path)?;
        Ok(found.filter(|ws| {
            self.server_filter
                .as_deref()
                .map_or(true, |uri| ws.matches_server(uri))
        }))
    }
}
