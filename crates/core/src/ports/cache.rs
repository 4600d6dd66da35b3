use crate::domain::item::WorkspaceInfo;
use anyhow::Result;
use std::path::Path;

/// Query interface over the locally cached workspace definitions
pub trait WorkspaceCache: Send + Sync {
    /// All locally cached workspaces
    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>>;

    /// Workspaces matching every filter that is given. Names and owners
    /// compare case-insensitively.
    fn query_workspaces(
        &self,
        server_uri: Option<&str>,
        name: Option<&str>,
        owner: Option<&str>,
    ) -> Result<Vec<WorkspaceInfo>> {
        Ok(self
            .workspaces()?
            .into_iter()
            .filter(|ws| server_uri.map_or(true, |uri| ws.matches_server(uri)))
            .filter(|ws| name.map_or(true, |name| ws.matches_name(name)))
            .filter(|ws| owner.map_or(true, |owner| ws.matches_owner(owner)))
            .collect())
    }

    /// The workspace whose working folders contain `path`. When several do,
    /// the one with the deepest mapping wins; on equal depth, the first in
    /// cache order.
    fn workspace_for_local_path(&self, path: &Path) -> Result<Option<WorkspaceInfo>> {
        Ok(self
            .workspaces()?
            .into_iter()
            .filter_map(|ws| ws.mapping_depth(path).map(|depth| (depth, ws)))
            .fold(None, |best: Option<(usize, WorkspaceInfo)>, (depth, ws)| match best {
                Some((best_depth, _)) if best_depth >= depth => best,
                _ => Some((depth, ws)),
            })
            .map(|(_, ws)| ws))
    }
}
