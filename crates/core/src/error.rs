use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Invalid server path: {path}")]
    InvalidServerPath { path: String },

    #[error("Invalid version spec: {spec}")]
    InvalidVersionSpec { spec: String },

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("No pending changes were found for {}", arguments.join(", "))]
    NoMatchingPendingChanges { arguments: Vec<String> },

    #[error("Port error: {source}")]
    Port { source: anyhow::Error },
}

impl CoreError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// True for failures to locate a workspace, which some commands tolerate.
    pub fn is_workspace_resolution(&self) -> bool {
        matches!(self, Self::Workspace(_))
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(source: anyhow::Error) -> Self {
        Self::Port { source }
    }
}

/// Failures to pick a workspace out of the local cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("The workspace {spec} could not be found")]
    NotFound { spec: String },

    #[error("The workspace name {name} is ambiguous ({candidates} matches); specify an owner")]
    AmbiguousName { name: String, candidates: usize },

    #[error("The workspace {name};{owner} is still ambiguous ({candidates} matches in the cache)")]
    StillAmbiguous {
        name: String,
        owner: String,
        candidates: usize,
    },

    #[error("Unable to determine the workspace from the arguments or the current directory")]
    CouldNotDetermine,
}

pub type Result<T> = std::result::Result<T, CoreError>;
