use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-item outcome reported by get, merge and undo operations.
///
/// The set is closed: display and exit-code logic match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Getting,
    Replacing,
    Deleting,
    Conflict,
    SourceWritable,
    TargetWritable,
    TargetLocalPending,
    SourceDirectoryNotEmpty,
    TargetIsDirectory,
    UnableToRefresh,
}

impl OperationStatus {
    pub const ALL: [OperationStatus; 10] = [
        OperationStatus::Getting,
        OperationStatus::Replacing,
        OperationStatus::Deleting,
        OperationStatus::Conflict,
        OperationStatus::SourceWritable,
        OperationStatus::TargetWritable,
        OperationStatus::TargetLocalPending,
        OperationStatus::SourceDirectoryNotEmpty,
        OperationStatus::TargetIsDirectory,
        OperationStatus::UnableToRefresh,
    ];

    pub fn is_conflict(self) -> bool {
        self == OperationStatus::Conflict
    }

    /// Statuses where the item was left untouched and the operation only
    /// partially succeeded.
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            OperationStatus::SourceWritable
                | OperationStatus::TargetWritable
                | OperationStatus::TargetLocalPending
                | OperationStatus::SourceDirectoryNotEmpty
                | OperationStatus::TargetIsDirectory
                | OperationStatus::UnableToRefresh
        )
    }

    /// Whether an item reported with this status escalates the exit code.
    pub fn escalates(self) -> bool {
        self.is_conflict() || self.is_warning()
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStatus::Getting => "getting",
            OperationStatus::Replacing => "replacing",
            OperationStatus::Deleting => "deleting",
            OperationStatus::Conflict => "conflict",
            OperationStatus::SourceWritable => "source writable",
            OperationStatus::TargetWritable => "target writable",
            OperationStatus::TargetLocalPending => "target has a local pending change",
            OperationStatus::SourceDirectoryNotEmpty => "source directory not empty",
            OperationStatus::TargetIsDirectory => "target is a directory",
            OperationStatus::UnableToRefresh => "unable to refresh",
        };
        f.write_str(s)
    }
}

/// Severity of a non-fatal problem raised while an operation is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// What went wrong underneath a non-fatal error, when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonFatalCause {
    /// The configured caching proxy could not be reached; the server was
    /// used directly instead.
    ProxyUnavailable { proxy_url: String },
    Network(String),
    Io(String),
    Other(String),
}

impl NonFatalCause {
    /// Causes that are reported but never change the outcome of a command.
    pub fn is_benign(&self) -> bool {
        matches!(self, NonFatalCause::ProxyUnavailable { .. })
    }
}

impl fmt::Display for NonFatalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonFatalCause::ProxyUnavailable { proxy_url } => {
                write!(f, "proxy {} is unavailable", proxy_url)
            }
            NonFatalCause::Network(msg) => write!(f, "network: {}", msg),
            NonFatalCause::Io(msg) => write!(f, "io: {}", msg),
            NonFatalCause::Other(msg) => f.write_str(msg),
        }
    }
}

/// Top-level version-control operations that bracket their item events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Get,
    Checkin,
    Merge,
    Undo,
    Pend,
    Shelve,
    Unshelve,
    Resolve,
    Destroy,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Get => "get",
            OperationKind::Checkin => "checkin",
            OperationKind::Merge => "merge",
            OperationKind::Undo => "undo",
            OperationKind::Pend => "pend",
            OperationKind::Shelve => "shelve",
            OperationKind::Unshelve => "unshelve",
            OperationKind::Resolve => "resolve",
            OperationKind::Destroy => "destroy",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes_are_disjoint() {
        for status in OperationStatus::ALL {
            assert!(!(status.is_conflict() && status.is_warning()), "{status}");
        }
    }

    #[test]
    fn test_plain_progress_statuses_do_not_escalate() {
        assert!(!OperationStatus::Getting.escalates());
        assert!(!OperationStatus::Replacing.escalates());
        assert!(!OperationStatus::Deleting.escalates());
        assert!(OperationStatus::Conflict.escalates());
        assert!(OperationStatus::UnableToRefresh.escalates());
    }

    #[test]
    fn test_only_proxy_cause_is_benign() {
        let proxy = NonFatalCause::ProxyUnavailable {
            proxy_url: "http://proxy:8081".to_string(),
        };
        assert!(proxy.is_benign());
        assert!(!NonFatalCause::Network("reset".to_string()).is_benign());
    }
}
