use std::fmt;
use std::str::FromStr;

use super::item::WorkspaceSpec;
use crate::error::CoreError;

/// Version of an item named on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Changeset(u32),
    Latest,
    /// `W` alone means the workspace the command runs against
    Workspace(Option<WorkspaceSpec>),
    Label { label: String, scope: Option<String> },
    /// Dates are passed through to the server unparsed
    Date(String),
}

impl FromStr for VersionSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidVersionSpec { spec: s.to_string() };

        let mut chars = s.chars();
        let prefix = chars.next().ok_or_else(invalid)?;
        let rest = chars.as_str();

        if prefix.is_ascii_digit() {
            return s.parse().map(VersionSpec::Changeset).map_err(|_| invalid());
        }

        match prefix.to_ascii_uppercase() {
            'C' => rest.parse().map(VersionSpec::Changeset).map_err(|_| invalid()),
            'T' if rest.is_empty() => Ok(VersionSpec::Latest),
            'W' if rest.is_empty() => Ok(VersionSpec::Workspace(None)),
            'W' => rest
                .parse()
                .map(|spec| VersionSpec::Workspace(Some(spec)))
                .map_err(|_| invalid()),
            'L' if !rest.is_empty() => {
                let (label, scope) = match rest.split_once('@') {
                    Some((label, scope)) => (label, Some(scope.to_string())),
                    None => (rest, None),
                };
                if label.is_empty() {
                    return Err(invalid());
                }
                Ok(VersionSpec::Label {
                    label: label.to_string(),
                    scope,
                })
            }
            'D' if !rest.is_empty() => Ok(VersionSpec::Date(rest.to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Changeset(id) => write!(f, "C{}", id),
            VersionSpec::Latest => f.write_str("T"),
            VersionSpec::Workspace(None) => f.write_str("W"),
            VersionSpec::Workspace(Some(spec)) => write!(f, "W{}", spec),
            VersionSpec::Label { label, scope: None } => write!(f, "L{}", label),
            VersionSpec::Label {
                label,
                scope: Some(scope),
            } => write!(f, "L{}@{}", label, scope),
            VersionSpec::Date(date) => write!(f, "D{}", date),
        }
    }
}

/// A path argument with an optional deletion id and version (range)
///
/// Syntax: `path[;X<deletionId>][;<version>[~<version>]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedItem {
    pub path: String,
    pub deletion_id: Option<u32>,
    pub version: Option<VersionSpec>,
    pub version_to: Option<VersionSpec>,
}

impl QualifiedItem {
    pub fn is_range(&self) -> bool {
        self.version_to.is_some()
    }
}

impl FromStr for QualifiedItem {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, mut rest) = match s.split_once(';') {
            Some((path, rest)) => (path, Some(rest)),
            None => (s, None),
        };

        if path.trim().is_empty() {
            return Err(CoreError::invalid_argument(format!(
                "'{}' does not name an item",
                s
            )));
        }

        let mut deletion_id = None;
        if let Some(spec) = rest {
            let (head, tail) = match spec.split_once(';') {
                Some((head, tail)) => (head, Some(tail)),
                None => (spec, None),
            };
            if let Some(id) = head.strip_prefix(['X', 'x']) {
                let id = id.parse().map_err(|_| {
                    CoreError::invalid_argument(format!("'{}' has an invalid deletion id", s))
                })?;
                deletion_id = Some(id);
                rest = tail;
            }
        }

        let (version, version_to) = match rest {
            None => (None, None),
            Some(spec) => match spec.split_once('~') {
                Some((from, to)) => (Some(from.parse()?), Some(to.parse()?)),
                None => (Some(spec.parse()?), None),
            },
        };

        Ok(Self {
            path: path.to_string(),
            deletion_id,
            version,
            version_to,
        })
    }
}

impl fmt::Display for QualifiedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(id) = self.deletion_id {
            write!(f, ";X{}", id)?;
        }
        if let Some(version) = &self.version {
            write!(f, ";{}", version)?;
        }
        if let Some(version_to) = &self.version_to {
            write!(f, "~{}", version_to)?;
        }
        Ok(())
    }
}
