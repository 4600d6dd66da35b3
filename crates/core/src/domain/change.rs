use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::CoreError;

/// Set of edits recorded by one pending change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChangeType(u32);

const NAMES: [(ChangeType, &str); 12] = [
    (ChangeType::ADD, "add"),
    (ChangeType::EDIT, "edit"),
    (ChangeType::ENCODING, "encoding"),
    (ChangeType::RENAME, "rename"),
    (ChangeType::DELETE, "delete"),
    (ChangeType::UNDELETE, "undelete"),
    (ChangeType::BRANCH, "branch"),
    (ChangeType::MERGE, "merge"),
    (ChangeType::LOCK, "lock"),
    (ChangeType::ROLLBACK, "rollback"),
    (ChangeType::SOURCE_RENAME, "source rename"),
    (ChangeType::PROPERTY, "property"),
];

impl ChangeType {
    pub const NONE: ChangeType = ChangeType(0);
    pub const ADD: ChangeType = ChangeType(1 << 0);
    pub const EDIT: ChangeType = ChangeType(1 << 1);
    pub const ENCODING: ChangeType = ChangeType(1 << 2);
    pub const RENAME: ChangeType = ChangeType(1 << 3);
    pub const DELETE: ChangeType = ChangeType(1 << 4);
    pub const UNDELETE: ChangeType = ChangeType(1 << 5);
    pub const BRANCH: ChangeType = ChangeType(1 << 6);
    pub const MERGE: ChangeType = ChangeType(1 << 7);
    pub const LOCK: ChangeType = ChangeType(1 << 8);
    pub const ROLLBACK: ChangeType = ChangeType(1 << 9);
    pub const SOURCE_RENAME: ChangeType = ChangeType(1 << 10);
    pub const PROPERTY: ChangeType = ChangeType(1 << 11);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: ChangeType) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: ChangeType) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ChangeType {
    type Output = ChangeType;

    fn bitor(self, rhs: ChangeType) -> ChangeType {
        ChangeType(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeType {
    fn bitor_assign(&mut self, rhs: ChangeType) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for ChangeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut change = ChangeType::NONE;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("none") {
                continue;
            }
            let flag = NAMES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))
                .map(|(flag, _)| *flag)
                .ok_or_else(|| CoreError::invalid_argument(format!("unknown change type '{}'", part)))?;
            change |= flag;
        }
        Ok(change)
    }
}

impl TryFrom<String> for ChangeType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChangeType> for String {
    fn from(value: ChangeType) -> Self {
        value.to_string()
    }
}

/// Lock held on a pending change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockLevel {
    #[default]
    None,
    Checkin,
    Checkout,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    File,
    Folder,
}
