//! Server and local path helpers.
//!
//! Server paths look like `$/Project/folder/file.txt`, use `/` separators and
//! compare case-insensitively. Local paths are normalized lexically against an
//! explicit working directory and compare exactly.

use glob::{MatchOptions, Pattern};

/// True when the final path segment contains a `*` or `?` wildcard.
pub fn is_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?'])
}

/// Match a single path segment against a `*`/`?` wildcard.
///
/// Any other glob metacharacters in the pattern are taken literally.
pub fn matches_wildcard(name: &str, wildcard: &str, case_sensitive: bool) -> bool {
    let mut escaped = String::with_capacity(wildcard.len());
    for c in wildcard.chars() {
        if c == '*' || c == '?' {
            escaped.push(c);
        } else {
            escaped.push_str(&Pattern::escape(c.encode_utf8(&mut [0u8; 4])));
        }
    }

    let options = MatchOptions {
        case_sensitive,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    Pattern::new(&escaped)
        .map(|pattern| pattern.matches_with(name, options))
        .unwrap_or(false)
}

pub mod server_path {
    use crate::error::{CoreError, Result};

    pub const ROOT: &str = "$/";
    pub const SEPARATOR: char = '/';

    /// True for `$`, `$/...` and the backslash spelling `$\...`.
    pub fn is_server_path(path: &str) -> bool {
        path == "$" || path.starts_with("$/") || path.starts_with("$\\")
    }

    /// Collapse separators, `.` and `..` into the canonical `$/a/b` form.
    pub fn canonicalize(path: &str) -> Result<String> {
        if !is_server_path(path) {
            return Err(CoreError::InvalidServerPath {
                path: path.to_string(),
            });
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in path[1..].split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(CoreError::InvalidServerPath {
                            path: path.to_string(),
                        });
                    }
                }
                other => segments.push(other),
            }
        }

        Ok(format!("{}{}", ROOT, segments.join("/")))
    }

    pub fn is_root(path: &str) -> bool {
        path == ROOT || path == "$"
    }

    /// Parent folder of a canonical server path; `None` for the root.
    pub fn parent(path: &str) -> Option<&str> {
        if is_root(path) {
            return None;
        }
        match path.rfind(SEPARATOR) {
            Some(1) => Some(ROOT),
            Some(idx) => Some(&path[..idx]),
            None => None,
        }
    }

    /// Last segment of a canonical server path; empty for the root.
    pub fn file_name(path: &str) -> &str {
        if is_root(path) {
            return "";
        }
        path.rsplit(SEPARATOR).next().unwrap_or("")
    }

    pub fn equals(a: &str, b: &str) -> bool {
        a == b || a.to_lowercase() == b.to_lowercase()
    }

    /// True when `item` lies strictly beneath `parent`.
    pub fn is_child(parent: &str, item: &str) -> bool {
        let parent = parent.to_lowercase();
        let item = item.to_lowercase();
        if is_root(&parent) {
            return item.len() > ROOT.len() && item.starts_with(ROOT);
        }
        item.len() > parent.len()
            && item.starts_with(&parent)
            && item[parent.len()..].starts_with(SEPARATOR)
    }

    pub fn is_same_or_child(parent: &str, item: &str) -> bool {
        equals(parent, item) || is_child(parent, item)
    }

    /// Path of `item` relative to `parent`, when it lies beneath it.
    pub fn make_relative<'a>(item: &'a str, parent: &str) -> Option<&'a str> {
        if equals(item, parent) {
            return Some("");
        }
        if !is_child(parent, item) {
            return None;
        }
        let start = if is_root(parent) {
            ROOT.len()
        } else {
            parent.len() + 1
        };
        Some(&item[start..])
    }
}

pub mod local_path {
    use std::path::{Component, Path, PathBuf};

    /// Resolve `path` against `cwd` and normalize `.` and `..` lexically.
    pub fn canonicalize(path: impl AsRef<Path>, cwd: &Path) -> PathBuf {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        normalize(&joined)
    }

    pub fn normalize(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {
                    normalized.push(component.as_os_str());
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if normalized.file_name().is_some() {
                        normalized.pop();
                    }
                }
                Component::Normal(segment) => normalized.push(segment),
            }
        }
        normalized
    }

    /// True when `item` lies strictly beneath `parent`.
    pub fn is_child(parent: &Path, item: &Path) -> bool {
        item != parent && item.starts_with(parent)
    }

    pub fn is_same_or_child(parent: &Path, item: &Path) -> bool {
        item.starts_with(parent)
    }

    pub fn file_name(path: &Path) -> Option<&str> {
        path.file_name().and_then(|name| name.to_str())
    }
}
