use std::path::Path;

use tfvc_core::ports::LocalItems;

/// [`LocalItems`] backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLocalItems;

impl StdLocalItems {
    pub fn new() -> Self {
        Self
    }
}

impl LocalItems for StdLocalItems {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, "x")?;

        let local = StdLocalItems::new();
        assert!(local.is_directory(temp_dir.path()));
        assert!(!local.is_directory(&file));
        assert!(!local.is_directory(&temp_dir.path().join("missing")));
        Ok(())
    }
}
