use std::path::Path;

/// Probe of the local disk, used to tell folder arguments from file arguments
pub trait LocalItems: Send + Sync {
    fn is_directory(&self, path: &Path) -> bool;
}
