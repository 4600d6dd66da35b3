pub mod local;
pub mod store;

pub use local::StdLocalItems;
pub use store::{TomlWorkspaceStore, WorkspaceFile};
