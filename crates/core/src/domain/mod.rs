pub mod change;
pub mod events;
pub mod item;
pub mod path;
pub mod source;
pub mod status;
pub mod version;

// Re-exports for convenience
pub use change::*;
pub use events::*;
pub use item::*;
pub use source::*;
pub use status::*;
pub use version::*;
