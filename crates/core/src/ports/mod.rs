pub mod cache;
pub mod local;
pub mod server;

// Re-exports
pub use cache::*;
pub use local::*;
pub use server::*;
