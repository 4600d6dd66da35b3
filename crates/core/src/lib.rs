//! tfvc Core - version-control event dispatch and pending-change reconciliation
//!
//! This crate contains the domain types, the event dispatch engine, ports
//! (interfaces) to the workspace cache and server, and the reconciliation
//! logic that resolves free-form command arguments against a workspace's
//! pending changes. It performs no I/O itself - that is handled by adapters.

pub mod app;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
