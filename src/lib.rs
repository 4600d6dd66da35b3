//! tfvc application library
//!
//! Adapters, command services, CLI parsing and configuration around the
//! `tfvc-core` domain crate.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod services;
