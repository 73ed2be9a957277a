// src/commands/mod.rs
//! Command handlers for the packwright CLI

mod build;

pub use build::cmd_build;
