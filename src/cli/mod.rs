//! CLI command handlers

pub mod commands;

pub use commands::{archive, export, import, init, starter, Settings};
