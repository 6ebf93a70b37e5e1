//! Infrastructure adapters for persistence, configuration, and the desktop clipboard.

pub mod action_log;
pub mod clipboard;
pub mod config;
pub mod paths;
pub mod usage;
pub mod vault;
