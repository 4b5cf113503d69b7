//! Utility modules

pub mod bounded;
pub mod config_store;
pub mod format;
