//! Buswatch core library
//!
//! In-memory tracking core for a live bus network: a validated entity
//! store fed by a realtime stream, ordered synchronous change
//! notifications, cross-entity search, per-stop arrival boards and
//! throttled proximity alerts.

pub mod constants;
pub mod domain;
pub mod error;
pub mod eventing;
pub mod services;
pub mod state;
pub mod utils;
