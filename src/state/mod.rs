//! In-memory tracking state
//!
//! Each module owns one concern: the entity store, the observer list
//! and the alerting decision. The hub composes them behind one lock.

pub mod alerts;
pub mod notifier;
pub mod store;
