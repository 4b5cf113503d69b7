//! Store change notifications
//!
//! One event per applied mutation, published synchronously to observers
//! in application order. Payloads are snapshots; observers never see a
//! reference into the live store.

use std::sync::Arc;

use crate::domain::bus::Bus;
use crate::domain::ids::BusId;
use crate::domain::route::Route;
use crate::domain::stop::Stop;

/// A change applied to the store
#[derive(Clone, Debug)]
pub enum ChangeEvent {
    // ==================== Per-Bus Changes ====================
    /// A bus was inserted or fully replaced
    BusUpdated(Bus),

    /// A bus was removed
    BusRemoved(BusId),

    // ==================== Bulk Loads ====================
    /// The stop collection was replaced wholesale
    StopsLoaded { stops: Vec<Stop> },

    /// The route collection was replaced wholesale
    RoutesLoaded { routes: Vec<Arc<Route>> },
}

impl ChangeEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::BusUpdated(_) => "bus_updated",
            ChangeEvent::BusRemoved(_) => "bus_removed",
            ChangeEvent::StopsLoaded { .. } => "stops_loaded",
            ChangeEvent::RoutesLoaded { .. } => "routes_loaded",
        }
    }
}
