//! Feed events
//!
//! Raw events as a feed source delivers them, before any validation.
//! The hub drains these off a channel and routes them through the
//! store; consumers only ever see the typed `ChangeEvent`s that result.

use crate::domain::ids::BusId;
use crate::domain::route::Route;
use crate::domain::stop::Stop;
use crate::domain::update::BusUpdate;

/// Events emitted by a feed source
#[derive(Clone, Debug)]
pub enum FeedEvent {
    // ==================== Per-Bus Stream ====================
    /// A bus appeared in the feed
    BusAdded { id: BusId, update: BusUpdate },

    /// An existing bus moved or changed
    BusChanged { id: BusId, update: BusUpdate },

    /// A bus left the feed
    BusRemoved { id: BusId },

    // ==================== Bulk Snapshots ====================
    /// Wholesale stop collection snapshot
    StopsSnapshot { stops: Vec<Stop> },

    /// Wholesale route collection snapshot
    RoutesSnapshot { routes: Vec<Route> },
}
