//! Live vehicle record

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::geo::GeoPoint;
use crate::domain::ids::{BusId, RouteId, StopId};
use crate::domain::route::Route;

/// A live bus as held by the store.
///
/// Produced only by normalizing a `BusUpdate`; every accepted update
/// fully replaces the previous record for the same id.
#[derive(Clone, Debug)]
pub struct Bus {
    /// Feed-assigned identifier, stable across updates
    pub id: BusId,
    /// Displayed bus number
    pub number: String,
    /// Route this bus runs, when the feed knows it
    pub route_id: Option<RouteId>,
    /// Displayed route name
    pub route_name: String,
    /// Current position, always finite
    pub location: GeoPoint,
    /// Heading in degrees clockwise from north
    pub heading: f64,
    /// Speed in km/h
    pub speed: f64,
    /// Operational status, "active" unless the feed says otherwise
    pub status: String,
    /// Time of the last accepted update
    pub last_updated: DateTime<Utc>,
    /// Next stop on the route, when known
    pub next_stop: Option<NextStop>,
    /// Route record resolved against the loaded route collection
    pub route: Option<Arc<Route>>,
}

/// The stop a bus is heading for
#[derive(Clone, Debug)]
pub struct NextStop {
    pub id: Option<StopId>,
    pub name: String,
    /// Display eta: "Arriving", "{n} min", or unset when underivable
    pub eta: Option<String>,
    pub location: Option<GeoPoint>,
}
