//! Static route record

use serde::{Deserialize, Serialize};

use crate::domain::geo::GeoPoint;
use crate::domain::ids::{RouteId, StopId};

/// A transit route as delivered by the bulk snapshot. Immutable once
/// loaded; buses hold it behind an `Arc`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Display name, e.g. "Route 101 Express"
    pub name: String,
    /// Origin terminus display name
    pub from: String,
    /// Destination terminus display name
    pub to: String,
    /// Polyline the route follows, in travel order
    #[serde(default)]
    pub path: Vec<GeoPoint>,
    /// Stops served, in travel order
    #[serde(default)]
    pub stops: Vec<StopId>,
}
