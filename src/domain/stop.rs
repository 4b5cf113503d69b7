//! Static stop record

use serde::{Deserialize, Serialize};

use crate::domain::geo::GeoPoint;
use crate::domain::ids::StopId;

/// A bus stop as delivered by the bulk snapshot. Immutable once loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl Stop {
    /// Position as a point (the wire keeps stop coordinates flat)
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}
