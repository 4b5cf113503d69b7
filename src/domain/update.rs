//! Validated feed payload
//!
//! The raw per-bus payload as the feed delivers it, plus the
//! normalization that turns it into a typed `Bus` or a typed rejection.
//! A payload without a finite position is useless to every consumer, so
//! that is the one hard requirement; every other field gets a default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUS_NUMBER, DEFAULT_BUS_STATUS, DEFAULT_ROUTE_NAME, KMH_PER_MS,
};
use crate::domain::bus::{Bus, NextStop};
use crate::domain::geo::{GeoPoint, distance_meters};
use crate::domain::ids::{BusId, RouteId, StopId};
use crate::error::{Error, Result};
use crate::utils::format::format_eta;

/// Raw bus payload from the feed. Every field is optional; normalization
/// decides what is required.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusUpdate {
    pub bus_number: Option<String>,
    pub route_id: Option<String>,
    pub route_name: Option<String>,
    pub location: Option<GeoPoint>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub status: Option<String>,
    /// Milliseconds since the Unix epoch
    pub last_updated: Option<i64>,
    pub next_stop: Option<NextStopUpdate>,
}

/// Raw next-stop payload
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextStopUpdate {
    pub id: Option<String>,
    pub name: Option<String>,
    pub eta: Option<String>,
    pub location: Option<GeoPoint>,
}

impl BusUpdate {
    /// Validate and normalize into a `Bus`.
    ///
    /// Rejects a missing or non-finite location; everything else is
    /// defaulted. An eta supplied by the feed is kept verbatim; one is
    /// derived only when the feed left it out and the bus is moving
    /// toward a stop with a known position. The returned bus carries no
    /// resolved route; the store attaches that from its own route map.
    pub fn normalize(self, id: BusId, now: DateTime<Utc>) -> Result<Bus> {
        let location = match self.location {
            Some(location) => location,
            None => return Err(Error::MissingLocation { id: id.to_string() }),
        };
        if !location.is_finite() {
            return Err(Error::NonFiniteCoordinate {
                id: id.to_string(),
                lat: location.lat,
                lng: location.lng,
            });
        }

        let speed = self.speed.unwrap_or(0.0);
        let last_updated = self
            .last_updated
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(now);

        let mut next_stop = self.next_stop.map(|ns| NextStop {
            id: ns.id.map(StopId::from),
            name: ns.name.unwrap_or_default(),
            eta: ns.eta,
            location: ns.location,
        });

        if let Some(ns) = next_stop.as_mut() {
            if ns.eta.is_none() && speed > 0.0 {
                if let Some(stop_location) = ns.location {
                    let distance = distance_meters(
                        location.lat,
                        location.lng,
                        stop_location.lat,
                        stop_location.lng,
                    );
                    ns.eta = derive_eta(distance, speed);
                }
            }
        }

        Ok(Bus {
            id,
            number: self
                .bus_number
                .unwrap_or_else(|| DEFAULT_BUS_NUMBER.to_string()),
            route_id: self.route_id.map(RouteId::from),
            route_name: self
                .route_name
                .unwrap_or_else(|| DEFAULT_ROUTE_NAME.to_string()),
            location,
            heading: self.heading.unwrap_or(0.0),
            speed,
            status: self.status.unwrap_or_else(|| DEFAULT_BUS_STATUS.to_string()),
            last_updated,
            next_stop,
            route: None,
        })
    }
}

/// Derive the display eta from a distance in meters and a speed in km/h.
///
/// Minutes are rounded up, so a partial minute still counts. Returns
/// `None` when the speed is not positive or the arithmetic does not
/// produce a finite minute count.
pub fn derive_eta(distance_m: f64, speed_kmh: f64) -> Option<String> {
    let speed_ms = speed_kmh / KMH_PER_MS;
    if speed_ms <= 0.0 {
        return None;
    }
    let eta_seconds = distance_m / speed_ms;
    let eta_minutes = (eta_seconds / 60.0).ceil();
    if !eta_minutes.is_finite() {
        return None;
    }
    Some(format_eta(eta_minutes as i64))
}
