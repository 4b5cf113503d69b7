//! Transit store
//!
//! The single in-memory source of truth for buses, stops and routes.
//! Collections are insertion-ordered maps, so every snapshot and search
//! result comes back in first-seen order. Mutations never do I/O and
//! never publish; the hub owns the lock and the notifier.

use std::sync::Arc;

use ahash::RandomState;
use chrono::{DateTime, Utc};
use hashlink::LinkedHashMap;

use crate::constants::UNKNOWN_ETA;
use crate::domain::bus::Bus;
use crate::domain::ids::{BusId, RouteId, StopId};
use crate::domain::route::Route;
use crate::domain::stop::Stop;
use crate::domain::update::BusUpdate;
use crate::error::Result;
use crate::utils::format::eta_sort_key;

/// Insertion-ordered map: iteration follows first insertion, and
/// replacing a value keeps the key's position
type OrderedMap<K, V> = LinkedHashMap<K, V, RandomState>;

/// Search hits, one collection per entity kind, in store order
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    pub buses: Vec<Bus>,
    pub stops: Vec<Stop>,
    pub routes: Vec<Arc<Route>>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.buses.is_empty() && self.stops.is_empty() && self.routes.is_empty()
    }
}

/// A bus heading for a given stop, paired with its display eta
#[derive(Clone, Debug)]
pub struct ApproachingBus {
    pub bus: Bus,
    pub eta: String,
}

/// In-memory entity store
#[derive(Default)]
pub struct TransitStore {
    buses: OrderedMap<BusId, Bus>,
    stops: OrderedMap<StopId, Stop>,
    routes: OrderedMap<RouteId, Arc<Route>>,
}

impl TransitStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Mutations ====================

    /// Validate one feed payload and store the resulting bus.
    ///
    /// The stored record is fully replaced; nothing of any previous
    /// record for the id survives. On rejection the store is untouched.
    pub fn apply_update(
        &mut self,
        id: BusId,
        update: BusUpdate,
        now: DateTime<Utc>,
    ) -> Result<Bus> {
        let mut bus = update.normalize(id, now)?;
        if let Some(route_id) = bus.route_id.as_ref() {
            bus.route = self.routes.get(route_id).cloned();
        }
        // `replace` keeps a live key's position; `insert` would move it
        // to the back of the iteration order.
        self.buses.replace(bus.id.clone(), bus.clone());
        Ok(bus)
    }

    /// Remove a bus. Returns whether anything was removed.
    pub fn remove_bus(&mut self, id: &BusId) -> bool {
        self.buses.remove(id).is_some()
    }

    /// Replace the whole stop collection. Buses are not touched; their
    /// next-stop fields reference stops by id only.
    pub fn load_stops(&mut self, stops: Vec<Stop>) {
        self.stops.clear();
        for stop in stops {
            self.stops.replace(stop.id.clone(), stop);
        }
    }

    /// Replace the whole route collection and re-resolve the route of
    /// every bus already present. A bus whose route id is absent from
    /// the new collection ends up with no resolved route.
    pub fn load_routes(&mut self, routes: Vec<Route>) {
        self.routes.clear();
        for route in routes {
            self.routes.replace(route.id.clone(), Arc::new(route));
        }
        let routes = &self.routes;
        for (_, bus) in self.buses.iter_mut() {
            bus.route = bus
                .route_id
                .as_ref()
                .and_then(|route_id| routes.get(route_id).cloned());
        }
    }

    // ==================== Lookups ====================

    pub fn bus(&self, id: &BusId) -> Option<&Bus> {
        self.buses.get(id)
    }

    pub fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn route(&self, id: &RouteId) -> Option<&Arc<Route>> {
        self.routes.get(id)
    }

    pub fn all_buses(&self) -> impl Iterator<Item = &Bus> {
        self.buses.iter().map(|(_, bus)| bus)
    }

    pub fn all_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().map(|(_, stop)| stop)
    }

    pub fn all_routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter().map(|(_, route)| route)
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    // ==================== Search ====================

    /// Case-insensitive substring search across all three collections.
    ///
    /// Buses match on number or route name, stops on name, routes on
    /// name or either terminus. A blank query matches nothing.
    pub fn search(&self, query: &str) -> SearchResults {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return SearchResults::default();
        }

        let buses = self
            .all_buses()
            .filter(|bus| {
                bus.number.to_lowercase().contains(&query)
                    || bus.route_name.to_lowercase().contains(&query)
            })
            .cloned()
            .collect();

        let stops = self
            .all_stops()
            .filter(|stop| stop.name.to_lowercase().contains(&query))
            .cloned()
            .collect();

        let routes = self
            .all_routes()
            .filter(|route| {
                route.name.to_lowercase().contains(&query)
                    || route.from.to_lowercase().contains(&query)
                    || route.to.to_lowercase().contains(&query)
            })
            .cloned()
            .collect();

        SearchResults {
            buses,
            stops,
            routes,
        }
    }

    // ==================== Arrivals ====================

    /// Buses whose next stop is the given stop, soonest first.
    ///
    /// A bus without a display eta sorts after the numeric ones under
    /// the label "Unknown". The sort is stable, so ties keep store
    /// order.
    pub fn approaching(&self, stop_id: &StopId) -> Vec<ApproachingBus> {
        let mut hits: Vec<ApproachingBus> = self
            .all_buses()
            .filter(|bus| {
                bus.next_stop
                    .as_ref()
                    .and_then(|next| next.id.as_ref())
                    == Some(stop_id)
            })
            .map(|bus| ApproachingBus {
                eta: bus
                    .next_stop
                    .as_ref()
                    .and_then(|next| next.eta.clone())
                    .unwrap_or_else(|| UNKNOWN_ETA.to_string()),
                bus: bus.clone(),
            })
            .collect();
        hits.sort_by_key(|hit| eta_sort_key(&hit.eta));
        hits
    }
}
