//! Simulated transit feed
//!
//! An in-process stand-in for a live vehicle feed. It seeds a small
//! Mumbai stop/route network, emits the bulk snapshots, then advances
//! every bus along its route polyline on a fixed tick, emitting the
//! same event stream a real backend would. The hub drains `FeedEvent`s
//! without knowing which kind of source produced them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::constants::{FEED_TICK_MS, KMH_PER_MS};
use crate::domain::geo::{GeoPoint, bearing_degrees};
use crate::domain::ids::{BusId, RouteId, StopId};
use crate::domain::route::Route;
use crate::domain::stop::Stop;
use crate::domain::update::{BusUpdate, NextStopUpdate};
use crate::services::events::FeedEvent;
use crate::services::runtime::spawn_in_tokio;

/// Configuration for the simulated feed
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Interval between position updates
    pub tick: Duration,
    /// Cruising speed assigned to simulated buses (km/h)
    pub speed_kmh: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(FEED_TICK_MS),
            speed_kmh: 32.0,
        }
    }
}

/// Movement state for one simulated bus
#[derive(Clone, Debug)]
struct SimBus {
    id: BusId,
    number: String,
    route_id: RouteId,
    route_name: String,
    /// Polyline travelled, one point per stop
    path: Vec<GeoPoint>,
    /// Stops in travel order, aligned with `path`
    stops: Vec<Stop>,
    /// Index of the polyline segment currently travelled
    segment: usize,
    position: GeoPoint,
}

impl SimBus {
    /// Advance along the polyline by `meters`, wrapping at the end. At
    /// most one full lap per call.
    fn advance(&mut self, meters: f64) {
        if self.path.len() < 2 {
            return;
        }
        let mut remaining = meters;
        let mut hops = 0;
        while remaining > 0.0 && hops <= self.path.len() {
            let target = self.path[(self.segment + 1) % self.path.len()];
            let to_target = self.position.distance_to(&target);
            if to_target <= remaining {
                self.position = target;
                self.segment = (self.segment + 1) % self.path.len();
                remaining -= to_target;
                hops += 1;
            } else {
                let fraction = remaining / to_target;
                self.position = GeoPoint::new(
                    self.position.lat + (target.lat - self.position.lat) * fraction,
                    self.position.lng + (target.lng - self.position.lng) * fraction,
                );
                remaining = 0.0;
            }
        }
    }

    /// Wire payload for the current position
    fn to_update(&self, speed_kmh: f64) -> BusUpdate {
        let next_index = (self.segment + 1) % self.stops.len().max(1);
        let target = if self.path.is_empty() {
            None
        } else {
            self.path.get((self.segment + 1) % self.path.len()).copied()
        };
        let next_stop = self.stops.get(next_index).map(|stop| NextStopUpdate {
            id: Some(stop.id.to_string()),
            name: Some(stop.name.clone()),
            eta: None,
            location: Some(stop.location()),
        });

        BusUpdate {
            bus_number: Some(self.number.clone()),
            route_id: Some(self.route_id.to_string()),
            route_name: Some(self.route_name.clone()),
            location: Some(self.position),
            heading: target.map(|t| bearing_degrees(&self.position, &t)),
            speed: Some(speed_kmh),
            status: None,
            last_updated: None,
            next_stop,
        }
    }
}

/// Simulated feed source
pub struct SimFeed {
    config: FeedConfig,
    tx: Sender<FeedEvent>,
    running: Arc<AtomicBool>,
    fleet: Arc<Mutex<Vec<SimBus>>>,
    stops: Vec<Stop>,
    routes: Vec<Route>,
}

impl SimFeed {
    pub fn new(config: FeedConfig, tx: Sender<FeedEvent>) -> Self {
        let (stops, routes) = demo_network();
        let fleet = seed_fleet(&stops, &routes);
        Self {
            config,
            tx,
            running: Arc::new(AtomicBool::new(false)),
            fleet: Arc::new(Mutex::new(fleet)),
            stops,
            routes,
        }
    }

    /// Emit the bulk snapshots and the initial bus positions, then start
    /// the tick loop.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("simulated feed already running");
            return;
        }

        let _ = self.tx.send(FeedEvent::StopsSnapshot {
            stops: self.stops.clone(),
        });
        let _ = self.tx.send(FeedEvent::RoutesSnapshot {
            routes: self.routes.clone(),
        });

        {
            let fleet = self.lock_fleet();
            tracing::info!("starting simulated feed with {} buses", fleet.len());
            for bus in fleet.iter() {
                let _ = self.tx.send(FeedEvent::BusAdded {
                    id: bus.id.clone(),
                    update: bus.to_update(self.config.speed_kmh),
                });
            }
        }

        let tx = self.tx.clone();
        let running = self.running.clone();
        let fleet = self.fleet.clone();
        let tick = self.config.tick;
        let speed_kmh = self.config.speed_kmh;
        spawn_in_tokio(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately; positions for it were
            // already emitted as adds.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let meters = speed_kmh / KMH_PER_MS * tick.as_secs_f64();
                let updates: Vec<(BusId, BusUpdate)> = {
                    let mut fleet = fleet.lock().expect("sim fleet poisoned");
                    fleet
                        .iter_mut()
                        .map(|bus| {
                            bus.advance(meters);
                            (bus.id.clone(), bus.to_update(speed_kmh))
                        })
                        .collect()
                };
                for (id, update) in updates {
                    if tx.send(FeedEvent::BusChanged { id, update }).is_err() {
                        return;
                    }
                }
            }
            tracing::debug!("simulated feed loop stopped");
        });
    }

    /// Stop the tick loop. The loop notices at its next tick.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("stopping simulated feed");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn lock_fleet(&self) -> std::sync::MutexGuard<'_, Vec<SimBus>> {
        self.fleet.lock().expect("sim fleet poisoned")
    }
}

impl Drop for SimFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SimFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimFeed")
            .field("running", &self.is_running())
            .field("buses", &self.lock_fleet().len())
            .finish()
    }
}

fn stop(id: &str, name: &str, address: Option<&str>, lat: f64, lng: f64) -> Stop {
    Stop {
        id: StopId::new(id),
        name: name.to_string(),
        address: address.map(str::to_string),
        lat,
        lng,
    }
}

/// The demo network: two Mumbai routes sharing the Dadar interchange
fn demo_network() -> (Vec<Stop>, Vec<Route>) {
    let stops = vec![
        stop("stop-colaba", "Colaba Bus Station", Some("Shahid Bhagat Singh Rd"), 18.9067, 72.8147),
        stop("stop-churchgate", "Churchgate", None, 18.9322, 72.8264),
        stop("stop-dadar", "Dadar TT", Some("Dr Babasaheb Ambedkar Rd"), 19.0178, 72.8478),
        stop("stop-bandra", "Bandra West", None, 19.0596, 72.8295),
        stop("stop-cst", "CST", Some("Chhatrapati Shivaji Terminus Area"), 18.9398, 72.8355),
        stop("stop-kurla", "Kurla Depot", None, 19.0726, 72.8845),
        stop("stop-andheri", "Andheri Station", None, 19.1197, 72.8464),
    ];

    let route_of = |id: &str, name: &str, from: &str, to: &str, stop_ids: &[&str]| {
        let stop_refs: Vec<&Stop> = stop_ids
            .iter()
            .filter_map(|sid| stops.iter().find(|s| s.id.as_str() == *sid))
            .collect();
        Route {
            id: RouteId::new(id),
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            path: stop_refs.iter().map(|s| s.location()).collect(),
            stops: stop_refs.iter().map(|s| s.id.clone()).collect(),
        }
    };

    let routes = vec![
        route_of(
            "route-101",
            "Route 101 Express",
            "Colaba",
            "Bandra",
            &["stop-colaba", "stop-churchgate", "stop-dadar", "stop-bandra"],
        ),
        route_of(
            "route-202",
            "Route 202",
            "CST",
            "Andheri",
            &["stop-cst", "stop-dadar", "stop-kurla", "stop-andheri"],
        ),
    ];

    (stops, routes)
}

/// Three buses: two on the express route (one mid-route at Dadar so the
/// demo alerts quickly), one on the cross-town route
fn seed_fleet(stops: &[Stop], routes: &[Route]) -> Vec<SimBus> {
    let resolve = |route: &Route| -> Vec<Stop> {
        route
            .stops
            .iter()
            .filter_map(|sid| stops.iter().find(|s| &s.id == sid).cloned())
            .collect()
    };

    let mut fleet = Vec::new();
    for (bus_id, number, route_index, segment) in [
        ("bus-101-a", "101", 0usize, 0usize),
        ("bus-101-b", "101", 0, 2),
        ("bus-202-a", "202", 1, 0),
    ] {
        let Some(route) = routes.get(route_index) else {
            continue;
        };
        let resolved = resolve(route);
        let Some(start) = route.path.get(segment).copied() else {
            continue;
        };
        fleet.push(SimBus {
            id: BusId::new(bus_id),
            number: number.to_string(),
            route_id: route.id.clone(),
            route_name: route.name.clone(),
            path: route.path.clone(),
            stops: resolved,
            segment,
            position: start,
        });
    }
    fleet
}
