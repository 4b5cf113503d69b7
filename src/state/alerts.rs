//! Proximity alerts
//!
//! Decides when an update for a tracked bus should alert the rider: the
//! bus must be tracked, the observer position known, the bus inside the
//! alert radius, and the per-bus cooldown elapsed. Only a firing alert
//! records a cooldown timestamp, so a bus that was merely out of range
//! alerts the moment it comes into range.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ahash::AHashMap;
use chrono::{DateTime, Utc};

use crate::constants::{ALERT_COOLDOWN_SECS, PROXIMITY_RADIUS_M, RECENT_ALERTS_CAPACITY};
use crate::domain::bus::Bus;
use crate::domain::geo::GeoPoint;
use crate::domain::ids::BusId;
use crate::domain::stop::Stop;
use crate::services::IdRegistry;
use crate::utils::bounded::BoundedDeque;

/// Alerting thresholds
#[derive(Clone, Debug)]
pub struct AlertConfig {
    /// Radius around the observer inside which a tracked bus alerts (meters)
    pub radius_m: f64,
    /// Minimum interval between two alerts for the same bus
    pub cooldown: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            radius_m: PROXIMITY_RADIUS_M,
            cooldown: Duration::from_secs(ALERT_COOLDOWN_SECS),
        }
    }
}

/// What kind of alert fired
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    /// A tracked bus is inside the alert radius
    Approaching,
    /// A bus is about to reach a stop the rider cares about
    Arrival,
}

/// A fired alert, ready for any notification surface
#[derive(Clone, Debug)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub bus_id: BusId,
    pub title: String,
    pub body: String,
    /// Bus-to-observer distance for proximity alerts
    pub distance_m: Option<f64>,
    pub at: DateTime<Utc>,
}

impl Alert {
    /// A tracked bus is close to the observer
    pub fn approaching(bus: &Bus, distance_m: f64, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: AlertKind::Approaching,
            bus_id: bus.id.clone(),
            title: "Bus Approaching".to_string(),
            body: format!("Bus {} is nearby ({})", bus.number, bus.route_name),
            distance_m: Some(distance_m),
            at,
        }
    }

    /// A bus will reach the given stop shortly
    pub fn arrival(stop: &Stop, bus: &Bus, eta: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: AlertKind::Arrival,
            bus_id: bus.id.clone(),
            title: "Bus Arrival Update".to_string(),
            body: format!("Bus {} will arrive at {} in {}", bus.number, stop.name, eta),
            distance_m: None,
            at,
        }
    }
}

/// Per-bus alert rate limiting
#[derive(Debug)]
pub struct AlertThrottle {
    last_alert: AHashMap<BusId, DateTime<Utc>>,
    cooldown_ms: i64,
}

impl AlertThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_alert: AHashMap::new(),
            cooldown_ms: cooldown.as_millis() as i64,
        }
    }

    /// True when the bus may alert now. The timestamp is recorded only
    /// on the firing path; a suppressed alert leaves the clock alone.
    pub fn allow(&mut self, id: &BusId, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_alert.get(id) {
            let elapsed_ms = now.signed_duration_since(*last).num_milliseconds();
            if elapsed_ms < self.cooldown_ms {
                return false;
            }
        }
        self.last_alert.insert(id.clone(), now);
        true
    }

    /// Drop a bus's cooldown history, e.g. when it is untracked
    pub fn forget(&mut self, id: &BusId) {
        self.last_alert.remove(id);
    }
}

/// Evaluates accepted updates against the tracked set, the observer
/// position and the per-bus throttle
pub struct AlertService {
    config: AlertConfig,
    tracked: Arc<IdRegistry>,
    observer_location: Mutex<Option<GeoPoint>>,
    throttle: Mutex<AlertThrottle>,
    recent: Mutex<BoundedDeque<Alert>>,
}

impl AlertService {
    pub fn new(config: AlertConfig, tracked: Arc<IdRegistry>) -> Self {
        let throttle = AlertThrottle::new(config.cooldown);
        Self {
            config,
            tracked,
            observer_location: Mutex::new(None),
            throttle: Mutex::new(throttle),
            recent: Mutex::new(BoundedDeque::new(RECENT_ALERTS_CAPACITY)),
        }
    }

    /// Update or clear the observer position. `None` means the position
    /// is unknown or permission was denied; alerting pauses until a
    /// position arrives.
    pub fn set_observer_location(&self, location: Option<GeoPoint>) {
        *self
            .observer_location
            .lock()
            .expect("observer location poisoned") = location;
    }

    pub fn observer_location(&self) -> Option<GeoPoint> {
        *self
            .observer_location
            .lock()
            .expect("observer location poisoned")
    }

    /// The full decision chain for one bus position.
    ///
    /// Checks run in order: tracked, observer position known, inside
    /// the radius (boundary inclusive), cooldown elapsed. Only the last
    /// check mutates state.
    pub fn should_alert(
        &self,
        id: &BusId,
        bus_location: &GeoPoint,
        observer: Option<&GeoPoint>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.tracked.contains(id.as_str()) {
            return false;
        }
        let Some(observer) = observer else {
            return false;
        };
        let distance = bus_location.distance_to(observer);
        // A NaN distance compares false here and never alerts
        if !(distance <= self.config.radius_m) {
            return false;
        }
        self.lock_throttle().allow(id, now)
    }

    /// Run the decision for an accepted update and build the alert when
    /// it fires.
    pub fn check_bus(&self, bus: &Bus, now: DateTime<Utc>) -> Option<Alert> {
        let observer = self.observer_location()?;
        if !self.should_alert(&bus.id, &bus.location, Some(&observer), now) {
            return None;
        }
        let distance = bus.location.distance_to(&observer);
        let alert = Alert::approaching(bus, distance, now);
        self.recent
            .lock()
            .expect("recent alerts poisoned")
            .push(alert.clone());
        Some(alert)
    }

    /// Recent fired alerts, oldest first
    pub fn recent_alerts(&self) -> Vec<Alert> {
        self.recent.lock().expect("recent alerts poisoned").to_vec()
    }

    /// Drop the cooldown history for a bus so re-tracking starts fresh
    pub fn forget(&self, id: &BusId) {
        self.lock_throttle().forget(id);
    }

    fn lock_throttle(&self) -> MutexGuard<'_, AlertThrottle> {
        self.throttle.lock().expect("alert throttle poisoned")
    }
}

impl std::fmt::Debug for AlertService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertService")
            .field("radius_m", &self.config.radius_m)
            .field("cooldown", &self.config.cooldown)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EARTH_RADIUS_M;
    use chrono::TimeDelta;

    fn registry_with(ids: &[&str]) -> Arc<IdRegistry> {
        let path = std::env::temp_dir().join(format!(
            "buswatch-alerts-{}.json",
            uuid::Uuid::new_v4()
        ));
        let registry = Arc::new(IdRegistry::load("tracked buses", path));
        for id in ids {
            registry.add(id);
        }
        registry
    }

    fn service(tracked: &[&str]) -> AlertService {
        AlertService::new(AlertConfig::default(), registry_with(tracked))
    }

    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::new(origin.lat + (meters / EARTH_RADIUS_M).to_degrees(), origin.lng)
    }

    fn bus_at(id: &str, location: GeoPoint) -> Bus {
        use crate::domain::update::BusUpdate;
        BusUpdate {
            bus_number: Some("101".to_string()),
            route_name: Some("Route 101 Express".to_string()),
            location: Some(location),
            ..Default::default()
        }
        .normalize(BusId::new(id), Utc::now())
        .expect("valid bus")
    }

    const OBSERVER: GeoPoint = GeoPoint {
        lat: 19.0178,
        lng: 72.8478,
    };

    #[test]
    fn test_untracked_bus_never_alerts() {
        let service = service(&[]);
        let now = Utc::now();
        assert!(!service.should_alert(&BusId::new("bus-001"), &OBSERVER, Some(&OBSERVER), now));
    }

    #[test]
    fn test_no_observer_position_no_alert() {
        let service = service(&["bus-001"]);
        let now = Utc::now();
        assert!(!service.should_alert(&BusId::new("bus-001"), &OBSERVER, None, now));
    }

    #[test]
    fn test_alert_requires_bus_inside_radius() {
        let service = service(&["bus-001"]);
        let id = BusId::new("bus-001");
        let now = Utc::now();
        let far = north_of(OBSERVER, 1_500.0);
        assert!(!service.should_alert(&id, &far, Some(&OBSERVER), now));
        let near = north_of(OBSERVER, 500.0);
        assert!(service.should_alert(&id, &near, Some(&OBSERVER), now));
    }

    #[test]
    fn test_cooldown_suppresses_repeat_alerts() {
        let service = service(&["bus-001"]);
        let id = BusId::new("bus-001");
        let near = north_of(OBSERVER, 200.0);
        let t0 = Utc::now();
        assert!(service.should_alert(&id, &near, Some(&OBSERVER), t0));
        assert!(!service.should_alert(&id, &near, Some(&OBSERVER), t0));

        let t1 = t0 + TimeDelta::minutes(4);
        assert!(!service.should_alert(&id, &near, Some(&OBSERVER), t1));

        let t2 = t0 + TimeDelta::minutes(5);
        assert!(service.should_alert(&id, &near, Some(&OBSERVER), t2));
    }

    #[test]
    fn test_out_of_range_does_not_start_the_cooldown() {
        let service = service(&["bus-001"]);
        let id = BusId::new("bus-001");
        let t0 = Utc::now();
        let far = north_of(OBSERVER, 2_000.0);
        assert!(!service.should_alert(&id, &far, Some(&OBSERVER), t0));
        // Seconds later the bus is in range; the miss above must not
        // have armed the throttle.
        let near = north_of(OBSERVER, 300.0);
        let t1 = t0 + TimeDelta::seconds(10);
        assert!(service.should_alert(&id, &near, Some(&OBSERVER), t1));
    }

    #[test]
    fn test_per_bus_cooldowns_are_independent() {
        let service = service(&["bus-001", "bus-002"]);
        let near = north_of(OBSERVER, 200.0);
        let now = Utc::now();
        assert!(service.should_alert(&BusId::new("bus-001"), &near, Some(&OBSERVER), now));
        assert!(service.should_alert(&BusId::new("bus-002"), &near, Some(&OBSERVER), now));
    }

    #[test]
    fn test_check_bus_builds_alert_and_records_it() {
        let service = service(&["bus-001"]);
        service.set_observer_location(Some(OBSERVER));
        let bus = bus_at("bus-001", north_of(OBSERVER, 400.0));
        let alert = service.check_bus(&bus, Utc::now()).expect("should fire");
        assert_eq!(alert.kind, AlertKind::Approaching);
        assert_eq!(alert.title, "Bus Approaching");
        assert_eq!(alert.body, "Bus 101 is nearby (Route 101 Express)");
        let distance = alert.distance_m.expect("distance recorded");
        assert!((distance - 400.0).abs() < 5.0, "got {distance}");
        assert_eq!(service.recent_alerts().len(), 1);
    }

    #[test]
    fn test_check_bus_without_observer_is_quiet() {
        let service = service(&["bus-001"]);
        let bus = bus_at("bus-001", OBSERVER);
        assert!(service.check_bus(&bus, Utc::now()).is_none());
        assert!(service.recent_alerts().is_empty());
    }

    #[test]
    fn test_forget_rearms_a_bus() {
        let service = service(&["bus-001"]);
        let id = BusId::new("bus-001");
        let near = north_of(OBSERVER, 200.0);
        let t0 = Utc::now();
        assert!(service.should_alert(&id, &near, Some(&OBSERVER), t0));
        service.forget(&id);
        assert!(service.should_alert(&id, &near, Some(&OBSERVER), t0));
    }

    #[test]
    fn test_arrival_alert_copy() {
        let stop = Stop {
            id: crate::domain::ids::StopId::new("stop-dadar"),
            name: "Dadar".to_string(),
            address: None,
            lat: OBSERVER.lat,
            lng: OBSERVER.lng,
        };
        let bus = bus_at("bus-001", OBSERVER);
        let alert = Alert::arrival(&stop, &bus, "2 min", Utc::now());
        assert_eq!(alert.kind, AlertKind::Arrival);
        assert_eq!(alert.title, "Bus Arrival Update");
        assert_eq!(alert.body, "Bus 101 will arrive at Dadar in 2 min");
    }
}
