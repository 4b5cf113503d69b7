//! Transit hub
//!
//! Composition root for the tracking core. Owns the store lock, the
//! notifier, the alert service, the persisted registries and the feed
//! pump.
//!
//! ```text
//!   SimFeed --FeedEvent--> pump --> TransitStore --ChangeEvent--> observers
//!                                        |
//!                                        +--> AlertService --Alert--> alerts()
//! ```
//!
//! Every mutation and the publish it triggers run under the store lock,
//! so observers see changes in application order. Observers run on the
//! mutating thread and must not call back into the hub.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};

use crate::constants::{
    FAVORITE_STOPS_FILE, INGEST_BATCH_SIZE, INGEST_INTERVAL_MS, TRACKED_BUSES_FILE,
};
use crate::domain::bus::Bus;
use crate::domain::geo::GeoPoint;
use crate::domain::ids::{BusId, RouteId, StopId};
use crate::domain::route::Route;
use crate::domain::stop::Stop;
use crate::domain::update::BusUpdate;
use crate::error::{Error, Result};
use crate::eventing::ChangeEvent;
use crate::services::events::FeedEvent;
use crate::services::feed::{FeedConfig, SimFeed};
use crate::services::registry::IdRegistry;
use crate::services::runtime::spawn_in_tokio;
use crate::state::alerts::{Alert, AlertConfig, AlertService};
use crate::state::notifier::{ChangeNotifier, ObserverId};
use crate::state::store::{ApproachingBus, SearchResults, TransitStore};
use crate::utils::config_store;

/// Configuration for the hub and its services
#[derive(Clone, Debug, Default)]
pub struct HubConfig {
    pub feed: FeedConfig,
    pub alerts: AlertConfig,
    /// Override for the registry directory; defaults to the app data dir
    pub data_dir: Option<PathBuf>,
}

/// Central handle over the whole tracking core. Cheap to clone; all
/// clones share the same state.
pub struct TransitHub {
    store: Arc<Mutex<TransitStore>>,
    notifier: Arc<ChangeNotifier>,
    alert_service: Arc<AlertService>,
    tracked: Arc<IdRegistry>,
    favorites: Arc<IdRegistry>,
    feed: Arc<SimFeed>,
    feed_rx: Receiver<FeedEvent>,
    alert_tx: Sender<Alert>,
    alert_rx: Receiver<Alert>,
    pump_running: Arc<AtomicBool>,
}

impl TransitHub {
    pub fn new(config: HubConfig) -> Result<Self> {
        let data_dir = match config.data_dir.clone() {
            Some(dir) => dir,
            None => config_store::app_data_dir()
                .map_err(|e| Error::Invalid {
                    message: format!("app data dir: {e:#}"),
                })?,
        };
        let tracked = Arc::new(IdRegistry::load(
            "tracked buses",
            data_dir.join(TRACKED_BUSES_FILE),
        ));
        let favorites = Arc::new(IdRegistry::load(
            "favorite stops",
            data_dir.join(FAVORITE_STOPS_FILE),
        ));

        let (feed_tx, feed_rx) = crossbeam_channel::unbounded();
        let (alert_tx, alert_rx) = crossbeam_channel::unbounded();

        Ok(Self {
            store: Arc::new(Mutex::new(TransitStore::new())),
            notifier: Arc::new(ChangeNotifier::new()),
            alert_service: Arc::new(AlertService::new(config.alerts.clone(), tracked.clone())),
            feed: Arc::new(SimFeed::new(config.feed.clone(), feed_tx)),
            tracked,
            favorites,
            feed_rx,
            alert_tx,
            alert_rx,
            pump_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(HubConfig::default())
    }

    // ==================== Feed Lifecycle ====================

    /// Start the feed and the pump that drains it into the store
    pub fn start(&self) {
        if self.pump_running.swap(true, Ordering::SeqCst) {
            tracing::warn!("hub already started");
            return;
        }
        self.feed.start();

        let hub = self.clone();
        spawn_in_tokio(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(INGEST_INTERVAL_MS));
            loop {
                interval.tick().await;
                if !hub.pump_running.load(Ordering::SeqCst) {
                    break;
                }
                let mut batch = Vec::with_capacity(INGEST_BATCH_SIZE);
                while let Ok(event) = hub.feed_rx.try_recv() {
                    batch.push(event);
                    if batch.len() >= INGEST_BATCH_SIZE {
                        break;
                    }
                }
                for event in batch {
                    hub.apply_feed_event(event);
                }
            }
            tracing::debug!("feed pump stopped");
        });
        tracing::info!("hub started");
    }

    /// Stop the feed and the pump
    pub fn stop(&self) {
        if !self.pump_running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.feed.stop();
        tracing::info!("hub stopped");
    }

    pub fn is_running(&self) -> bool {
        self.pump_running.load(Ordering::SeqCst)
    }

    /// Route one feed event through the store
    fn apply_feed_event(&self, event: FeedEvent) {
        match event {
            FeedEvent::BusAdded { id, update } | FeedEvent::BusChanged { id, update } => {
                if let Err(e) = self.apply_bus_update(id, update) {
                    tracing::warn!("dropped update: {}", e);
                }
            }
            FeedEvent::BusRemoved { id } => {
                self.remove_bus(&id);
            }
            FeedEvent::StopsSnapshot { stops } => self.load_stops(stops),
            FeedEvent::RoutesSnapshot { routes } => self.load_routes(routes),
        }
    }

    // ==================== Mutations ====================

    /// Apply one bus update: validate, store, publish, evaluate alerts.
    ///
    /// Returns the stored record. A rejected update leaves the store
    /// untouched and publishes nothing.
    pub fn apply_bus_update(&self, id: BusId, update: BusUpdate) -> Result<Bus> {
        let now = Utc::now();
        let mut store = self.lock_store();
        let bus = store.apply_update(id, update, now)?;
        self.notifier.publish(&ChangeEvent::BusUpdated(bus.clone()));
        if let Some(alert) = self.alert_service.check_bus(&bus, now) {
            tracing::info!("alert: {}", alert.body);
            let _ = self.alert_tx.send(alert);
        }
        Ok(bus)
    }

    /// Remove a bus. Publishes only when something was actually removed,
    /// so observers never see a removal for an id they never saw.
    pub fn remove_bus(&self, id: &BusId) -> bool {
        let mut store = self.lock_store();
        let removed = store.remove_bus(id);
        if removed {
            self.notifier.publish(&ChangeEvent::BusRemoved(id.clone()));
        }
        removed
    }

    /// Replace the stop collection and publish the new snapshot
    pub fn load_stops(&self, stops: Vec<Stop>) {
        let mut store = self.lock_store();
        store.load_stops(stops);
        let snapshot: Vec<Stop> = store.all_stops().cloned().collect();
        tracing::info!("loaded {} stops", snapshot.len());
        self.notifier
            .publish(&ChangeEvent::StopsLoaded { stops: snapshot });
    }

    /// Replace the route collection, re-resolve buses, publish
    pub fn load_routes(&self, routes: Vec<Route>) {
        let mut store = self.lock_store();
        store.load_routes(routes);
        let snapshot: Vec<Arc<Route>> = store.all_routes().cloned().collect();
        tracing::info!("loaded {} routes", snapshot.len());
        self.notifier
            .publish(&ChangeEvent::RoutesLoaded { routes: snapshot });
    }

    // ==================== Lookups ====================

    pub fn bus(&self, id: &BusId) -> Option<Bus> {
        self.lock_store().bus(id).cloned()
    }

    pub fn stop_by_id(&self, id: &StopId) -> Option<Stop> {
        self.lock_store().stop(id).cloned()
    }

    pub fn route(&self, id: &RouteId) -> Option<Arc<Route>> {
        self.lock_store().route(id).cloned()
    }

    pub fn all_buses(&self) -> Vec<Bus> {
        self.lock_store().all_buses().cloned().collect()
    }

    pub fn all_stops(&self) -> Vec<Stop> {
        self.lock_store().all_stops().cloned().collect()
    }

    pub fn all_routes(&self) -> Vec<Arc<Route>> {
        self.lock_store().all_routes().cloned().collect()
    }

    /// Case-insensitive substring search across buses, stops and routes
    pub fn search(&self, query: &str) -> SearchResults {
        self.lock_store().search(query)
    }

    /// Buses heading for a stop, soonest first
    pub fn approaching(&self, stop_id: &StopId) -> Vec<ApproachingBus> {
        self.lock_store().approaching(stop_id)
    }

    // ==================== Observers ====================

    /// Register a change observer. Runs synchronously on the mutating
    /// thread; it must not call back into the hub.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ==================== Tracking and Favorites ====================

    /// Track a bus; it becomes eligible for proximity alerts
    pub fn track_bus(&self, id: &BusId) -> bool {
        let added = self.tracked.add(id.as_str());
        if added {
            tracing::info!("tracking bus {}", id);
        }
        added
    }

    /// Stop tracking a bus and drop its alert cooldown
    pub fn untrack_bus(&self, id: &BusId) -> bool {
        let removed = self.tracked.remove(id.as_str());
        if removed {
            self.alert_service.forget(id);
            tracing::info!("stopped tracking bus {}", id);
        }
        removed
    }

    pub fn is_tracked(&self, id: &BusId) -> bool {
        self.tracked.contains(id.as_str())
    }

    pub fn tracked_buses(&self) -> Vec<BusId> {
        self.tracked.all().into_iter().map(BusId::from).collect()
    }

    pub fn favorite_stop(&self, id: &StopId) -> bool {
        let added = self.favorites.add(id.as_str());
        if added {
            tracing::info!("favorited stop {}", id);
        }
        added
    }

    pub fn unfavorite_stop(&self, id: &StopId) -> bool {
        self.favorites.remove(id.as_str())
    }

    pub fn is_favorite_stop(&self, id: &StopId) -> bool {
        self.favorites.contains(id.as_str())
    }

    pub fn favorite_stops(&self) -> Vec<StopId> {
        self.favorites.all().into_iter().map(StopId::from).collect()
    }

    // ==================== Alerts ====================

    /// Update or clear the observer position used for proximity alerts
    pub fn set_observer_location(&self, location: Option<GeoPoint>) {
        self.alert_service.set_observer_location(location);
    }

    pub fn observer_location(&self) -> Option<GeoPoint> {
        self.alert_service.observer_location()
    }

    /// Receiver for fired alerts; clone freely
    pub fn alerts(&self) -> Receiver<Alert> {
        self.alert_rx.clone()
    }

    /// Recent fired alerts, oldest first
    pub fn recent_alerts(&self) -> Vec<Alert> {
        self.alert_service.recent_alerts()
    }

    fn lock_store(&self) -> MutexGuard<'_, TransitStore> {
        self.store.lock().expect("transit store poisoned")
    }

    /// Test hook: push a feed event through the same path the pump uses
    #[cfg(test)]
    pub fn emit_feed(&self, event: FeedEvent) {
        self.apply_feed_event(event);
    }
}

impl Clone for TransitHub {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            alert_service: self.alert_service.clone(),
            tracked: self.tracked.clone(),
            favorites: self.favorites.clone(),
            feed: self.feed.clone(),
            feed_rx: self.feed_rx.clone(),
            alert_tx: self.alert_tx.clone(),
            alert_rx: self.alert_rx.clone(),
            pump_running: self.pump_running.clone(),
        }
    }
}

impl std::fmt::Debug for TransitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.lock_store();
        f.debug_struct("TransitHub")
            .field("buses", &store.bus_count())
            .field("stops", &store.stop_count())
            .field("routes", &store.route_count())
            .field("running", &self.is_running())
            .finish()
    }
}
