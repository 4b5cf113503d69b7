//! Core constants shared across the tracking core

/// Mean Earth radius in meters, used by the haversine distance
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Divisor from km/h to m/s
pub const KMH_PER_MS: f64 = 3.6;

/// Minute counts at or below this render as "Arriving"
pub const ARRIVING_THRESHOLD_MIN: i64 = 1;

/// Eta shown when a bus heads for a stop but no eta could be derived
pub const UNKNOWN_ETA: &str = "Unknown";

/// Displayed bus number when the feed omits one
pub const DEFAULT_BUS_NUMBER: &str = "Unknown";

/// Displayed route name when the feed omits one
pub const DEFAULT_ROUTE_NAME: &str = "Unknown Route";

/// Operational status when the feed omits one
pub const DEFAULT_BUS_STATUS: &str = "active";

/// Radius around the observer inside which a tracked bus alerts (meters)
pub const PROXIMITY_RADIUS_M: f64 = 1_000.0;

/// Minimum seconds between two alerts for the same bus
pub const ALERT_COOLDOWN_SECS: u64 = 5 * 60;

/// Fired alerts kept for inspection
pub const RECENT_ALERTS_CAPACITY: usize = 100;

/// Max feed events drained per pump pass
pub const INGEST_BATCH_SIZE: usize = 256;

/// Pump pass interval in milliseconds
pub const INGEST_INTERVAL_MS: u64 = 100;

/// Simulated feed tick interval in milliseconds
pub const FEED_TICK_MS: u64 = 1_000;

/// Application directory name for persisted state
pub const APP_DIR_NAME: &str = "buswatch";

/// Backing file for the tracked-bus registry
pub const TRACKED_BUSES_FILE: &str = "tracked_buses.json";

/// Backing file for the favorite-stop registry
pub const FAVORITE_STOPS_FILE: &str = "favorite_stops.json";
