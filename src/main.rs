//! Buswatch demo entry point
//!
//! Wires the hub to the simulated feed and logs what a client would
//! render: change events, proximity alerts, search hits and the arrival
//! board for a busy interchange.

use std::time::{Duration, Instant};

use buswatch::domain::geo::GeoPoint;
use buswatch::domain::ids::{BusId, StopId};
use buswatch::eventing::ChangeEvent;
use buswatch::services::TransitHub;
use buswatch::state::alerts::Alert;
use buswatch::utils::format::{format_datetime, format_distance};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting buswatch demo...");

    let hub = match TransitHub::with_defaults() {
        Ok(hub) => hub,
        Err(e) => {
            tracing::error!("failed to build hub: {}", e);
            std::process::exit(1);
        }
    };

    // Log store changes the way a UI would repaint from them
    hub.subscribe(|event| match event {
        ChangeEvent::BusUpdated(bus) => {
            tracing::debug!(
                "bus {} at {} heading {:.0} ({})",
                bus.number,
                bus.location,
                bus.heading,
                bus.status
            );
        }
        ChangeEvent::BusRemoved(id) => tracing::info!("bus {} removed", id),
        ChangeEvent::StopsLoaded { stops } => tracing::info!("{} stops loaded", stops.len()),
        ChangeEvent::RoutesLoaded { routes } => {
            tracing::info!("{} routes loaded", routes.len());
        }
    });

    // The rider stands at the Dadar interchange and tracks the express
    // bus that passes it
    hub.set_observer_location(Some(GeoPoint::new(19.0178, 72.8478)));
    let tracked = BusId::new("bus-101-b");
    hub.track_bus(&tracked);

    hub.start();

    let alerts = hub.alerts();
    let deadline = Instant::now() + Duration::from_secs(12);
    while Instant::now() < deadline {
        match alerts.recv_timeout(Duration::from_millis(500)) {
            Ok(alert) => {
                let distance = alert
                    .distance_m
                    .map(format_distance)
                    .unwrap_or_default();
                tracing::info!("{}: {} [{}]", alert.title, alert.body, distance);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    // What a rider searching "express" sees
    let hits = hub.search("express");
    for route in &hits.routes {
        tracing::info!("search hit: {} ({} to {})", route.name, route.from, route.to);
    }
    for bus in &hits.buses {
        tracing::info!(
            "search hit: bus {} on {} (updated {})",
            bus.number,
            bus.route_name,
            format_datetime(&bus.last_updated)
        );
    }

    // The arrival board for the interchange
    let dadar = StopId::new("stop-dadar");
    for entry in hub.approaching(&dadar) {
        tracing::info!("arrival board: bus {} in {}", entry.bus.number, entry.eta);
        if entry.eta == "Arriving" {
            if let Some(stop) = hub.stop_by_id(&dadar) {
                let note = Alert::arrival(&stop, &entry.bus, &entry.eta, chrono::Utc::now());
                tracing::info!("{}: {}", note.title, note.body);
            }
        }
    }

    if !hub.untrack_bus(&tracked) {
        tracing::warn!("bus {} was not tracked", tracked);
    }
    hub.stop();
}
