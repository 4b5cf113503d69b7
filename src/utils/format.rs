//! Display formatting helpers

use chrono::{DateTime, Local, Utc};

use crate::constants::ARRIVING_THRESHOLD_MIN;

/// Render a minute count the way riders read it
pub fn format_eta(minutes: i64) -> String {
    if minutes <= ARRIVING_THRESHOLD_MIN {
        "Arriving".to_string()
    } else {
        format!("{minutes} min")
    }
}

/// Sort key for display etas: "Arriving" first, then numeric ascending,
/// then anything unparseable in its original position
pub fn eta_sort_key(eta: &str) -> (u8, i64) {
    if eta == "Arriving" {
        return (0, 0);
    }
    match eta
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<i64>().ok())
    {
        Some(minutes) => (1, minutes),
        None => (2, 0),
    }
}

/// Render a distance in meters for alert and log copy
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as i64)
    }
}

/// Render a UTC timestamp in the local timezone
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta_thresholds() {
        assert_eq!(format_eta(0), "Arriving");
        assert_eq!(format_eta(1), "Arriving");
        assert_eq!(format_eta(2), "2 min");
        assert_eq!(format_eta(15), "15 min");
    }

    #[test]
    fn test_eta_sort_key_ordering() {
        assert!(eta_sort_key("Arriving") < eta_sort_key("2 min"));
        assert!(eta_sort_key("2 min") < eta_sort_key("10 min"));
        assert!(eta_sort_key("10 min") < eta_sort_key("Unknown"));
        assert_eq!(eta_sort_key("Delayed"), eta_sort_key("Unknown"));
    }

    #[test]
    fn test_format_distance_units() {
        assert_eq!(format_distance(400.0), "400 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(1250.0), "1.2 km");
    }
}
