//! Error types for the tracking core
//!
//! Rejected feed payloads are typed here. Plain lookup misses stay
//! `Option` at the call site; persistence failures are logged at the
//! registry edge rather than surfaced.

use snafu::Snafu;

/// Errors produced while ingesting transit state
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A bus payload arrived without a position
    #[snafu(display("Update for bus {id} has no location"))]
    MissingLocation { id: String },

    /// A bus payload carried a position that is not a finite coordinate
    #[snafu(display("Update for bus {id} has a non-finite location ({lat}, {lng})"))]
    NonFiniteCoordinate { id: String, lat: f64, lng: f64 },

    /// Anything else that deserves a message rather than a variant
    #[snafu(display("{message}"))]
    Invalid { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
