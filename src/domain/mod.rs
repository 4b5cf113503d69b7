//! Domain types
//!
//! Pure data records and geodesy for the tracking core. Nothing in this
//! module does I/O or holds a lock; services and state build on these.

pub mod bus;
pub mod geo;
pub mod ids;
pub mod route;
pub mod stop;
pub mod update;
