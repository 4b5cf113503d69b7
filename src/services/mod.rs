//! Service layer
//!
//! Feed plumbing and the composition hub.
//!
//! ```text
//!   +----------+    FeedEvent     +------------+   ChangeEvent    +-----------+
//!   | SimFeed  | ---------------> | TransitHub | ---------------> | observers |
//!   +----------+    (channel)     +------------+   (synchronous)  +-----------+
//!                                   |   |   |
//!                    +--------------+   |   +----------------+
//!                    v                  v                    v
//!              TransitStore       AlertService          IdRegistry
//!              (entities)         (proximity)           (persisted)
//! ```
//!
//! The hub is the only writer; everything behind it is plain state.

mod events;
mod feed;
mod hub;
mod registry;
mod runtime;

pub use events::*;
pub use feed::*;
pub use hub::*;
pub use registry::*;
pub use runtime::*;
