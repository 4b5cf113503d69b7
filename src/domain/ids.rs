//! Type-safe identifiers for transit entities
//!
//! Each id wraps an `Arc<str>` so clones across events, snapshots and
//! registries stay cheap. Equality short-circuits on pointer identity
//! before falling back to a string compare.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

macro_rules! impl_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: impl Into<Arc<str>>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

impl_id!(BusId, "Unique identifier for a bus");
impl_id!(StopId, "Unique identifier for a stop");
impl_id!(RouteId, "Unique identifier for a route");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_and_clone() {
        let a = BusId::new("bus-001");
        let b = a.clone();
        let c = BusId::from("bus-001".to_string());
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, BusId::new("bus-002"));
        assert!(a < BusId::new("bus-002"));
    }

    #[test]
    fn test_display_and_as_str() {
        let id = StopId::new("stop-dadar");
        assert_eq!(id.as_str(), "stop-dadar");
        assert_eq!(id.to_string(), "stop-dadar");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id = RouteId::new("route-101");
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, "\"route-101\"");
        let back: RouteId = serde_json::from_str(&json).expect("deserialize id");
        assert_eq!(back, id);
    }
}
