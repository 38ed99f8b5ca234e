use serde::{Deserialize, Serialize};

/// Business identifier for a mall site with its own parking-system
/// integration. Assigned externally; key into the strategy registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(pub u32);

impl std::fmt::Display for VenueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VenueId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
