pub mod config;
pub mod domain;
pub mod errors;
pub mod member;
pub mod session;
pub mod strategy;

pub use domain::parking::{FeeRecord, NavLocation, NavRecord, ParkingInfo};
pub use domain::plate::Plate;
pub use domain::venue::VenueId;
pub use errors::{RegistryError, SessionError, UpstreamError};
pub use member::MemberDirectory;
pub use session::{InMemorySessionStore, SessionKey, SessionStore};
pub use strategy::{BoxedStrategy, ParkingStrategy, StrategyRegistry};
