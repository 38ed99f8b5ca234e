use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::parking::{FeeRecord, NavRecord};
use crate::domain::plate::Plate;
use crate::domain::venue::VenueId;
use crate::errors::{RegistryError, UpstreamError};

/// Capability contract every venue integration must satisfy.
///
/// The three operations are distinct on purpose: a venue may route fee
/// queries, location queries, and "find my car" to different upstream
/// endpoints with different signing schemes. Implementations are stateless
/// and cheap to construct; the registry hands out a fresh instance per call.
#[async_trait]
pub trait ParkingStrategy: Send + Sync {
    /// Queries the venue's parking-fee system for the given plate.
    async fn get_parking_fee(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError>;

    /// Queries the venue's navigation system for the car's floor and space.
    async fn get_nav_info(&self, plate: &Plate) -> Result<NavRecord, UpstreamError>;

    /// Locates the car when the use case is "find my car" rather than
    /// "show me my fee".
    async fn find_car(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError>;
}

pub type BoxedStrategy = Box<dyn ParkingStrategy>;

type StrategyFactory = Box<dyn Fn() -> BoxedStrategy + Send + Sync>;

/// Venue-to-strategy table, constructed explicitly at startup and handed
/// to the flow. Registration is late-bound: new venues can be added at
/// runtime without touching call sites, and the last registration for an
/// id wins.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: HashMap<VenueId, StrategyFactory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, S>(&mut self, venue: VenueId, factory: F)
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: ParkingStrategy + 'static,
    {
        self.factories.insert(venue, Box::new(move || Box::new(factory())));
    }

    /// Instantiates a fresh strategy for the venue. An unregistered id is
    /// a hard configuration error carrying the offending venue id; there
    /// is no fallback strategy.
    pub fn create(&self, venue: VenueId) -> Result<BoxedStrategy, RegistryError> {
        self.factories.get(&venue).map(|factory| factory()).ok_or(RegistryError::UnknownVenue(venue))
    }

    pub fn contains(&self, venue: VenueId) -> bool {
        self.factories.contains_key(&venue)
    }

    /// Registered venue ids in ascending order.
    pub fn venues(&self) -> Vec<VenueId> {
        let mut venues: Vec<VenueId> = self.factories.keys().copied().collect();
        venues.sort();
        venues
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::{ParkingStrategy, StrategyRegistry};
    use crate::domain::parking::{FeeRecord, NavRecord};
    use crate::domain::plate::Plate;
    use crate::domain::venue::VenueId;
    use crate::errors::{RegistryError, UpstreamError};

    struct LabeledStrategy {
        label: &'static str,
    }

    #[async_trait]
    impl ParkingStrategy for LabeledStrategy {
        async fn get_parking_fee(&self, _plate: &Plate) -> Result<FeeRecord, UpstreamError> {
            Ok(FeeRecord { in_time: self.label.to_owned(), ..FeeRecord::default() })
        }

        async fn get_nav_info(&self, _plate: &Plate) -> Result<NavRecord, UpstreamError> {
            Ok(NavRecord::default())
        }

        async fn find_car(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError> {
            self.get_parking_fee(plate).await
        }
    }

    #[tokio::test]
    async fn registered_venue_yields_a_working_strategy() {
        let mut registry = StrategyRegistry::new();
        registry.register(VenueId(702), || LabeledStrategy { label: "skp" });

        let strategy = registry.create(VenueId(702)).expect("venue 702 is registered");
        let fee = strategy.get_parking_fee(&Plate::from("辽A66D6J")).await.unwrap();
        assert_eq!(fee.in_time, "skp");
    }

    #[test]
    fn unknown_venue_is_a_hard_error_with_the_offending_id() {
        let registry = StrategyRegistry::new();
        let error = registry.create(VenueId(9999)).err().expect("must not return a strategy");
        assert_eq!(error, RegistryError::UnknownVenue(VenueId(9999)));
    }

    #[tokio::test]
    async fn runtime_registration_extends_the_table_and_last_wins() {
        let mut registry = StrategyRegistry::new();
        registry.register(VenueId(999), || LabeledStrategy { label: "first" });
        assert!(registry.contains(VenueId(999)));

        registry.register(VenueId(999), || LabeledStrategy { label: "second" });
        let strategy = registry.create(VenueId(999)).unwrap();
        let fee = strategy.get_parking_fee(&Plate::from("京A12345")).await.unwrap();
        assert_eq!(fee.in_time, "second");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn venues_are_listed_in_ascending_order() {
        let mut registry = StrategyRegistry::new();
        registry.register(VenueId(801), || LabeledStrategy { label: "a" });
        registry.register(VenueId(702), || LabeledStrategy { label: "b" });
        assert_eq!(registry.venues(), vec![VenueId(702), VenueId(801)]);
    }
}
