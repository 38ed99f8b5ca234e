//! Venue-specific upstream integrations.
//!
//! Each mall site runs its own parking system with its own endpoints and
//! request-signing scheme. This crate owns those differences: one client
//! module per upstream scheme, the member-profile client, and the concrete
//! [`valet_core::ParkingStrategy`] implementations that normalize every
//! wire shape into the venue-agnostic records the flow consumes.

pub mod aibee;
pub mod gateway;
mod http;
pub mod member;
pub mod signing;
pub mod strategies;

pub use aibee::AibeeParkClient;
pub use gateway::GatewayClient;
pub use member::ShopMemberClient;
pub use strategies::{
    default_registry, ChengduSkpStrategy, ZhenghongPlazaStrategy, CHENGDU_SKP, ZHENGHONG_PLAZA,
};
