use async_trait::async_trait;
use valet_core::config::AppConfig;
use valet_core::{
    FeeRecord, NavLocation, NavRecord, ParkingStrategy, Plate, StrategyRegistry, UpstreamError,
    VenueId,
};

use crate::aibee::{AibeeParkClient, CarLocationResponse, ParkingFeeResponse};
use crate::gateway::{GatewayClient, GatewayEnvelope, GatewayFee, GatewaySpace};

pub const CHENGDU_SKP: VenueId = VenueId(702);
pub const ZHENGHONG_PLAZA: VenueId = VenueId(801);

/// Chengdu SKP rides the Aibee park API: fee and "find my car" go through
/// the fee endpoint, car location through the `car-loc` endpoint.
pub struct ChengduSkpStrategy {
    client: AibeeParkClient,
}

impl ChengduSkpStrategy {
    pub fn new(client: AibeeParkClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParkingStrategy for ChengduSkpStrategy {
    async fn get_parking_fee(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError> {
        Ok(fee_from_aibee(self.client.parking_fee(plate).await?))
    }

    async fn get_nav_info(&self, plate: &Plate) -> Result<NavRecord, UpstreamError> {
        Ok(nav_from_aibee(self.client.car_location(plate).await?))
    }

    async fn find_car(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError> {
        self.get_parking_fee(plate).await
    }
}

/// Zhenghong Plaza rides the form-gateway API; both lookups dispatch
/// through the shared `/api` endpoint by method name.
pub struct ZhenghongPlazaStrategy {
    client: GatewayClient,
}

impl ZhenghongPlazaStrategy {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParkingStrategy for ZhenghongPlazaStrategy {
    async fn get_parking_fee(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError> {
        Ok(fee_from_gateway(self.client.parking_fee(plate).await?))
    }

    async fn get_nav_info(&self, plate: &Plate) -> Result<NavRecord, UpstreamError> {
        Ok(nav_from_gateway(self.client.parking_space(plate).await?))
    }

    async fn find_car(&self, plate: &Plate) -> Result<FeeRecord, UpstreamError> {
        self.get_parking_fee(plate).await
    }
}

fn fee_from_aibee(response: ParkingFeeResponse) -> FeeRecord {
    let data = response.data.unwrap_or_default();
    FeeRecord {
        error: None,
        res_code: response.error_no,
        in_time: data.in_time,
        charge_money: data.charge_money,
    }
}

fn nav_from_aibee(response: CarLocationResponse) -> NavRecord {
    NavRecord {
        error: None,
        error_no: response.error_no,
        data: response.data.map(|location| NavLocation {
            floor_name: location.floor,
            space_no: location.lot,
        }),
    }
}

fn fee_from_gateway(envelope: GatewayEnvelope<GatewayFee>) -> FeeRecord {
    let data = envelope.data.unwrap_or_default();
    FeeRecord {
        error: None,
        res_code: envelope.res_code,
        in_time: data.in_time,
        charge_money: data.charge_money,
    }
}

fn nav_from_gateway(envelope: GatewayEnvelope<GatewaySpace>) -> NavRecord {
    NavRecord {
        error: None,
        error_no: envelope.res_code,
        data: envelope.data.map(|space| NavLocation {
            floor_name: space.floor_name,
            space_no: space.space_no,
        }),
    }
}

/// Builds the startup registry with the built-in venues. Additional venues
/// are added by calling [`StrategyRegistry::register`] on the returned
/// value before handing it to the flow.
pub fn default_registry(config: &AppConfig) -> Result<StrategyRegistry, UpstreamError> {
    let aibee = AibeeParkClient::new(&config.upstream.aibee)?;
    let gateway = GatewayClient::new(&config.upstream.gateway)?;

    let mut registry = StrategyRegistry::new();
    registry.register(CHENGDU_SKP, move || ChengduSkpStrategy::new(aibee.clone()));
    registry.register(ZHENGHONG_PLAZA, move || ZhenghongPlazaStrategy::new(gateway.clone()));
    Ok(registry)
}
