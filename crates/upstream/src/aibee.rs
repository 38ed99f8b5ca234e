use chrono::Utc;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use valet_core::config::AibeeConfig;
use valet_core::{Plate, UpstreamError};

use crate::http::{build_client, retry_with_backoff, transport};
use crate::signing::aibee_sign;

const CAR_LOCATION_PATH: &str = "/car/v1/app/car-loc";
const PARKING_FEE_PATH: &str = "/car/v1/app/parking-fee";

/// `error_no` returned by the location endpoint when the plate has no
/// parked car on record.
pub const CAR_NOT_FOUND: i64 = 605;

/// Client for the Aibee park API (JSON POST, header-based auth, SHA-1
/// body signature). Cheap to clone; the underlying connection pool is
/// shared.
#[derive(Clone)]
pub struct AibeeParkClient {
    client: reqwest::Client,
    base_url: String,
    group_id: String,
    api_key: String,
    api_secret: String,
    max_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CarLocationResponse {
    #[serde(default)]
    pub error_no: i64,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub data: Option<CarLocation>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CarLocation {
    #[serde(default)]
    pub car_plate: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub lot: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub last_in_time: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParkingFeeResponse {
    #[serde(default)]
    pub error_no: i64,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub data: Option<ParkingFee>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ParkingFee {
    #[serde(default)]
    pub in_time: String,
    #[serde(default)]
    pub charge_money: String,
}

impl AibeeParkClient {
    pub fn new(config: &AibeeConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            group_id: config.group_id.clone(),
            api_key: config.api_key.expose_secret().to_owned(),
            api_secret: config.api_secret.expose_secret().to_owned(),
            max_retries: config.max_retries,
        })
    }

    pub async fn car_location(&self, plate: &Plate) -> Result<CarLocationResponse, UpstreamError> {
        self.post_signed(CAR_LOCATION_PATH, plate).await
    }

    pub async fn parking_fee(&self, plate: &Plate) -> Result<ParkingFeeResponse, UpstreamError> {
        self.post_signed(PARKING_FEE_PATH, plate).await
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        plate: &Plate,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{path}", self.base_url);
        // The signature covers the exact body bytes, so the body is
        // serialized once and reused across retries.
        let body_json = serde_json::json!({
            "group_id": self.group_id,
            "car_plate": plate.as_str(),
        })
        .to_string();

        retry_with_backoff(self.max_retries, || async {
            let timestamp = Utc::now().timestamp();
            let sign = aibee_sign(&body_json, timestamp, &self.api_secret);

            let response = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .header("Aibee-Auth-ApiKey", &self.api_key)
                .header("Aibee-Auth-Sign", sign)
                .header("Aibee-Auth-Timestamp", timestamp.to_string())
                .header("group_id", &self.group_id)
                .body(body_json.clone())
                .send()
                .await
                .map_err(transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpstreamError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }

            let body = response.text().await.map_err(transport)?;
            serde_json::from_str::<T>(&body).map_err(|err| UpstreamError::Decode {
                context: format!("response from {url}"),
                message: err.to_string(),
            })
        })
        .await
    }
}
