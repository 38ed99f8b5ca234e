use std::collections::BTreeMap;

use chrono::Local;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use valet_core::config::GatewayConfig;
use valet_core::{Plate, UpstreamError};

use crate::http::{build_client, retry_with_backoff, transport};
use crate::signing::gateway_sign;

const FEE_METHOD: &str = "parking.fee.query";
const SPACE_METHOD: &str = "parking.space.query";
const API_VERSION: &str = "1.0";

/// Client for the form-gateway parking API: a single `/api` endpoint
/// dispatched by the `name` system parameter, form-urlencoded and signed
/// with HMAC-SHA256 over the sorted parameter set.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    app_key: String,
    secret: String,
    store_id: String,
    max_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GatewayEnvelope<T> {
    #[serde(rename = "resCode", default)]
    pub res_code: i64,
    #[serde(rename = "resMsg", default)]
    pub res_msg: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewayFee {
    #[serde(rename = "inTime", default)]
    pub in_time: String,
    #[serde(rename = "chargeMoney", default)]
    pub charge_money: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewaySpace {
    #[serde(rename = "floorName", default)]
    pub floor_name: String,
    #[serde(rename = "spaceNo", default)]
    pub space_no: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            app_key: config.app_key.clone(),
            secret: config.secret.expose_secret().to_owned(),
            store_id: config.store_id.clone(),
            max_retries: config.max_retries,
        })
    }

    pub async fn parking_fee(
        &self,
        plate: &Plate,
    ) -> Result<GatewayEnvelope<GatewayFee>, UpstreamError> {
        self.call(FEE_METHOD, plate).await
    }

    pub async fn parking_space(
        &self,
        plate: &Plate,
    ) -> Result<GatewayEnvelope<GatewaySpace>, UpstreamError> {
        self.call(SPACE_METHOD, plate).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        plate: &Plate,
    ) -> Result<GatewayEnvelope<T>, UpstreamError> {
        let url = format!("{}/api", self.base_url);

        retry_with_backoff(self.max_retries, || async {
            // The gateway checks the timestamp window per request, so the
            // parameter set and signature are rebuilt on every attempt.
            let mut params = BTreeMap::new();
            params.insert("app_key".to_owned(), self.app_key.clone());
            params.insert("name".to_owned(), method.to_owned());
            params.insert("version".to_owned(), API_VERSION.to_owned());
            params.insert("format".to_owned(), "JSON".to_owned());
            params
                .insert("timestamp".to_owned(), Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
            params.insert("storeId".to_owned(), self.store_id.clone());
            params.insert("carPlate".to_owned(), plate.as_str().to_owned());

            let sign = gateway_sign(&params, &self.secret);
            params.insert("sign".to_owned(), sign);

            let response =
                self.client.post(&url).form(&params).send().await.map_err(transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpstreamError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }

            let body = response.text().await.map_err(transport)?;
            serde_json::from_str::<GatewayEnvelope<T>>(&body).map_err(|err| {
                UpstreamError::Decode {
                    context: format!("{method} response from {url}"),
                    message: err.to_string(),
                }
            })
        })
        .await
    }
}
