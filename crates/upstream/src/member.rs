use async_trait::async_trait;
use serde::Deserialize;
use valet_core::config::MemberConfig;
use valet_core::{MemberDirectory, Plate, UpstreamError};

use crate::http::{build_client, transport};

/// Mall-app member-profile client. Consulted only when the user's
/// utterance carries no extractable plate.
#[derive(Clone)]
pub struct ShopMemberClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct MemberInfoResponse {
    #[serde(rename = "carPlateList", default)]
    car_plate_list: Vec<MemberPlate>,
}

#[derive(Debug, Default, Deserialize)]
struct MemberPlate {
    #[serde(rename = "carPlate", default)]
    car_plate: String,
}

impl ShopMemberClient {
    pub fn new(config: &MemberConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl MemberDirectory for ShopMemberClient {
    async fn bound_plates(&self, user_id: &str) -> Result<Vec<Plate>, UpstreamError> {
        let url = format!("{}/member/info", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        // An unknown member is a legitimate "no bound plates" outcome.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(UpstreamError::UnexpectedStatus { status: status.as_u16(), url });
        }

        let body = response.text().await.map_err(transport)?;
        let info = serde_json::from_str::<MemberInfoResponse>(&body).map_err(|err| {
            UpstreamError::Decode {
                context: format!("member info from {url}"),
                message: err.to_string(),
            }
        })?;

        Ok(info
            .car_plate_list
            .into_iter()
            .filter(|entry| !entry.car_plate.trim().is_empty())
            .map(|entry| Plate::new(entry.car_plate))
            .collect())
    }
}
