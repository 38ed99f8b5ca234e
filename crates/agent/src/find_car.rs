use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use valet_core::{
    MemberDirectory, ParkingInfo, ParkingStrategy, Plate, RegistryError, SessionKey, SessionStore,
    StrategyRegistry, VenueId,
};

use crate::plates::extract_plate;
use crate::prompts::{
    PromptCatalog, PromptError, FIND_CAR_MULTI_RESULT, FIND_CAR_NOT_FOUND, FIND_CAR_RESULT,
    FIND_CAR_UNSUPPORTED_VENUE,
};
use crate::reply::ReplySink;
use crate::LlmClient;

/// Session field naming the multi-turn flow the user is in the middle of.
/// Cleared when this flow finishes its turn.
const CURRENT_INTENTION_FIELD: &str = "current_intention";

#[derive(Clone, Debug)]
pub struct FindCarRequest {
    pub venue: VenueId,
    pub user_id: String,
    pub utterance: String,
}

#[derive(Debug)]
pub struct FindCarOutcome {
    pub template: &'static str,
    pub records: Vec<ParkingInfo>,
}

/// Infrastructure faults of the response path. Lookup failures never land
/// here; they fold into the "no data" rendering instead.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("llm completion failed: {0}")]
    Llm(String),
    #[error("reply delivery failed: {0}")]
    Reply(String),
}

/// Request-scoped find-car orchestration. Holds no per-request state;
/// every collaborator sits behind a seam so the flow is testable without
/// the network.
pub struct FindCarFlow {
    registry: Arc<StrategyRegistry>,
    members: Arc<dyn MemberDirectory>,
    sessions: Arc<dyn SessionStore>,
    prompts: PromptCatalog,
    llm: Arc<dyn LlmClient>,
    plate_concurrency: usize,
}

impl FindCarFlow {
    pub fn new(
        registry: Arc<StrategyRegistry>,
        members: Arc<dyn MemberDirectory>,
        sessions: Arc<dyn SessionStore>,
        prompts: PromptCatalog,
        llm: Arc<dyn LlmClient>,
        plate_concurrency: usize,
    ) -> Self {
        Self { registry, members, sessions, prompts, llm, plate_concurrency }
    }

    pub async fn run(
        &self,
        request: &FindCarRequest,
        reply: &dyn ReplySink,
    ) -> Result<FindCarOutcome, FlowError> {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "agent.find_car.start",
            correlation_id = %correlation_id,
            venue = %request.venue,
            user_id = %request.user_id,
            "find-car flow started"
        );

        let strategy = match self.registry.create(request.venue) {
            Ok(strategy) => strategy,
            Err(RegistryError::UnknownVenue(venue)) => {
                warn!(
                    event_name = "agent.find_car.unsupported_venue",
                    correlation_id = %correlation_id,
                    venue = %venue,
                    "no strategy registered for venue"
                );
                let message = self.prompts.render(
                    FIND_CAR_UNSUPPORTED_VENUE,
                    request.venue,
                    &serde_json::json!({}),
                )?;
                reply.send(&message).await.map_err(|err| FlowError::Reply(err.to_string()))?;
                return Ok(FindCarOutcome {
                    template: FIND_CAR_UNSUPPORTED_VENUE,
                    records: Vec::new(),
                });
            }
        };

        let plates = self.resolve_plates(request, &correlation_id).await;

        let now = Local::now().naive_local();
        let records: Vec<ParkingInfo> = stream::iter(plates)
            .map(|plate| {
                self.lookup_plate(strategy.as_ref(), request.venue, plate, now, &correlation_id)
            })
            .buffered(self.plate_concurrency.max(1))
            .collect::<Vec<Option<ParkingInfo>>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        let template = if records.is_empty() {
            FIND_CAR_NOT_FOUND
        } else if records.len() > 1 {
            FIND_CAR_MULTI_RESULT
        } else {
            FIND_CAR_RESULT
        };

        let payload = serde_json::json!({
            "utterance": request.utterance,
            "car_list": &records,
        });
        let prompt = self.prompts.render(template, request.venue, &payload)?;
        let answer =
            self.llm.complete(&prompt).await.map_err(|err| FlowError::Llm(err.to_string()))?;
        reply.send(&answer).await.map_err(|err| FlowError::Reply(err.to_string()))?;

        let key = SessionKey::new(request.venue, &request.user_id);
        if let Err(err) = self.sessions.delete(&key, CURRENT_INTENTION_FIELD).await {
            warn!(
                event_name = "agent.find_car.session_cleanup_failed",
                correlation_id = %correlation_id,
                error = %err,
                "could not clear current intention"
            );
        }

        info!(
            event_name = "agent.find_car.completed",
            correlation_id = %correlation_id,
            template,
            result_count = records.len(),
            "find-car flow completed"
        );
        Ok(FindCarOutcome { template, records })
    }

    async fn resolve_plates(&self, request: &FindCarRequest, correlation_id: &str) -> Vec<Plate> {
        if let Some(plate) = extract_plate(&request.utterance) {
            debug!(
                event_name = "agent.find_car.plate_extracted",
                correlation_id = %correlation_id,
                plate = %plate,
                "plate extracted from utterance"
            );
            return vec![plate];
        }

        match self.members.bound_plates(&request.user_id).await {
            Ok(plates) => plates,
            Err(err) => {
                warn!(
                    event_name = "agent.find_car.member_lookup_failed",
                    correlation_id = %correlation_id,
                    error = %err,
                    "member lookup failed, treating as no bound plates"
                );
                Vec::new()
            }
        }
    }

    async fn lookup_plate(
        &self,
        strategy: &dyn ParkingStrategy,
        venue: VenueId,
        plate: Plate,
        now: NaiveDateTime,
        correlation_id: &str,
    ) -> Option<ParkingInfo> {
        let fee = match strategy.get_parking_fee(&plate).await {
            Ok(fee) => fee,
            Err(err) => {
                // One uniform failure channel: upstream faults read the
                // same as a legitimate "no data" business outcome.
                warn!(
                    event_name = "agent.find_car.fee_lookup_failed",
                    correlation_id = %correlation_id,
                    plate = %plate,
                    error = %err,
                    "fee lookup failed"
                );
                return None;
            }
        };

        if !fee.is_success() {
            debug!(
                event_name = "agent.find_car.no_fee_record",
                correlation_id = %correlation_id,
                plate = %plate,
                res_code = fee.res_code,
                "no parking record for plate"
            );
            return None;
        }

        let mut info = ParkingInfo::from_fee(venue, &plate, &fee, now);

        // The location lookup only runs once a fee was actually computed.
        if !info.parking_fee.is_empty() {
            match strategy.get_nav_info(&plate).await {
                Ok(nav) if nav.is_success() => {
                    if let Some(location) = nav.data {
                        info.apply_location(&location);
                    }
                }
                Ok(nav) => {
                    debug!(
                        event_name = "agent.find_car.no_location",
                        correlation_id = %correlation_id,
                        plate = %plate,
                        error_no = nav.error_no,
                        "no car location for plate"
                    );
                }
                Err(err) => {
                    warn!(
                        event_name = "agent.find_car.nav_lookup_failed",
                        correlation_id = %correlation_id,
                        plate = %plate,
                        error = %err,
                        "location lookup failed"
                    );
                }
            }
        }

        Some(info)
    }
}
