use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;
use valet_core::VenueId;

pub const FIND_CAR_RESULT: &str = "find_car_result";
pub const FIND_CAR_MULTI_RESULT: &str = "find_car_multi_result";
pub const FIND_CAR_NOT_FOUND: &str = "find_car_not_found";
pub const FIND_CAR_UNSUPPORTED_VENUE: &str = "find_car_unsupported_venue";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("unknown prompt template `{0}`")]
    UnknownTemplate(String),
    #[error("prompt payload must be a JSON object")]
    PayloadShape,
    #[error("template rendering failed: {0}")]
    Render(#[from] tera::Error),
}

/// Template catalog for the conversational layer. Ships with built-in
/// defaults; venues that need different phrasing override by name before
/// the catalog is handed to the flow.
pub struct PromptCatalog {
    tera: Tera,
}

impl PromptCatalog {
    pub fn with_defaults() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (FIND_CAR_RESULT, include_str!("../templates/find_car_result.tera")),
            (FIND_CAR_MULTI_RESULT, include_str!("../templates/find_car_multi_result.tera")),
            (FIND_CAR_NOT_FOUND, include_str!("../templates/find_car_not_found.tera")),
            (
                FIND_CAR_UNSUPPORTED_VENUE,
                include_str!("../templates/find_car_unsupported_venue.tera"),
            ),
        ])?;
        Ok(Self { tera })
    }

    /// Replaces (or adds) a template body under the given name.
    pub fn set_template(&mut self, name: &str, body: &str) -> Result<(), PromptError> {
        self.tera.add_raw_template(name, body)?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|registered| registered == name)
    }

    /// Renders the named template with the venue id and the payload's
    /// top-level fields in scope.
    pub fn render(
        &self,
        name: &str,
        venue: VenueId,
        payload: &Value,
    ) -> Result<String, PromptError> {
        if !self.has_template(name) {
            return Err(PromptError::UnknownTemplate(name.to_owned()));
        }

        let mut context =
            Context::from_value(payload.clone()).map_err(|_| PromptError::PayloadShape)?;
        context.insert("venue_id", &venue.0);
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use valet_core::VenueId;

    use super::{
        PromptCatalog, PromptError, FIND_CAR_MULTI_RESULT, FIND_CAR_NOT_FOUND, FIND_CAR_RESULT,
        FIND_CAR_UNSUPPORTED_VENUE,
    };

    fn car(plate: &str, fee: &str) -> serde_json::Value {
        json!({
            "venue": 702,
            "plate": plate,
            "parking_time": "2 hours 5 minutes",
            "parking_fee": fee,
            "end_floor": "B2",
            "end_position": "A001",
            "end_name": "B2-A001"
        })
    }

    #[test]
    fn single_result_prompt_names_plate_fee_and_location() {
        let catalog = PromptCatalog::with_defaults().unwrap();
        let payload = json!({ "utterance": "帮我找车", "car_list": [car("辽A66D6J", "5.00")] });

        let prompt = catalog.render(FIND_CAR_RESULT, VenueId(702), &payload).unwrap();

        assert!(prompt.contains("702"));
        assert!(prompt.contains("辽A66D6J"));
        assert!(prompt.contains("5.00"));
        assert!(prompt.contains("B2-A001"));
    }

    #[test]
    fn multi_result_prompt_lists_every_car() {
        let catalog = PromptCatalog::with_defaults().unwrap();
        let payload = json!({
            "utterance": "我的车在哪",
            "car_list": [car("辽A66D6J", "5.00"), car("川ADM641", "12.00")]
        });

        let prompt = catalog.render(FIND_CAR_MULTI_RESULT, VenueId(702), &payload).unwrap();

        assert!(prompt.contains("辽A66D6J"));
        assert!(prompt.contains("川ADM641"));
    }

    #[test]
    fn not_found_prompt_renders_without_car_list() {
        let catalog = PromptCatalog::with_defaults().unwrap();
        let payload = json!({ "utterance": "where is my car", "car_list": [] });

        let prompt = catalog.render(FIND_CAR_NOT_FOUND, VenueId(801), &payload).unwrap();

        assert!(prompt.contains("801"));
        assert!(prompt.contains("where is my car"));
    }

    #[test]
    fn unsupported_venue_message_carries_the_venue_id() {
        let catalog = PromptCatalog::with_defaults().unwrap();
        let message =
            catalog.render(FIND_CAR_UNSUPPORTED_VENUE, VenueId(9999), &json!({})).unwrap();

        assert!(message.contains("9999"));
    }

    #[test]
    fn unknown_template_is_a_typed_error() {
        let catalog = PromptCatalog::with_defaults().unwrap();
        let error = catalog.render("no_such_template", VenueId(702), &json!({})).err().unwrap();

        assert!(matches!(error, PromptError::UnknownTemplate(ref name) if name == "no_such_template"));
    }

    #[test]
    fn templates_can_be_overridden_by_name() {
        let mut catalog = PromptCatalog::with_defaults().unwrap();
        catalog.set_template(FIND_CAR_NOT_FOUND, "custom for venue {{ venue_id }}").unwrap();

        let prompt = catalog
            .render(FIND_CAR_NOT_FOUND, VenueId(702), &json!({ "utterance": "hi" }))
            .unwrap();

        assert_eq!(prompt, "custom for venue 702");
    }
}
