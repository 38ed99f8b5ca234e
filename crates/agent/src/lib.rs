//! Find-car orchestration for the mall concierge agent.
//!
//! This crate is the glue between the conversational platform and the
//! venue integrations:
//! 1. **Strategy resolution** - map the venue id to its parking
//!    integration via the registry, failing loudly on unknown venues
//! 2. **Plate resolution** (`plates`) - extract a plate from the
//!    utterance, else fall back to the member profile
//! 3. **Lookup + normalization** (`find_car`) - fee and car-location
//!    queries per plate, folded into `ParkingInfo` records
//! 4. **Response rendering** (`prompts`, `llm`, `reply`) - prompt
//!    template + model completion, delivered through the reply sink
//!
//! # Safety Principle
//!
//! The LLM only phrases the answer. Which cars were found, their fees and
//! locations are deterministic facts assembled here; the model never
//! invents or drops records.

pub mod find_car;
pub mod llm;
pub mod plates;
pub mod prompts;
pub mod reply;

pub use find_car::{FindCarFlow, FindCarOutcome, FindCarRequest, FlowError};
pub use llm::{HttpLlmClient, LlmClient};
pub use prompts::{PromptCatalog, PromptError};
pub use reply::ReplySink;
