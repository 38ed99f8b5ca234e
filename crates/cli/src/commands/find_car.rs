use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use valet_agent::{
    FindCarFlow, FindCarRequest, HttpLlmClient, PromptCatalog, ReplySink,
};
use valet_core::config::{AppConfig, LoadOptions};
use valet_core::{InMemorySessionStore, VenueId};
use valet_upstream::{default_registry, ShopMemberClient};

use super::CommandResult;

const COMMAND: &str = "find-car";

/// Prints the concierge reply straight to the terminal.
struct ConsoleSink;

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn send(&self, message: &str) -> Result<()> {
        println!("{message}");
        Ok(())
    }
}

pub fn run(venue: u32, user_id: &str, text: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    crate::init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                2,
            );
        }
    };

    runtime.block_on(run_flow(config, venue, user_id, text))
}

async fn run_flow(config: AppConfig, venue: u32, user_id: &str, text: &str) -> CommandResult {
    let registry = match default_registry(&config) {
        Ok(registry) => registry,
        Err(error) => return CommandResult::failure(COMMAND, "upstream", error.to_string(), 2),
    };
    let members = match ShopMemberClient::new(&config.member) {
        Ok(members) => members,
        Err(error) => return CommandResult::failure(COMMAND, "upstream", error.to_string(), 2),
    };
    let llm = match HttpLlmClient::new(&config.llm) {
        Ok(llm) => llm,
        Err(error) => return CommandResult::failure(COMMAND, "llm", error.to_string(), 2),
    };
    let prompts = match PromptCatalog::with_defaults() {
        Ok(prompts) => prompts,
        Err(error) => return CommandResult::failure(COMMAND, "prompts", error.to_string(), 2),
    };

    let flow = FindCarFlow::new(
        Arc::new(registry),
        Arc::new(members),
        Arc::new(InMemorySessionStore::new()),
        prompts,
        Arc::new(llm),
        config.flow.plate_concurrency,
    );

    let request = FindCarRequest {
        venue: VenueId(venue),
        user_id: user_id.to_owned(),
        utterance: text.to_owned(),
    };

    match flow.run(&request, &ConsoleSink).await {
        Ok(outcome) => CommandResult::success(
            COMMAND,
            format!("rendered `{}` with {} record(s)", outcome.template, outcome.records.len()),
        ),
        Err(error) => CommandResult::failure(COMMAND, "flow", error.to_string(), 1),
    }
}
