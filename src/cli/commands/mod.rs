//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve, AppState};

use crate::agent::Agent;
use crate::cli::{preflight, Output};
use crate::config::{Credentials, Settings};
use crate::openai::OpenAIModel;
use crate::session::ChatSession;
use std::sync::Arc;

/// Build the agent for the configured variant after the pre-flight check.
pub(crate) fn build_agent(settings: &Settings, credentials: &Credentials) -> anyhow::Result<Agent> {
    if let Err(e) = preflight::check(settings, credentials) {
        Output::error(&format!("{}", e));
        Output::info("Run 'delve doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    for var in preflight::missing_tool_credentials(settings.agent.variant, credentials) {
        Output::warning(&format!("{} not set; related tools return placeholder results.", var));
    }

    let model = OpenAIModel::from_settings(&settings.model, credentials)?;
    Ok(Agent::from_settings(Arc::new(model), settings))
}

/// Start a fresh session for `agent`.
pub(crate) fn new_session(
    agent: Arc<Agent>,
    settings: &Settings,
    credentials: &Credentials,
) -> ChatSession {
    ChatSession::new(agent, settings.endpoints.clone(), credentials.clone())
}
