//! Configuration module for Delve.
//!
//! Handles loading application settings, environment credentials and the
//! per-variant prompts.

mod prompts;
mod settings;

pub use prompts::Variant;
pub use settings::{
    AgentSettings, Credentials, EndpointSettings, GeneralSettings, ModelSettings,
    ServerSettings, Settings, TelemetrySettings,
};
