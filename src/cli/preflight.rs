//! Pre-flight checks before starting a chat.
//!
//! Validates that the model is reachable with the configured credentials
//! before the first question is typed.

use crate::config::{Credentials, Settings, Variant};
use crate::error::{DelveError, Result};
use crate::lookup::ToolKind;

/// Check that the model can be called.
///
/// An API key is required unless a custom `api_base` is configured, since local
/// OpenAI-compatible servers often need none.
pub fn check(settings: &Settings, credentials: &Credentials) -> Result<()> {
    if credentials.openai_api_key.is_none() && settings.model.api_base.is_none() {
        return Err(DelveError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ));
    }
    Ok(())
}

/// Environment variables the variant's tools need but that are not set.
///
/// Tools still run without them and answer with a placeholder.
pub fn missing_tool_credentials(variant: Variant, credentials: &Credentials) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for tool in variant.tools() {
        match tool {
            ToolKind::SearchWeb if credentials.brave_api_key.is_none() => {
                missing.push("BRAVE_API_KEY")
            }
            ToolKind::FindSubreddit | ToolKind::SearchReddit if credentials.reddit().is_none() => {
                for var in ["REDDIT_CLIENT_ID", "REDDIT_CLIENT_SECRET"] {
                    if !missing.contains(&var) {
                        missing.push(var);
                    }
                }
            }
            _ => {}
        }
    }
    missing
}
