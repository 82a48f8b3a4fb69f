//! Ask command implementation.

use super::{build_agent, new_session};
use crate::cli::TerminalRenderer;
use crate::config::{Credentials, Settings};
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command: one question, one streamed answer.
pub async fn run_ask(
    question: &str,
    settings: Settings,
    credentials: Credentials,
    verbose: bool,
) -> Result<()> {
    let agent = Arc::new(build_agent(&settings, &credentials)?);
    let mut session = new_session(agent, &settings, &credentials);

    let mut renderer = TerminalRenderer::new();
    if verbose {
        renderer = renderer.with_full_output();
    }

    // The renderer has already reported the failure.
    if session.submit(question, &mut renderer).await.is_err() {
        std::process::exit(1);
    }

    Ok(())
}
