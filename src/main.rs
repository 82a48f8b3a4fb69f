//! Delve CLI entry point.

use anyhow::Result;
use clap::Parser;
use delve::cli::{commands, Cli, Commands};
use delve::config::{Credentials, Settings};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let mut settings = Settings::load_from(config_path.as_ref())?;
    settings.apply_env();
    if let Some(variant) = cli.variant {
        settings.agent.variant = variant;
    }
    if let Some(model) = &cli.model {
        settings.model.name = Some(model.clone());
    }
    let credentials = Credentials::from_env();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("delve={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let telemetry = &settings.telemetry;
    let span = tracing::info_span!(
        "session",
        service = %telemetry.service_name,
        version = %telemetry.service_version,
        environment = %telemetry.environment,
        telemetry_token = telemetry.token.is_some(),
    );

    let verbose = cli.verbose > 0;

    // Execute command
    async move {
        match &cli.command {
            Commands::Chat => {
                commands::run_chat(settings, credentials, verbose).await?;
            }

            Commands::Ask { question } => {
                commands::run_ask(question, settings, credentials, verbose).await?;
            }

            Commands::Serve { host, port } => {
                commands::run_serve(host.clone(), *port, settings, credentials).await?;
            }

            Commands::Doctor => {
                let path = config_path.unwrap_or_else(Settings::default_config_path);
                commands::run_doctor(&settings, &credentials, &path)?;
            }

            Commands::Config { action } => {
                commands::run_config(action, settings, config_path)?;
            }
        }

        Ok::<_, anyhow::Error>(())
    }
    .instrument(span)
    .await
}
