//! `delve config` subcommands.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the config command against `config_path`, or the default location.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => show(&settings)?,
        ConfigAction::Edit => edit(&settings, &config_path)?,
        ConfigAction::Path => println!("{}", config_path.display()),
    }

    Ok(())
}

/// What the active variant resolves to, before the raw settings.
fn summary(settings: &Settings) -> Vec<(&'static str, String)> {
    let variant = settings.agent.variant;
    let tools = variant
        .tools()
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        ("Assistant", variant.title().to_string()),
        ("Variant", variant.to_string()),
        ("Model", settings.model_name()),
        ("Tools", tools),
    ]
}

fn show(settings: &Settings) -> Result<()> {
    Output::header("Active assistant");
    for (key, value) in summary(settings) {
        Output::kv(key, &value);
    }
    println!();

    let rendered = toml::to_string_pretty(settings).context("Failed to serialize config")?;
    println!("{}", rendered);
    Ok(())
}

fn edit(settings: &Settings, config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        settings.save_to(&config_path.to_path_buf())?;
        Output::info(&format!("Wrote defaults to {}", config_path.display()));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    match std::process::Command::new(&editor).arg(config_path).status() {
        Ok(status) if status.success() => Output::success("Config saved."),
        Ok(status) => Output::warning(&format!("{} exited with {}", editor, status)),
        Err(e) => {
            Output::error(&format!("Could not start {}: {}", editor, e));
            Output::info(&format!("Edit {} by hand instead.", config_path.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_lists_variant_tools() {
        let mut settings = Settings::default();
        settings.agent.variant = Variant::Reddit;

        assert_eq!(
            summary(&settings),
            vec![
                ("Assistant", "Reddit Search Analyzer".to_string()),
                ("Variant", "reddit".to_string()),
                ("Model", "gpt-4o-mini".to_string()),
                ("Tools", "find_subreddit, search_reddit".to_string()),
            ]
        );
    }

    #[test]
    fn test_edit_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::env::set_var("EDITOR", "true");

        edit(&Settings::default(), &path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.agent.variant, Variant::WebSearch);
    }
}
