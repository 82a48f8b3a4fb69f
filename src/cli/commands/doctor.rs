//! Doctor command - verify credentials and configuration.

use crate::cli::{preflight, Output};
use crate::config::{Credentials, Settings};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, credentials: &Credentials, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Delve Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Model").bold());
    let model_checks = check_model(settings, credentials);
    for check in &model_checks {
        check.print();
    }
    checks.extend(model_checks);

    println!();

    println!("{}", style("Tools").bold());
    let tool_checks = check_tools(settings, credentials);
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_telemetry(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Delve.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Delve is ready to use.");
    }

    Ok(())
}

fn check_model(settings: &Settings, credentials: &Credentials) -> Vec<CheckResult> {
    let mut results = vec![CheckResult::ok(
        "Model",
        &format!("{} ({})", settings.model_name(), settings.agent.variant),
    )];

    if let Some(base) = &settings.model.api_base {
        results.push(CheckResult::ok("API base", base));
    }

    results.push(match (&credentials.openai_api_key, preflight::check(settings, credentials)) {
        (Some(key), _) => CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask(key))),
        (None, Ok(())) => CheckResult::warning(
            "OPENAI_API_KEY",
            "not set",
            "Only needed if the custom API base requires a key",
        ),
        (None, Err(_)) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    });

    results
}

fn check_tools(settings: &Settings, credentials: &Credentials) -> Vec<CheckResult> {
    let variant = settings.agent.variant;
    let missing = preflight::missing_tool_credentials(variant, credentials);

    let tools: Vec<&str> = variant.tools().iter().map(|t| t.name()).collect();
    let mut results = vec![CheckResult::ok("Registered tools", &tools.join(", "))];

    for var in ["BRAVE_API_KEY", "REDDIT_CLIENT_ID", "REDDIT_CLIENT_SECRET"] {
        if missing.contains(&var) {
            results.push(CheckResult::warning(
                var,
                "not set",
                &format!("Tools will return placeholder results. Set with: export {}=...", var),
            ));
        }
    }

    if missing.is_empty() {
        results.push(CheckResult::ok("Tool credentials", "all present"));
    }

    results
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: delve config edit",
        )
    }
}

fn check_telemetry(settings: &Settings) -> CheckResult {
    let telemetry = &settings.telemetry;
    let summary = format!(
        "{} {} ({})",
        telemetry.service_name, telemetry.service_version, telemetry.environment
    );
    match &telemetry.token {
        Some(_) => CheckResult::ok("Telemetry", &format!("{}, token set", summary)),
        None => CheckResult::ok("Telemetry", &summary),
    }
}

/// Show only the start and end of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("sk-abcdefghijklmnop1234"), "sk-abcd...1234");
        assert_eq!(mask("short"), "*****");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let results = check_model(&Settings::default(), &Credentials::default());
        let key = results.iter().find(|r| r.name == "OPENAI_API_KEY").unwrap();
        assert_eq!(key.status, CheckStatus::Error);
    }

    #[test]
    fn test_missing_tool_keys_are_warnings() {
        let results = check_tools(&Settings::default(), &Credentials::default());
        assert!(results
            .iter()
            .any(|r| r.name == "BRAVE_API_KEY" && r.status == CheckStatus::Warning));
        assert!(!results.iter().any(|r| r.status == CheckStatus::Error));
    }
}
