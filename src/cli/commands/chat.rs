//! Interactive chat command.

use super::{build_agent, new_session};
use crate::cli::output::{compact_json, content_preview, pretty_json};
use crate::cli::{Output, TerminalRenderer};
use crate::config::{Credentials, Settings};
use crate::presentation::{ToolUsage, ToolUsageLog};
use crate::session::ChatSession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Input that is not a question for the agent.
#[derive(Debug, PartialEq)]
enum ChatCommand {
    Exit,
    Tools,
    History,
    Empty,
    Message,
}

fn classify(input: &str) -> ChatCommand {
    let input = input.trim();
    if input.is_empty() {
        ChatCommand::Empty
    } else if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        ChatCommand::Exit
    } else if input.eq_ignore_ascii_case("/tools") {
        ChatCommand::Tools
    } else if input.eq_ignore_ascii_case("/history") {
        ChatCommand::History
    } else {
        ChatCommand::Message
    }
}

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings, credentials: Credentials, verbose: bool) -> Result<()> {
    let agent = Arc::new(build_agent(&settings, &credentials)?);
    let variant = settings.agent.variant;
    let mut session = new_session(agent, &settings, &credentials);

    println!("\n{}", style(variant.title()).bold().cyan());
    println!(
        "{}",
        style(format!("{} ({})", variant.input_hint(), session.agent().model_name())).dim()
    );
    println!(
        "{}\n",
        style("Type 'exit' to quit, '/tools' for tool usage, '/history' for the transcript.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        match classify(&input) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatCommand::Tools => print_tool_log(session.tool_log()),
            ChatCommand::History => print_history(&session),
            ChatCommand::Message => {
                let mut renderer = TerminalRenderer::new();
                if verbose {
                    renderer = renderer.with_full_output();
                }
                // Failures are shown by the renderer and the chat continues.
                let _ = session.submit(input.trim(), &mut renderer).await;
            }
        }
    }

    Ok(())
}

/// Characters of a tool response shown by `/tools`.
const RESPONSE_PREVIEW_CHARS: usize = 300;

fn usage_fields(call: &ToolUsage, max_response: usize) -> [(&'static str, String); 2] {
    [
        ("arguments", compact_json(&call.arguments)),
        (
            "response",
            content_preview(&pretty_json(&call.response), max_response),
        ),
    ]
}

fn print_tool_log(log: &ToolUsageLog) {
    Output::header("Tool Usage");
    if log.is_empty() {
        Output::info("No tools used yet.");
        return;
    }

    for (i, interaction) in log.interactions().iter().enumerate() {
        println!(
            "\n{} {}",
            style(format!("Interaction {}", i + 1)).bold(),
            style(interaction.timestamp.format("%H:%M:%S")).dim()
        );
        for call in &interaction.calls {
            Output::list_item(&format!("{} ({})", call.tool, style(&call.id).dim()));
            for (key, value) in usage_fields(call, RESPONSE_PREVIEW_CHARS) {
                Output::kv(key, &value);
            }
        }
    }
    println!();
}

fn print_history(session: &ChatSession) {
    Output::header("Conversation");
    if session.history().is_empty() {
        Output::info("Nothing yet.");
        return;
    }
    session.replay(&mut TerminalRenderer::new());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_input() {
        assert_eq!(classify("  "), ChatCommand::Empty);
        assert_eq!(classify("exit\n"), ChatCommand::Exit);
        assert_eq!(classify("QUIT"), ChatCommand::Exit);
        assert_eq!(classify("/tools"), ChatCommand::Tools);
        assert_eq!(classify("/history"), ChatCommand::History);
        assert_eq!(classify("what is /tools?"), ChatCommand::Message);
    }

    #[test]
    fn test_usage_fields_include_response_preview() {
        let call = ToolUsage {
            id: "call_1".to_string(),
            tool: "search_web".to_string(),
            arguments: serde_json::json!({"web_query": "tokio"}),
            response: serde_json::json!("Tokio\nAn asynchronous runtime for Rust"),
        };

        let fields = usage_fields(&call, 20);
        assert_eq!(fields[0], ("arguments", r#"{"web_query":"tokio"}"#.to_string()));
        assert_eq!(fields[1], ("response", "Tokio An asynchronou...".to_string()));
    }
}
