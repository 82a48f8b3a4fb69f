//! Terminal renderer for chat output.

use super::output::Output;
use crate::error::DelveError;
use crate::presentation::{PartView, Renderer};
use console::style;
use indicatif::ProgressBar;
use std::io::{self, Write};

/// Characters of tool output shown in a tool block unless verbose.
const TOOL_PREVIEW_CHARS: usize = 400;

/// Streams answers to stdout and shows a spinner until the first token.
pub struct TerminalRenderer {
    spinner: Option<ProgressBar>,
    streaming: bool,
    preview_chars: usize,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            spinner: None,
            streaming: false,
            preview_chars: TOOL_PREVIEW_CHARS,
        }
    }

    /// Show full tool output instead of a preview.
    pub fn with_full_output(mut self) -> Self {
        self.preview_chars = usize::MAX;
        self
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn begin(&mut self) {
        self.streaming = false;
        self.spinner = Some(Output::spinner("Thinking..."));
    }

    fn text_delta(&mut self, delta: &str, _buffer: &str) {
        if !self.streaming {
            self.clear_spinner();
            print!("\n{} ", style("Delve:").cyan().bold());
            self.streaming = true;
        }
        print!("{}", delta);
        io::stdout().flush().ok();
    }

    fn part(&mut self, view: &PartView) {
        self.clear_spinner();
        if self.streaming && *view != PartView::Hidden {
            println!("\n");
            self.streaming = false;
        }
        match view {
            PartView::System(content) => {
                println!("{} {}", style("System:").dim().bold(), style(content).dim())
            }
            PartView::User(content) => println!("\n{} {}", style("You:").green().bold(), content),
            PartView::Assistant(content) => {
                println!("\n{} {}\n", style("Delve:").cyan().bold(), content)
            }
            PartView::ToolUse {
                tool_name,
                arguments,
                output,
            } => Output::tool_block(tool_name, arguments, output, self.preview_chars),
            PartView::Hidden => {}
        }
    }

    fn finish(&mut self) {
        self.clear_spinner();
        if self.streaming {
            println!("\n");
            self.streaming = false;
        }
    }

    fn fail(&mut self, error: &DelveError) {
        self.clear_spinner();
        if self.streaming {
            println!();
            self.streaming = false;
        }
        Output::error(&format!("Error: {}", error));
    }
}
