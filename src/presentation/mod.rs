//! Rendering helpers shared by the terminal and HTTP front ends.
//!
//! A [`Part`] is turned into a [`PartView`] describing what to show. Tool calls
//! show nothing on their own: their arguments are remembered in a
//! [`ToolCallIndex`] and shown next to the matching tool return.

mod sidebar;

pub use sidebar::{Interaction, ToolUsage, ToolUsageLog};

use crate::conversation::{Part, Turn};
use crate::error::DelveError;
use serde_json::Value;
use std::collections::HashMap;

/// What a single message part looks like to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum PartView {
    System(String),
    User(String),
    Assistant(String),
    /// A collapsed block with the tool's arguments and raw output.
    ToolUse {
        tool_name: String,
        arguments: Value,
        output: Value,
    },
    /// Nothing to display.
    Hidden,
}

impl PartView {
    pub fn is_tool_use(&self) -> bool {
        matches!(self, PartView::ToolUse { .. })
    }
}

/// Tool call arguments seen so far, keyed by call ID.
#[derive(Debug, Default)]
pub struct ToolCallIndex {
    args: HashMap<String, Value>,
}

impl ToolCallIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe how to display `part`, recording tool call arguments on the way.
    ///
    /// A tool return whose call was never seen shows empty arguments.
    pub fn view(&mut self, part: &Part) -> PartView {
        match part {
            Part::SystemPrompt { content } => PartView::System(content.clone()),
            Part::UserPrompt { content } => PartView::User(content.clone()),
            Part::Text { content } => PartView::Assistant(content.clone()),
            Part::ToolCall(call) => {
                self.args
                    .insert(call.tool_call_id.clone(), call.args.clone());
                PartView::Hidden
            }
            Part::ToolReturn(ret) => PartView::ToolUse {
                tool_name: ret.tool_name.clone(),
                arguments: self
                    .args
                    .get(&ret.tool_call_id)
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default())),
                output: ret.content.to_json(),
            },
            Part::RetryPrompt(_) => PartView::Hidden,
        }
    }

    pub fn arguments(&self, tool_call_id: &str) -> Option<&Value> {
        self.args.get(tool_call_id)
    }
}

/// Parts of a turn in display order: text first, tool blocks after it.
pub fn display_order(turn: &Turn) -> Vec<&Part> {
    let (text, rest): (Vec<&Part>, Vec<&Part>) = turn
        .parts
        .iter()
        .partition(|p| matches!(p, Part::Text { .. }));
    text.into_iter().chain(rest).collect()
}

/// Receives output while a session handles a submission.
///
/// All methods default to doing nothing.
pub trait Renderer: Send {
    /// A run is starting and no text has arrived yet.
    fn begin(&mut self) {}

    /// New answer text. `buffer` holds everything received so far.
    fn text_delta(&mut self, _delta: &str, _buffer: &str) {}

    /// Show one message part.
    fn part(&mut self, _view: &PartView) {}

    /// The submission completed.
    fn finish(&mut self) {}

    /// The run failed. No assistant turn was recorded.
    fn fail(&mut self, _error: &DelveError) {}
}

/// Renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRenderer;

impl Renderer for SilentRenderer {}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{RetryPromptPart, ToolCallPart, ToolOutput, ToolReturnPart};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(id: &str) -> Part {
        Part::ToolCall(ToolCallPart {
            tool_call_id: id.to_string(),
            tool_name: "search_reddit".to_string(),
            args: json!({"subreddit": "rust", "query": "async"}),
        })
    }

    fn ret(id: &str, content: ToolOutput) -> Part {
        Part::ToolReturn(ToolReturnPart {
            tool_call_id: id.to_string(),
            tool_name: "search_reddit".to_string(),
            content,
        })
    }

    #[test]
    fn test_text_parts() {
        let mut index = ToolCallIndex::new();
        assert_eq!(
            index.view(&Part::SystemPrompt {
                content: "be brief".to_string()
            }),
            PartView::System("be brief".to_string())
        );
        assert_eq!(
            index.view(&Part::UserPrompt {
                content: "hi".to_string()
            }),
            PartView::User("hi".to_string())
        );
        assert_eq!(
            index.view(&Part::Text {
                content: "hello".to_string()
            }),
            PartView::Assistant("hello".to_string())
        );
    }

    #[test]
    fn test_tool_return_shows_recorded_arguments() {
        let mut index = ToolCallIndex::new();

        assert_eq!(index.view(&call("c1")), PartView::Hidden);
        assert!(index.arguments("c1").is_some());

        let view = index.view(&ret("c1", ToolOutput::Structured(json!([{"title": "t"}]))));
        assert_eq!(
            view,
            PartView::ToolUse {
                tool_name: "search_reddit".to_string(),
                arguments: json!({"subreddit": "rust", "query": "async"}),
                output: json!([{"title": "t"}]),
            }
        );
    }

    #[test]
    fn test_unmatched_tool_return_has_empty_arguments() {
        let mut index = ToolCallIndex::new();
        match index.view(&ret("missing", "text output".into())) {
            PartView::ToolUse {
                arguments, output, ..
            } => {
                assert_eq!(arguments, json!({}));
                assert_eq!(output, json!("text output"));
            }
            other => panic!("Expected tool use, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_prompt_is_hidden() {
        let mut index = ToolCallIndex::new();
        let retry = Part::RetryPrompt(RetryPromptPart {
            tool_call_id: "c".to_string(),
            tool_name: "search_web".to_string(),
            content: "bad".to_string(),
        });
        assert_eq!(index.view(&retry), PartView::Hidden);
    }

    #[test]
    fn test_display_order_puts_text_first() {
        let turn = Turn::assistant(vec![
            call("c1"),
            ret("c1", "out".into()),
            Part::Text {
                content: "answer".to_string(),
            },
        ]);

        let ordered = display_order(&turn);
        assert!(matches!(ordered[0], Part::Text { .. }));
        assert!(matches!(ordered[1], Part::ToolCall(_)));
        assert!(matches!(ordered[2], Part::ToolReturn(_)));
    }
}
