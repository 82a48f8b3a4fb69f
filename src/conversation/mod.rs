//! Conversation data model.
//!
//! A session history is an ordered list of [`Turn`]s. Each turn carries the
//! [`Part`]s it is made of: prompts, streamed text, tool calls and their results.

pub(crate) mod history;

pub use history::History;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One exchange unit in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn holding the system prompt.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(
            Role::System,
            vec![Part::SystemPrompt {
                content: content.into(),
            }],
        )
    }

    /// Create a turn holding a user prompt.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(
            Role::User,
            vec![Part::UserPrompt {
                content: content.into(),
            }],
        )
    }

    /// Create an assistant turn from the parts emitted during a run.
    pub fn assistant(parts: Vec<Part>) -> Self {
        Self::new(Role::Assistant, parts)
    }

    fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            parts,
            timestamp: Utc::now(),
        }
    }

    /// Concatenated text of all text-bearing parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::SystemPrompt { content }
                | Part::UserPrompt { content }
                | Part::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool calls made in this turn.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallPart> {
        self.parts.iter().filter_map(|part| match part {
            Part::ToolCall(call) => Some(call),
            _ => None,
        })
    }
}

/// One semantic unit within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "part_kind", rename_all = "kebab-case")]
pub enum Part {
    SystemPrompt { content: String },
    UserPrompt { content: String },
    Text { content: String },
    ToolCall(ToolCallPart),
    ToolReturn(ToolReturnPart),
    RetryPrompt(RetryPromptPart),
}

impl Part {
    /// Identifier linking tool calls to their results, if this part has one.
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Part::ToolCall(call) => Some(&call.tool_call_id),
            Part::ToolReturn(ret) => Some(&ret.tool_call_id),
            Part::RetryPrompt(retry) => Some(&retry.tool_call_id),
            Part::SystemPrompt { .. } | Part::UserPrompt { .. } | Part::Text { .. } => None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPart {
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: serde_json::Value,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReturnPart {
    pub tool_call_id: String,
    pub tool_name: String,
    pub content: ToolOutput,
}

/// Feedback sent to the model after it produced an invalid tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPromptPart {
    pub tool_call_id: String,
    pub tool_name: String,
    pub content: String,
}

impl RetryPromptPart {
    /// Message the model receives in place of a tool result.
    pub fn model_response(&self) -> String {
        format!("{}\n\nFix the errors and try again.", self.content)
    }
}

/// Tool result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Text(String),
    Structured(serde_json::Value),
}

impl ToolOutput {
    /// Render the payload as the string handed back to the model.
    pub fn to_model_string(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Structured(value) => value.to_string(),
        }
    }

    /// The payload as a JSON value, for display and logging.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ToolOutput::Text(text) => serde_json::Value::String(text.clone()),
            ToolOutput::Structured(value) => value.clone(),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        ToolOutput::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_serializes_with_kind_tag() {
        let part = Part::ToolCall(ToolCallPart {
            tool_call_id: "call_1".to_string(),
            tool_name: "search_web".to_string(),
            args: json!({"web_query": "rust"}),
        });

        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["part_kind"], "tool-call");
        assert_eq!(value["tool_name"], "search_web");

        let text = serde_json::to_value(Part::UserPrompt {
            content: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(text["part_kind"], "user-prompt");
    }

    #[test]
    fn test_turn_text_skips_tool_parts() {
        let turn = Turn::assistant(vec![
            Part::ToolCall(ToolCallPart {
                tool_call_id: "a".to_string(),
                tool_name: "search_web".to_string(),
                args: json!({}),
            }),
            Part::Text {
                content: "Answer".to_string(),
            },
        ]);
        assert_eq!(turn.text(), "Answer");
        assert_eq!(turn.tool_calls().count(), 1);
    }

    #[test]
    fn test_tool_output_model_string() {
        assert_eq!(ToolOutput::from("plain").to_model_string(), "plain");
        let structured = ToolOutput::Structured(json!([{"title": "t"}]));
        assert_eq!(structured.to_model_string(), r#"[{"title":"t"}]"#);
    }
}
