//! Per-session log of tool usage.

use crate::conversation::Part;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One tool invocation and its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUsage {
    pub id: String,
    pub tool: String,
    pub arguments: Value,
    pub response: Value,
}

/// Tool invocations made while answering one submission.
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub calls: Vec<ToolUsage>,
}

/// Append-only record of the tools a session has used.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct ToolUsageLog {
    interactions: Vec<Interaction>,
}

impl ToolUsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the completed tool calls among `parts`.
    ///
    /// Calls without a matching return (rejected calls) are left out. Returns
    /// `false` and records nothing when no tool completed.
    pub fn record(&mut self, parts: &[Part]) -> bool {
        let mut args: HashMap<&str, &Value> = HashMap::new();
        let mut calls = Vec::new();

        for part in parts {
            match part {
                Part::ToolCall(call) => {
                    args.insert(call.tool_call_id.as_str(), &call.args);
                }
                Part::ToolReturn(ret) => calls.push(ToolUsage {
                    id: ret.tool_call_id.clone(),
                    tool: ret.tool_name.clone(),
                    arguments: args
                        .get(ret.tool_call_id.as_str())
                        .map(|v| (*v).clone())
                        .unwrap_or_else(|| Value::Object(Default::default())),
                    response: ret.content.to_json(),
                }),
                _ => {}
            }
        }

        if calls.is_empty() {
            return false;
        }

        self.interactions.push(Interaction {
            timestamp: Utc::now(),
            calls,
        });
        true
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Total number of tool calls across all interactions.
    pub fn total_calls(&self) -> usize {
        self.interactions.iter().map(|i| i.calls.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{RetryPromptPart, ToolCallPart, ToolReturnPart};
    use serde_json::json;

    fn parts() -> Vec<Part> {
        vec![
            Part::ToolCall(ToolCallPart {
                tool_call_id: "a".to_string(),
                tool_name: "search_web".to_string(),
                args: json!({"query": "x"}),
            }),
            Part::RetryPrompt(RetryPromptPart {
                tool_call_id: "a".to_string(),
                tool_name: "search_web".to_string(),
                content: "missing web_query".to_string(),
            }),
            Part::ToolCall(ToolCallPart {
                tool_call_id: "b".to_string(),
                tool_name: "search_web".to_string(),
                args: json!({"web_query": "x"}),
            }),
            Part::ToolReturn(ToolReturnPart {
                tool_call_id: "b".to_string(),
                tool_name: "search_web".to_string(),
                content: "Title: x".into(),
            }),
            Part::Text {
                content: "done".to_string(),
            },
        ]
    }

    #[test]
    fn test_record_keeps_completed_calls() {
        let mut log = ToolUsageLog::new();
        assert!(log.record(&parts()));

        assert_eq!(log.interactions().len(), 1);
        let calls = &log.interactions()[0].calls;
        assert_eq!(
            calls,
            &vec![ToolUsage {
                id: "b".to_string(),
                tool: "search_web".to_string(),
                arguments: json!({"web_query": "x"}),
                response: json!("Title: x"),
            }]
        );
    }

    #[test]
    fn test_record_without_tools_is_skipped() {
        let mut log = ToolUsageLog::new();
        let text_only = vec![Part::Text {
            content: "hi".to_string(),
        }];
        assert!(!log.record(&text_only));
        assert!(log.is_empty());

        log.record(&parts());
        log.record(&parts());
        assert_eq!(log.total_calls(), 2);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut log = ToolUsageLog::new();
        log.record(&parts());

        let value = serde_json::to_value(&log).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["calls"][0]["tool"], "search_web");
    }
}
