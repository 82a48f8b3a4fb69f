//! Agent runner with a streamed tool calling loop.

use super::model::{ChatModel, ModelEvent, ModelRequest};
use crate::config::Settings;
use crate::conversation::{
    history::collect_call_ids, Part, RetryPromptPart, ToolCallPart, ToolReturnPart, Turn,
};
use crate::error::{DelveError, Result};
use crate::lookup::{parse_tool_call, tool_definitions, Deps, ToolCall, ToolKind};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Something that happened during a run, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A fragment of the answer text.
    TextDelta(String),
    /// The model asked for a tool.
    ToolCall(ToolCallPart),
    /// A tool finished.
    ToolReturn(ToolReturnPart),
    /// A tool call was rejected and the model was asked to try again.
    RetryPrompt(RetryPromptPart),
}

impl RunEvent {
    /// The history part this event records, if any.
    pub fn into_part(self) -> Option<Part> {
        match self {
            RunEvent::TextDelta(_) => None,
            RunEvent::ToolCall(call) => Some(Part::ToolCall(call)),
            RunEvent::ToolReturn(ret) => Some(Part::ToolReturn(ret)),
            RunEvent::RetryPrompt(retry) => Some(Part::RetryPrompt(retry)),
        }
    }
}

/// Agent that answers a prompt, calling lookup tools as the model decides.
///
/// Build one at startup and share it between sessions.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    model_name: String,
    system_prompt: String,
    tools: Vec<ToolKind>,
    max_retries: usize,
    max_iterations: usize,
}

/// Tool call fragments accumulated while the model streams.
#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl Agent {
    /// Create an agent with no tools and an empty system prompt.
    pub fn new(model: Arc<dyn ChatModel>, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            system_prompt: String::new(),
            tools: Vec::new(),
            max_retries: 2,
            max_iterations: 10,
        }
    }

    /// Create an agent for the variant, model and limits in `settings`.
    pub fn from_settings(model: Arc<dyn ChatModel>, settings: &Settings) -> Self {
        let variant = settings.agent.variant;
        Self::new(model, &settings.model_name())
            .with_system_prompt(variant.system_prompt())
            .with_tools(variant.tools())
            .with_max_retries(settings.model.max_retries)
            .with_max_iterations(settings.model.max_iterations)
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Register the tools the model may call.
    pub fn with_tools(mut self, tools: &[ToolKind]) -> Self {
        self.tools = tools.to_vec();
        self
    }

    /// Set how many invalid tool calls are re-prompted before the run fails.
    pub fn with_max_retries(mut self, max: usize) -> Self {
        self.max_retries = max;
        self
    }

    /// Set maximum model rounds per run.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> &[ToolKind] {
        &self.tools
    }

    /// Run the agent on `user_text` with `history` as prior context.
    ///
    /// The returned stream is lazy and can be consumed once. It ends after the
    /// model answers without calling tools, or with the first error. `deps` is
    /// owned by the stream and dropped with it.
    pub fn run_stream<'a>(
        &'a self,
        user_text: &str,
        history: &'a [Turn],
        deps: Deps,
    ) -> BoxStream<'a, Result<RunEvent>> {
        let user_turn = Turn::user(user_text);

        let stream = async_stream::try_stream! {
            info!(model = %self.model_name, history = history.len(), "Starting agent run");

            let mut known_ids = collect_call_ids(history);
            let mut run_parts: Vec<Part> = Vec::new();
            let mut retries = 0;

            for round in 1..=self.max_iterations {
                debug!("Agent round {}", round);

                let request = self.build_request(history, &user_turn, &run_parts);
                let mut events = self.model.stream(request).await?;

                let mut text = String::new();
                let mut pending: BTreeMap<u32, PendingCall> = BTreeMap::new();

                while let Some(event) = events.next().await {
                    match event? {
                        ModelEvent::TextDelta(delta) => {
                            if delta.is_empty() {
                                continue;
                            }
                            text.push_str(&delta);
                            yield RunEvent::TextDelta(delta);
                        }
                        ModelEvent::ToolCallDelta { index, id, name, arguments } => {
                            let call = pending.entry(index).or_default();
                            if let Some(id) = id {
                                call.id = Some(id);
                            }
                            if let Some(name) = name {
                                call.name.push_str(&name);
                            }
                            if let Some(arguments) = arguments {
                                call.arguments.push_str(&arguments);
                            }
                        }
                    }
                }

                if !text.is_empty() {
                    run_parts.push(Part::Text { content: text });
                }

                if pending.is_empty() {
                    info!(rounds = round, "Agent run finished");
                    return;
                }

                let calls: Vec<(ToolCallPart, String)> = pending
                    .into_values()
                    .map(|call| {
                        let id = unique_call_id(call.id, &mut known_ids);
                        let args = serde_json::from_str(&call.arguments)
                            .unwrap_or_else(|_| serde_json::Value::String(call.arguments.clone()));
                        let part = ToolCallPart {
                            tool_call_id: id,
                            tool_name: call.name,
                            args,
                        };
                        (part, call.arguments)
                    })
                    .collect();

                for (call, _) in &calls {
                    run_parts.push(Part::ToolCall(call.clone()));
                    yield RunEvent::ToolCall(call.clone());
                }

                for (call, raw_arguments) in calls {
                    match self.validate(&call.tool_name, &raw_arguments) {
                        Ok(tool) => {
                            info!(tool = %call.tool_name, args = %raw_arguments, "Agent calling tool");
                            let content = deps.execute(&tool).await?;
                            let ret = ToolReturnPart {
                                tool_call_id: call.tool_call_id,
                                tool_name: call.tool_name,
                                content,
                            };
                            run_parts.push(Part::ToolReturn(ret.clone()));
                            yield RunEvent::ToolReturn(ret);
                        }
                        Err(e) => {
                            retries += 1;
                            warn!(tool = %call.tool_name, retries, "Invalid tool call: {}", e);
                            if retries > self.max_retries {
                                Err::<(), _>(DelveError::RetriesExceeded(self.max_retries))?;
                            }
                            let retry = RetryPromptPart {
                                tool_call_id: call.tool_call_id,
                                tool_name: call.tool_name,
                                content: e.to_string(),
                            };
                            run_parts.push(Part::RetryPrompt(retry.clone()));
                            yield RunEvent::RetryPrompt(retry);
                        }
                    }
                }
            }

            Err::<(), _>(DelveError::Agent(format!(
                "Agent exceeded maximum iterations ({})",
                self.max_iterations
            )))?;
        };

        Box::pin(stream)
    }

    /// Assemble the messages for the next model round.
    fn build_request(&self, history: &[Turn], user_turn: &Turn, run_parts: &[Part]) -> ModelRequest {
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(Turn::system(self.system_prompt.clone()));
        messages.extend(history.iter().cloned());
        messages.push(user_turn.clone());
        if !run_parts.is_empty() {
            messages.push(Turn::assistant(run_parts.to_vec()));
        }

        ModelRequest {
            model: self.model_name.clone(),
            messages,
            tools: tool_definitions(&self.tools),
        }
    }

    /// Check that a tool call names a registered tool and carries valid arguments.
    fn validate(&self, name: &str, arguments: &str) -> Result<ToolCall> {
        let registered = ToolKind::from_name(name).is_some_and(|kind| self.tools.contains(&kind));
        if !registered {
            let available: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
            return Err(DelveError::ToolValidation(format!(
                "Unknown tool name: '{}'. Available tools: {}",
                name,
                available.join(", ")
            )));
        }
        parse_tool_call(name, arguments)
    }
}

/// Keep the model's call ID unless it is empty or already used in the session.
fn unique_call_id(candidate: Option<String>, known: &mut HashSet<String>) -> String {
    let id = match candidate {
        Some(id) if !id.is_empty() && !known.contains(&id) => id,
        _ => loop {
            let id = format!("call_{}", Uuid::new_v4().simple());
            if !known.contains(&id) {
                break id;
            }
        },
    };
    known.insert(id.clone());
    id
}
