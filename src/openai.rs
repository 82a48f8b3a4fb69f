//! OpenAI chat model backed by `async-openai`.

use crate::agent::{ChatModel, ModelEvent, ModelRequest};
use crate::config::{Credentials, ModelSettings};
use crate::conversation::{Part, Role, Turn};
use crate::error::{DelveError, Result};
use crate::lookup::ToolDefinition;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, CreateChatCompletionStreamResponse,
    FunctionCall, FunctionObject,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

/// Create an OpenAI client with the configured endpoint and optional timeout.
pub fn create_client(
    settings: &ModelSettings,
    credentials: &Credentials,
) -> Result<Client<OpenAIConfig>> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let http_client = builder.build()?;

    let mut config = OpenAIConfig::new();
    if let Some(key) = &credentials.openai_api_key {
        config = config.with_api_key(key);
    }
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Streams chat completions from the OpenAI API.
pub struct OpenAIModel {
    client: Client<OpenAIConfig>,
}

impl OpenAIModel {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &ModelSettings, credentials: &Credentials) -> Result<Self> {
        Ok(Self::new(create_client(settings, credentials)?))
    }
}

#[async_trait]
impl ChatModel for OpenAIModel {
    async fn stream(&self, request: ModelRequest) -> Result<BoxStream<'static, Result<ModelEvent>>> {
        let messages = to_request_messages(&request.messages)?;
        debug!(model = %request.model, messages = messages.len(), "Starting chat stream");

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model).messages(messages);
        if !request.tools.is_empty() {
            args.tools(to_tools(&request.tools));
        }
        let request = args.build().map_err(|e| DelveError::OpenAI(e.to_string()))?;

        let chunks = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| DelveError::OpenAI(format!("Chat API error: {}", e)))?;

        let events = chunks.flat_map(|chunk| {
            let events = match chunk {
                Ok(chunk) => chunk_events(chunk).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(DelveError::OpenAI(format!("Chat stream error: {}", e)))],
            };
            stream::iter(events)
        });

        Ok(events.boxed())
    }
}

/// Split one streamed chunk into model events.
fn chunk_events(chunk: CreateChatCompletionStreamResponse) -> Vec<ModelEvent> {
    let mut events = Vec::new();

    for choice in chunk.choices {
        if let Some(content) = choice.delta.content {
            events.push(ModelEvent::TextDelta(content));
        }
        for call in choice.delta.tool_calls.unwrap_or_default() {
            let (name, arguments) = call
                .function
                .map(|f| (f.name, f.arguments))
                .unwrap_or((None, None));
            events.push(ModelEvent::ToolCallDelta {
                index: call.index,
                id: call.id,
                name,
                arguments,
            });
        }
    }

    events
}

fn to_tools(definitions: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
    definitions
        .iter()
        .map(|d| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: d.name.clone(),
                description: Some(d.description.clone()),
                parameters: Some(d.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Convert conversation turns into chat messages.
///
/// Consecutive tool calls in an assistant turn become one assistant message,
/// followed by one tool message per return or retry prompt.
pub fn to_request_messages(turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages = Vec::new();

    for turn in turns {
        match turn.role {
            Role::System => {
                messages.push(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(turn.text())
                        .build()
                        .map_err(|e| DelveError::OpenAI(e.to_string()))?
                        .into(),
                );
            }
            Role::User => {
                messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.text())
                        .build()
                        .map_err(|e| DelveError::OpenAI(e.to_string()))?
                        .into(),
                );
            }
            Role::Assistant => push_assistant_parts(&turn.parts, &mut messages)?,
        }
    }

    Ok(messages)
}

fn push_assistant_parts(
    parts: &[Part],
    messages: &mut Vec<ChatCompletionRequestMessage>,
) -> Result<()> {
    let mut calls: Vec<ChatCompletionMessageToolCall> = Vec::new();

    for part in parts {
        if !matches!(part, Part::ToolCall(_)) {
            flush_calls(&mut calls, messages)?;
        }

        match part {
            Part::ToolCall(call) => calls.push(ChatCompletionMessageToolCall {
                id: call.tool_call_id.clone(),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: call.tool_name.clone(),
                    arguments: match &call.args {
                        serde_json::Value::String(raw) => raw.clone(),
                        args => args.to_string(),
                    },
                },
            }),
            Part::ToolReturn(ret) => {
                messages.push(tool_message(&ret.tool_call_id, ret.content.to_model_string())?)
            }
            Part::RetryPrompt(retry) => {
                messages.push(tool_message(&retry.tool_call_id, retry.model_response())?)
            }
            Part::Text { content } if !content.is_empty() => messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map_err(|e| DelveError::OpenAI(e.to_string()))?
                    .into(),
            ),
            _ => {}
        }
    }

    flush_calls(&mut calls, messages)
}

fn flush_calls(
    calls: &mut Vec<ChatCompletionMessageToolCall>,
    messages: &mut Vec<ChatCompletionRequestMessage>,
) -> Result<()> {
    if calls.is_empty() {
        return Ok(());
    }

    let message = ChatCompletionRequestAssistantMessageArgs::default()
        .tool_calls(std::mem::take(calls))
        .build()
        .map_err(|e| DelveError::OpenAI(e.to_string()))?;
    messages.push(message.into());
    Ok(())
}

fn tool_message(tool_call_id: &str, content: String) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestToolMessageArgs::default()
        .tool_call_id(tool_call_id)
        .content(content)
        .build()
        .map_err(|e| DelveError::OpenAI(e.to_string()))?
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{RetryPromptPart, ToolCallPart, ToolReturnPart};
    use serde_json::json;

    fn kinds(messages: &[ChatCompletionRequestMessage]) -> Vec<&'static str> {
        messages
            .iter()
            .map(|m| match m {
                ChatCompletionRequestMessage::System(_) => "system",
                ChatCompletionRequestMessage::User(_) => "user",
                ChatCompletionRequestMessage::Assistant(a) if a.tool_calls.is_some() => "calls",
                ChatCompletionRequestMessage::Assistant(_) => "assistant",
                ChatCompletionRequestMessage::Tool(_) => "tool",
                _ => "other",
            })
            .collect()
    }

    fn tool_call(id: &str) -> Part {
        Part::ToolCall(ToolCallPart {
            tool_call_id: id.to_string(),
            tool_name: "search_web".to_string(),
            args: json!({"web_query": id}),
        })
    }

    fn tool_return(id: &str) -> Part {
        Part::ToolReturn(ToolReturnPart {
            tool_call_id: id.to_string(),
            tool_name: "search_web".to_string(),
            content: "result".into(),
        })
    }

    #[test]
    fn test_groups_parallel_tool_calls() {
        let turns = vec![
            Turn::system("prompt"),
            Turn::user("question"),
            Turn::assistant(vec![
                tool_call("a"),
                tool_call("b"),
                tool_return("a"),
                tool_return("b"),
                Part::Text {
                    content: "answer".to_string(),
                },
            ]),
        ];

        let messages = to_request_messages(&turns).unwrap();
        assert_eq!(
            kinds(&messages),
            vec!["system", "user", "calls", "tool", "tool", "assistant"]
        );

        if let ChatCompletionRequestMessage::Assistant(a) = &messages[2] {
            let calls = a.tool_calls.as_ref().unwrap();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[0].function.arguments, r#"{"web_query":"a"}"#);
        }
    }

    #[test]
    fn test_retry_prompt_becomes_tool_message() {
        let turns = vec![Turn::assistant(vec![
            tool_call("a"),
            Part::RetryPrompt(RetryPromptPart {
                tool_call_id: "a".to_string(),
                tool_name: "search_web".to_string(),
                content: "missing field".to_string(),
            }),
            tool_call("b"),
            tool_return("b"),
        ])];

        let messages = to_request_messages(&turns).unwrap();
        assert_eq!(kinds(&messages), vec!["calls", "tool", "calls", "tool"]);

        if let ChatCompletionRequestMessage::Tool(t) = &messages[1] {
            assert_eq!(t.tool_call_id, "a");
        }
    }

    #[test]
    fn test_to_tools() {
        let tools = to_tools(&crate::lookup::tool_definitions(&[
            crate::lookup::ToolKind::SearchWeb,
        ]));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "search_web");
        assert!(tools[0].function.parameters.is_some());
    }
}
