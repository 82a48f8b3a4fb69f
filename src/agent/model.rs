//! Language model abstraction used by the agent runner.

use crate::conversation::Turn;
use crate::error::Result;
use crate::lookup::ToolDefinition;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Everything the model needs for one round.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation so far, starting with the system turn.
    pub messages: Vec<Turn>,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
}

/// One streamed fragment of a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Incremental answer text.
    TextDelta(String),
    /// A fragment of a tool call. Fragments sharing an `index` belong together.
    ToolCallDelta {
        index: u32,
        id: Option<String>,
        name: Option<String>,
        arguments: Option<String>,
    },
}

/// A chat model that streams responses with tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start a streamed completion for the request.
    async fn stream(&self, request: ModelRequest) -> Result<BoxStream<'static, Result<ModelEvent>>>;
}
