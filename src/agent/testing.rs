//! Scripted chat model for driving the agent in tests.

use super::model::{ChatModel, ModelEvent, ModelRequest};
use crate::error::{DelveError, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned responses, one per round, and records every request.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Vec<Result<ModelEvent>>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Vec<ModelEvent>>) -> Arc<Self> {
        Self::with_results(
            responses
                .into_iter()
                .map(|round| round.into_iter().map(Ok).collect())
                .collect(),
        )
    }

    /// Responses that may fail part way through the stream.
    pub fn with_results(responses: Vec<Vec<Result<ModelEvent>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream(&self, request: ModelRequest) -> Result<BoxStream<'static, Result<ModelEvent>>> {
        self.requests.lock().unwrap().push(request);
        let events = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DelveError::Agent("script exhausted".to_string()))?;
        Ok(stream::iter(events).boxed())
    }
}

pub fn text(delta: &str) -> ModelEvent {
    ModelEvent::TextDelta(delta.to_string())
}

pub fn call(index: u32, id: &str, name: &str, arguments: &str) -> ModelEvent {
    ModelEvent::ToolCallDelta {
        index,
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        arguments: Some(arguments.to_string()),
    }
}
