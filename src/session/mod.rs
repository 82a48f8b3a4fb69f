//! Chat session: one conversation's history and its submission loop.

use crate::agent::{Agent, RunEvent};
use crate::config::{Credentials, EndpointSettings};
use crate::conversation::{History, Part, Turn};
use crate::error::Result;
use crate::lookup::Deps;
use crate::presentation::{display_order, Renderer, ToolCallIndex, ToolUsageLog};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const ROUND_SEPARATOR: &str = "\n\n";

/// Where a session is in handling a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Streaming,
    Rendering,
    Finalizing,
}

/// A single conversation with the agent.
///
/// History only grows. Start a new session to reset it.
pub struct ChatSession {
    id: String,
    created_at: DateTime<Utc>,
    agent: Arc<Agent>,
    endpoints: EndpointSettings,
    credentials: Credentials,
    history: History,
    tool_log: ToolUsageLog,
    call_index: ToolCallIndex,
    state: SessionState,
}

impl ChatSession {
    pub fn new(agent: Arc<Agent>, endpoints: EndpointSettings, credentials: Credentials) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            agent,
            endpoints,
            credentials,
            history: History::new(),
            tool_log: ToolUsageLog::new(),
            call_index: ToolCallIndex::new(),
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tool_log(&self) -> &ToolUsageLog {
        &self.tool_log
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle one user submission.
    ///
    /// The user turn is recorded first and stays in history even if the run
    /// fails. On success the assistant turn is appended and returned. On
    /// failure nothing else is recorded and the error is returned.
    #[instrument(skip(self, text, renderer), fields(session = %self.id))]
    pub async fn submit(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<Turn> {
        self.history.push(Turn::user(text));
        self.state = SessionState::Streaming;

        let result = self.run(text, renderer).await;
        self.state = SessionState::Idle;

        match result {
            Ok(turn) => {
                info!(turns = self.history.len(), "Submission complete");
                Ok(turn)
            }
            Err(e) => {
                warn!("Run failed: {}", e);
                renderer.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<Turn> {
        let deps = Deps::new(&self.endpoints, &self.credentials)?;
        let mut buffer = String::new();
        let mut parts: Vec<Part> = Vec::new();
        let mut new_round = false;

        renderer.begin();
        {
            let mut events = self
                .agent
                .run_stream(text, self.history.prior_context(), deps);

            while let Some(event) = events.next().await {
                match event? {
                    RunEvent::TextDelta(delta) => {
                        self.state = SessionState::Rendering;
                        // Text from an earlier tool-calling round stays its own paragraph
                        if new_round && !buffer.is_empty() {
                            buffer.push_str(ROUND_SEPARATOR);
                            renderer.text_delta(ROUND_SEPARATOR, &buffer);
                        }
                        new_round = false;
                        buffer.push_str(&delta);
                        renderer.text_delta(&delta, &buffer);
                    }
                    other => {
                        new_round = true;
                        parts.extend(other.into_part());
                    }
                }
            }
        }

        self.state = SessionState::Finalizing;
        parts.push(Part::Text { content: buffer });
        let turn = Turn::assistant(parts);

        self.tool_log.record(&turn.parts);
        for part in &turn.parts {
            let view = self.call_index.view(part);
            if view.is_tool_use() {
                renderer.part(&view);
            }
        }
        renderer.finish();

        self.history.push(turn.clone());
        Ok(turn)
    }

    /// Render the whole conversation so far, text before tool blocks per turn.
    pub fn replay(&self, renderer: &mut dyn Renderer) {
        let mut index = ToolCallIndex::new();
        for turn in &self.history {
            for part in display_order(turn) {
                renderer.part(&index.view(part));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{call, text, ScriptedModel};
    use crate::conversation::Role;
    use crate::error::DelveError;
    use crate::lookup::ToolKind;
    use crate::presentation::testing::RecordingRenderer;
    use crate::presentation::PartView;
    use pretty_assertions::assert_eq;

    fn session(model: Arc<ScriptedModel>) -> ChatSession {
        let agent = Agent::new(model, "test-model")
            .with_system_prompt("prompt")
            .with_tools(&[ToolKind::SearchWeb]);
        ChatSession::new(
            Arc::new(agent),
            EndpointSettings::default(),
            Credentials::default(),
        )
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_assistant_turns() {
        let model = ScriptedModel::new(vec![vec![text("Hi "), text("there")]]);
        let mut session = session(model);
        let mut renderer = RecordingRenderer::default();

        let turn = session.submit("hello", &mut renderer).await.unwrap();

        assert_eq!(turn.text(), "Hi there");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().turns()[0].role, Role::User);
        assert_eq!(session.history().turns()[1].role, Role::Assistant);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(renderer.deltas, vec!["Hi ", "there"]);
        assert_eq!(renderer.finished, 1);
        assert!(session.tool_log().is_empty());
    }

    #[tokio::test]
    async fn test_tool_run_is_logged_and_rendered_after_text() {
        let model = ScriptedModel::new(vec![
            vec![call(0, "call_1", "search_web", r#"{"web_query":"rust"}"#)],
            vec![text("Answer")],
        ]);
        let mut session = session(model);
        let mut renderer = RecordingRenderer::default();

        let turn = session.submit("q", &mut renderer).await.unwrap();

        assert_eq!(turn.parts.len(), 3);
        assert!(matches!(turn.parts[0], Part::ToolCall(_)));
        assert!(matches!(turn.parts[1], Part::ToolReturn(_)));
        assert!(matches!(turn.parts[2], Part::Text { .. }));

        assert_eq!(renderer.views.len(), 1);
        assert!(renderer.views[0].is_tool_use());
        assert_eq!(session.tool_log().total_calls(), 1);
        assert_eq!(session.tool_log().interactions()[0].calls[0].id, "call_1");
    }

    #[tokio::test]
    async fn test_text_from_separate_rounds_is_split() {
        let model = ScriptedModel::new(vec![
            vec![
                text("Let me search."),
                call(0, "call_1", "search_web", r#"{"web_query":"rust"}"#),
            ],
            vec![text("Answer")],
        ]);
        let mut session = session(model);
        let mut renderer = RecordingRenderer::default();

        let turn = session.submit("q", &mut renderer).await.unwrap();

        assert_eq!(turn.text(), "Let me search.\n\nAnswer");
        assert_eq!(renderer.deltas, vec!["Let me search.", "\n\n", "Answer"]);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_only_user_turn() {
        let model = ScriptedModel::with_results(vec![vec![
            Ok(text("partial")),
            Err(DelveError::OpenAI("stream dropped".to_string())),
        ]]);
        let mut session = session(model);
        let mut renderer = RecordingRenderer::default();

        let err = session.submit("q", &mut renderer).await.unwrap_err();

        assert!(matches!(err, DelveError::OpenAI(_)));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().turns()[0].role, Role::User);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(renderer.failures.len(), 1);
        assert_eq!(renderer.finished, 0);
    }

    #[tokio::test]
    async fn test_history_grows_with_submissions() {
        let model = ScriptedModel::with_results(vec![
            vec![Ok(text("one"))],
            vec![Err(DelveError::OpenAI("boom".to_string()))],
            vec![Ok(text("three"))],
        ]);
        let mut session = session(model.clone());
        let mut renderer = RecordingRenderer::default();

        for prompt in ["first", "second", "third"] {
            let _ = session.submit(prompt, &mut renderer).await;
        }

        let history = session.history();
        assert_eq!(history.count_role(Role::User), 3);
        assert_eq!(history.count_role(Role::Assistant), 2);

        // The third run sees both earlier user turns and the first answer.
        let requests = model.requests();
        let last = requests.last().unwrap();
        let texts: Vec<String> = last.messages.iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["prompt", "first", "one", "second", "third"]);
    }

    #[tokio::test]
    async fn test_replay_shows_text_before_tools() {
        let model = ScriptedModel::new(vec![
            vec![call(0, "call_1", "search_web", r#"{"web_query":"rust"}"#)],
            vec![text("Answer")],
        ]);
        let mut session = session(model);
        session
            .submit("q", &mut RecordingRenderer::default())
            .await
            .unwrap();

        let mut renderer = RecordingRenderer::default();
        session.replay(&mut renderer);

        let visible: Vec<&PartView> = renderer
            .views
            .iter()
            .filter(|v| **v != PartView::Hidden)
            .collect();
        assert_eq!(visible.len(), 3);
        assert_eq!(*visible[0], PartView::User("q".to_string()));
        assert_eq!(*visible[1], PartView::Assistant("Answer".to_string()));
        assert!(visible[2].is_tool_use());
    }
}
