//! HTTP API server for chat sessions.
//!
//! Each session keeps its own history behind a mutex, so messages to one
//! session are handled in order while different sessions run concurrently.

use super::build_agent;
use crate::agent::Agent;
use crate::cli::Output;
use crate::config::{Credentials, EndpointSettings, Settings};
use crate::conversation::Turn;
use crate::error::DelveError;
use crate::presentation::SilentRenderer;
use crate::session::ChatSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
pub struct AppState {
    agent: Arc<Agent>,
    endpoints: EndpointSettings,
    credentials: Credentials,
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, endpoints: EndpointSettings, credentials: Credentials) -> Self {
        Self {
            agent,
            endpoints,
            credentials,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(id).cloned()
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/messages", post(post_message))
        .route("/sessions/{id}/history", get(get_history))
        .route("/sessions/{id}/tools", get(get_tools))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
    credentials: Credentials,
) -> anyhow::Result<()> {
    let agent = Arc::new(build_agent(&settings, &credentials)?);
    let state = Arc::new(AppState::new(
        agent,
        settings.endpoints.clone(),
        credentials,
    ));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Delve API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Variant", &settings.agent.variant.to_string());
    Output::kv("Model", &settings.model_name());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("New session", "POST /sessions");
    Output::kv("End session", "DELETE /sessions/{id}");
    Output::kv("Send message", "POST /sessions/{id}/messages");
    Output::kv("History", "GET  /sessions/{id}/history");
    Output::kv("Tool usage", "GET  /sessions/{id}/tools");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize, Deserialize)]
struct SessionInfo {
    id: String,
    model: String,
    tools: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Serialize)]
struct MessageResponse {
    answer: String,
    turn: Turn,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn session_not_found(id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        DelveError::SessionNotFound(id.to_string()).to_string(),
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = ChatSession::new(
        state.agent.clone(),
        state.endpoints.clone(),
        state.credentials.clone(),
    );

    let info = SessionInfo {
        id: session.id().to_string(),
        model: state.agent.model_name().to_string(),
        tools: state.agent.tools().iter().map(|t| t.name().to_string()).collect(),
        created_at: session.created_at(),
    };
    info!(session = %info.id, "Session created");

    state
        .sessions
        .write()
        .await
        .insert(info.id.clone(), Arc::new(Mutex::new(session)));

    (StatusCode::CREATED, Json(info))
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!(session = %id, "Session deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(&id),
    }
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let Some(session) = state.session(&id).await else {
        return session_not_found(&id);
    };

    let message = req.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message must not be empty");
    }

    let mut session = session.lock().await;
    match session.submit(message, &mut SilentRenderer).await {
        Ok(turn) => Json(MessageResponse {
            answer: turn.text(),
            turn,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

async fn get_history(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.session(&id).await {
        Some(session) => Json(session.lock().await.history().clone()).into_response(),
        None => session_not_found(&id),
    }
}

async fn get_tools(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.session(&id).await {
        Some(session) => Json(session.lock().await.tool_log().clone()).into_response(),
        None => session_not_found(&id),
    }
}
