//! Delve - research chat with web, YouTube and Reddit lookups
//!
//! A terminal research assistant. You ask a question, a language model decides
//! whether to search the web, read a YouTube transcript or search Reddit, and
//! the answer streams back with the tool results it relied on.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings, credentials and assistant variants
//! - `conversation` - Turns, parts and the append-only session history
//! - `lookup` - Tool adapters for Brave Search, YouTube and Reddit
//! - `agent` - Streamed tool calling loop over a [`agent::ChatModel`]
//! - `openai` - OpenAI implementation of the chat model
//! - `session` - One conversation and its submission state machine
//! - `presentation` - Part rendering and the tool usage log
//!
//! # Example
//!
//! ```rust,no_run
//! use delve::agent::Agent;
//! use delve::config::{Credentials, Settings};
//! use delve::openai::OpenAIModel;
//! use delve::presentation::SilentRenderer;
//! use delve::session::ChatSession;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = Credentials::from_env();
//!
//!     let model = OpenAIModel::from_settings(&settings.model, &credentials)?;
//!     let agent = Arc::new(Agent::from_settings(Arc::new(model), &settings));
//!     let mut session = ChatSession::new(agent, settings.endpoints.clone(), credentials);
//!
//!     let answer = session.submit("What's new in Rust 1.85?", &mut SilentRenderer).await?;
//!     println!("{}", answer.text());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod lookup;
pub mod openai;
pub mod presentation;
pub mod session;

pub use error::{DelveError, Result};
