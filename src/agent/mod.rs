//! Research agent with streamed tool calling.
//!
//! The agent sends the conversation to a [`ChatModel`], executes the lookup
//! tools the model asks for and feeds the results back until the model answers
//! in plain text. Invalid tool calls are returned to the model as retry prompts
//! a bounded number of times before the run fails.

mod model;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use model::{ChatModel, ModelEvent, ModelRequest};
pub use runner::{Agent, RunEvent};
