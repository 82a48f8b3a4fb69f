//! Append-only session history.

use super::{Part, Role, Turn};
use serde::Serialize;
use std::collections::HashSet;

/// Ordered record of the turns in one session.
///
/// Turns can only be appended. A fresh history comes from a fresh session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end of the history.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns with the given role.
    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }

    /// All turns before the newest one.
    ///
    /// When the newest turn is the pending user prompt, this is the context
    /// handed to the agent alongside it.
    pub fn prior_context(&self) -> &[Turn] {
        match self.turns.len() {
            0 => &[],
            n => &self.turns[..n - 1],
        }
    }

    /// Every tool call identifier recorded so far.
    pub fn call_ids(&self) -> HashSet<String> {
        collect_call_ids(&self.turns)
    }
}

/// Gather the tool call identifiers used across a slice of turns.
pub(crate) fn collect_call_ids(turns: &[Turn]) -> HashSet<String> {
    turns
        .iter()
        .flat_map(|t| t.parts.iter())
        .filter_map(|p| match p {
            Part::ToolCall(call) => Some(call.tool_call_id.clone()),
            _ => None,
        })
        .collect()
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
