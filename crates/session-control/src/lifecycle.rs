//! Session lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in its lifecycle
///
/// Transitions only move forward: `Created -> Verifying -> Active`, then
/// one of the terminal states. Recording is tracked separately and only
/// while `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Created,
    Verifying,
    Active,
    Ended,
    Exited,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Verifying => "verifying",
            SessionState::Active => "active",
            SessionState::Ended => "ended",
            SessionState::Exited => "exited",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Exited)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
