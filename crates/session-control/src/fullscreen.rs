//! Fullscreen enforcement ladder

use tracing::{debug, info, warn};

/// What the session must do about a fullscreen change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    /// Not an enforceable exit
    Ignore,
    /// Warn, force re-entry, re-arm after the grace delay
    Warn { exit: u32 },
    /// Limit exceeded; end the interview
    Terminate { exit: u32 },
}

/// Counts user exits from fullscreen and escalates past the limit
///
/// Enforcement is disarmed while a forced re-entry settles so the
/// re-entry's own transition is not counted. Once terminated it never
/// re-arms.
#[derive(Debug)]
pub struct FullscreenLadder {
    max_exits: u32,
    exits: u32,
    armed: bool,
    retired: bool,
}

impl FullscreenLadder {
    pub fn new(max_exits: u32) -> Self {
        Self {
            max_exits,
            exits: 0,
            armed: false,
            retired: false,
        }
    }

    /// Start enforcing. No effect once retired.
    pub fn arm(&mut self) {
        if !self.retired {
            self.armed = true;
        }
    }

    /// Pause enforcement
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// End of the grace delay; returns whether enforcement resumed
    pub fn rearm(&mut self) -> bool {
        self.arm();
        if self.armed {
            debug!("Fullscreen enforcement re-armed");
        }
        self.armed
    }

    /// Stop enforcing for good
    pub fn retire(&mut self) {
        self.armed = false;
        self.retired = true;
    }

    pub fn on_fullscreen_change(&mut self, fullscreen: bool) -> LadderStep {
        if fullscreen || !self.armed {
            return LadderStep::Ignore;
        }

        self.exits += 1;
        if self.exits <= self.max_exits {
            warn!("Fullscreen exit {}/{}", self.exits, self.max_exits);
            self.disarm();
            LadderStep::Warn { exit: self.exits }
        } else {
            info!("Fullscreen exit limit exceeded ({} exits)", self.exits);
            self.retire();
            LadderStep::Terminate { exit: self.exits }
        }
    }

    pub fn exit_count(&self) -> u32 {
        self.exits
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}
