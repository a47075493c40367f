//! Tab visibility and window focus

use integrity_events::EventKind;
use tracing::debug;

/// Edge-triggered visibility/focus watcher
///
/// Transitions are tracked whether or not the monitor is armed, so a
/// repeated notification of the state we are already in never reports.
#[derive(Debug)]
pub struct EnvironmentMonitor {
    armed: bool,
    report_focus: bool,
    hidden: bool,
    focused: bool,
}

impl EnvironmentMonitor {
    pub fn new(report_focus: bool) -> Self {
        Self {
            armed: false,
            report_focus,
            hidden: false,
            focused: true,
        }
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Tab visibility changed. Hiding the tab while armed is a TAB_SWITCH.
    pub fn on_visibility_change(&mut self, hidden: bool) -> Option<EventKind> {
        if self.hidden == hidden {
            return None;
        }
        self.hidden = hidden;
        debug!("Tab {}", if hidden { "hidden" } else { "visible" });
        (self.armed && hidden).then_some(EventKind::TabSwitch)
    }

    pub fn on_window_blur(&mut self) -> Option<EventKind> {
        if !self.focused {
            return None;
        }
        self.focused = false;
        self.armed.then_some(EventKind::WindowBlur)
    }

    pub fn on_window_focus(&mut self) -> Option<EventKind> {
        if self.focused {
            return None;
        }
        self.focused = true;
        (self.armed && self.report_focus).then_some(EventKind::WindowFocus)
    }
}
