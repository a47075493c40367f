//! Session configuration

use alerting::AlertConfig;
use integrity_monitor::MonitorConfig;
use media_capture::CameraConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment rules enforced while the interview is active
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    /// Request fullscreen at creation and enforce it while active
    pub require_fullscreen: bool,

    /// Exits answered with a warning; the next one ends the interview
    pub max_fullscreen_exits: u32,

    /// Enforcement stays off this long after a forced re-entry
    pub fullscreen_grace_ms: u64,

    /// Report WINDOW_FOCUS in addition to WINDOW_BLUR
    pub report_window_focus: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            require_fullscreen: true,
            max_fullscreen_exits: 3,
            fullscreen_grace_ms: 1000,
            report_window_focus: true,
        }
    }
}

impl SessionPolicy {
    pub fn fullscreen_grace(&self) -> Duration {
        Duration::from_millis(self.fullscreen_grace_ms)
    }
}

/// Everything one session is configured with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub monitor: MonitorConfig,
    pub policy: SessionPolicy,
    pub alerts: AlertConfig,
    pub camera: CameraConfig,
}
