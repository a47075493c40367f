//! Log-only page surfaces for headless runs

use alerting::{Alert, AlertSurface};
use async_trait::async_trait;
use integrity_events::Severity;
use session_control::{BrowserShell, SessionError};
use tracing::{debug, info, warn};

/// Renders alerts as log lines
pub struct LogSurface;

impl AlertSurface for LogSurface {
    fn show_alert(&self, alert: &Alert) {
        match alert.severity {
            Severity::High => warn!("[ALERT {}] {}", alert.kind, alert.message),
            _ => info!("[alert {}] {}", alert.kind, alert.message),
        }
    }
}

/// Shell that logs what a page would show
pub struct LogShell {
    confirm_exit: bool,
}

impl LogShell {
    pub fn new(confirm_exit: bool) -> Self {
        Self { confirm_exit }
    }
}

#[async_trait]
impl BrowserShell for LogShell {
    fn set_status(&self, message: &str) {
        debug!("[status] {}", message);
    }

    fn set_confirm_enabled(&self, enabled: bool) {
        debug!("[confirm] {}", if enabled { "enabled" } else { "disabled" });
    }

    async fn request_fullscreen(&self) -> Result<(), SessionError> {
        info!("[page] fullscreen requested");
        Ok(())
    }

    async fn confirm_exit(&self) -> bool {
        info!("[page] exit confirmation -> {}", self.confirm_exit);
        self.confirm_exit
    }

    fn navigate_away(&self) {
        info!("[page] navigating away");
    }
}
