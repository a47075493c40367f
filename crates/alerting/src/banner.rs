//! Transient local alerts

use integrity_events::{EventKind, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// How long an alert stays on screen (milliseconds)
    pub display_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { display_ms: 3000 }
    }
}

/// A rendered alert
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: EventKind,
    pub severity: Severity,
    pub message: &'static str,
    pub display_for: Duration,
}

/// Where alerts are drawn
pub trait AlertSurface: Send + Sync {
    fn show_alert(&self, alert: &Alert);
}

/// Decides what reaches the surface: an alert of a kind already on screen
/// is not drawn again until it has expired
pub struct AlertBanner {
    config: AlertConfig,
    visible_since: HashMap<EventKind, Instant>,
}

impl AlertBanner {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            visible_since: HashMap::new(),
        }
    }

    fn display_for(&self) -> Duration {
        Duration::from_millis(self.config.display_ms)
    }

    /// The alert to draw for `kind`, or `None` while one is still visible
    pub fn next_alert(&mut self, kind: EventKind) -> Option<Alert> {
        let display_for = self.display_for();
        if let Some(since) = self.visible_since.get(&kind) {
            if since.elapsed() < display_for {
                debug!("Alert {} already on screen", kind);
                return None;
            }
        }

        self.visible_since.insert(kind, Instant::now());
        Some(Alert {
            kind,
            severity: kind.severity(),
            message: kind.alert_message(),
            display_for,
        })
    }
}

impl Default for AlertBanner {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_alert_is_not_redrawn() {
        let mut banner = AlertBanner::default();

        let alert = banner.next_alert(EventKind::TabSwitch).unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.display_for, Duration::from_millis(3000));

        assert!(banner.next_alert(EventKind::TabSwitch).is_none());
        // Other kinds are independent
        assert!(banner.next_alert(EventKind::WindowBlur).is_some());
    }

    #[test]
    fn test_expired_alert_is_redrawn() {
        let mut banner = AlertBanner::new(AlertConfig { display_ms: 0 });
        assert!(banner.next_alert(EventKind::FaceMissing).is_some());
        assert!(banner.next_alert(EventKind::FaceMissing).is_some());
    }
}
