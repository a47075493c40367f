//! Event dispatcher

use crate::{AlertBanner, AlertConfig, AlertSurface, EventLog};
use backend_client::BackendApi;
use integrity_events::{EventKind, IntegrityEvent};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct DispatcherInner {
    session_id: String,
    backend: Arc<dyn BackendApi>,
    surface: Arc<dyn AlertSurface>,
    banner: Mutex<AlertBanner>,
    log: EventLog,
}

/// Turns event kinds into wire events for one session
///
/// Delivery is fire-and-forget: [`EventDispatcher::emit`] returns as soon as
/// the post is spawned, failures are logged and never retried. Clones share
/// the same session, banner and log.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<DispatcherInner>,
}

impl EventDispatcher {
    pub fn new(
        session_id: impl Into<String>,
        backend: Arc<dyn BackendApi>,
        surface: Arc<dyn AlertSurface>,
        config: AlertConfig,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                session_id: session_id.into(),
                backend,
                surface,
                banner: Mutex::new(AlertBanner::new(config)),
                log: EventLog::new(),
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn log(&self) -> EventLog {
        self.inner.log.clone()
    }

    /// Dispatch `kind` at its fixed severity.
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// completes once the post has finished; callers normally drop it.
    pub fn emit(&self, kind: EventKind) -> JoinHandle<()> {
        let event = IntegrityEvent::new(self.inner.session_id.clone(), kind);
        debug!("Dispatching {} ({})", event.kind, event.severity);
        metrics::counter!(
            "proctor_events_total",
            "event_type" => kind.as_str(),
            "severity" => event.severity.as_str()
        )
        .increment(1);

        self.inner.log.record(event.clone());

        let alert = self
            .inner
            .banner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_alert(kind);
        if let Some(alert) = alert {
            self.inner.surface.show_alert(&alert);
        }

        let backend = self.inner.backend.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.post_event(&event).await {
                warn!("Failed to deliver {} event: {}", event.kind, e);
                metrics::counter!("proctor_event_delivery_failures_total").increment(1);
            }
        })
    }
}
