//! Per-session event log

use integrity_events::{EventKind, IntegrityEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only record of every dispatched event. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<IntegrityEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<IntegrityEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, event: IntegrityEvent) {
        self.lock().push(event);
    }

    /// Snapshot of the log, oldest first
    pub fn events(&self) -> Vec<IntegrityEvent> {
        self.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.lock().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Count per kind
    pub fn summary(&self) -> HashMap<EventKind, usize> {
        let mut counts = HashMap::new();
        for event in self.lock().iter() {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_order() {
        let log = EventLog::new();
        let shared = log.clone();
        log.record(IntegrityEvent::new("s", EventKind::TabSwitch));
        shared.record(IntegrityEvent::new("s", EventKind::WindowBlur));
        log.record(IntegrityEvent::new("s", EventKind::TabSwitch));

        assert_eq!(log.len(), 3);
        assert_eq!(
            shared.kinds(),
            vec![EventKind::TabSwitch, EventKind::WindowBlur, EventKind::TabSwitch]
        );
        assert_eq!(log.count(EventKind::TabSwitch), 2);
        assert_eq!(log.summary()[&EventKind::WindowBlur], 1);
    }
}
