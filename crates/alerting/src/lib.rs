//! Alerting System
//!
//! Dispatches integrity events: posts them to the backend without blocking
//! the caller, renders a transient local alert, and keeps the session's
//! event log.

mod banner;
mod dispatcher;
mod log;

pub use banner::{Alert, AlertBanner, AlertConfig, AlertSurface};
pub use dispatcher::EventDispatcher;
pub use log::EventLog;
