//! Session Control
//!
//! Owns one interview session end to end:
//! - Lifecycle `Created -> Verifying -> Active -> Ended | Exited`
//! - Identity verification before the interview starts
//! - Tab visibility and window focus reporting
//! - Fullscreen enforcement with a warning ladder
//! - Screen recording while active
//!
//! All inputs for a session are applied by a single task through
//! [`SessionController::run`]; the page talks to it through a
//! [`SessionHandle`].

mod config;
mod controller;
mod environment;
mod error;
mod fullscreen;
mod lifecycle;
mod shell;

pub use config::{SessionConfig, SessionPolicy};
pub use controller::{SessionController, SessionHandle, SessionInput, SessionServices};
pub use environment::EnvironmentMonitor;
pub use error::SessionError;
pub use fullscreen::{FullscreenLadder, LadderStep};
pub use lifecycle::SessionState;
pub use shell::BrowserShell;
