//! Browser-side collaborators of a session

use async_trait::async_trait;

use crate::SessionError;

/// The page hosting the interview: status text, the confirmation control,
/// fullscreen and navigation
#[async_trait]
pub trait BrowserShell: Send + Sync {
    /// Candidate-facing status line
    fn set_status(&self, message: &str);

    /// Enable or disable the identity confirmation control
    fn set_confirm_enabled(&self, enabled: bool);

    async fn request_fullscreen(&self) -> Result<(), SessionError>;

    /// Ask the candidate to confirm leaving the interview
    async fn confirm_exit(&self) -> bool;

    fn navigate_away(&self);
}
