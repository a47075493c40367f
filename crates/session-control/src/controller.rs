//! Session lifecycle controller

use crate::{
    BrowserShell, EnvironmentMonitor, FullscreenLadder, LadderStep, SessionConfig, SessionError,
    SessionState,
};
use alerting::{AlertSurface, EventDispatcher, EventLog};
use backend_client::BackendApi;
use integrity_events::EventKind;
use integrity_monitor::{
    BaselineIdentity, IdentityGate, IntegrityMonitor, MonitorError, VerificationState,
};
use media_capture::{CaptureDriver, CapturedFrame, MediaDevices};
use recording::{ScreenRecorder, UploadOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const INTERVIEW_STATUS: &str = "Interview in progress";

/// Page inputs, applied in order by the session task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum SessionInput {
    /// The candidate pressed the identity confirmation control
    ConfirmIdentity,
    StartRecording,
    StopRecording,
    VisibilityChanged { hidden: bool },
    WindowBlur,
    WindowFocus,
    FullscreenChanged { fullscreen: bool },
    EndInterview,
    /// Leave the interview; the shell asks for confirmation
    ExitInterview,
}

/// Cloneable sender side of a session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionInput>,
}

impl SessionHandle {
    pub fn send(&self, input: SessionInput) -> Result<(), SessionError> {
        self.tx.send(input).map_err(|_| SessionError::Closed)
    }

    pub fn confirm_identity(&self) -> Result<(), SessionError> {
        self.send(SessionInput::ConfirmIdentity)
    }

    pub fn start_recording(&self) -> Result<(), SessionError> {
        self.send(SessionInput::StartRecording)
    }

    pub fn stop_recording(&self) -> Result<(), SessionError> {
        self.send(SessionInput::StopRecording)
    }

    pub fn visibility_changed(&self, hidden: bool) -> Result<(), SessionError> {
        self.send(SessionInput::VisibilityChanged { hidden })
    }

    pub fn window_blur(&self) -> Result<(), SessionError> {
        self.send(SessionInput::WindowBlur)
    }

    pub fn window_focus(&self) -> Result<(), SessionError> {
        self.send(SessionInput::WindowFocus)
    }

    pub fn fullscreen_changed(&self, fullscreen: bool) -> Result<(), SessionError> {
        self.send(SessionInput::FullscreenChanged { fullscreen })
    }

    pub fn end_interview(&self) -> Result<(), SessionError> {
        self.send(SessionInput::EndInterview)
    }

    pub fn exit_interview(&self) -> Result<(), SessionError> {
        self.send(SessionInput::ExitInterview)
    }
}

/// External collaborators of a session
#[derive(Clone)]
pub struct SessionServices {
    pub devices: Arc<dyn MediaDevices>,
    pub backend: Arc<dyn BackendApi>,
    pub shell: Arc<dyn BrowserShell>,
    pub surface: Arc<dyn AlertSurface>,
}

/// Single owner of a session's state machines
///
/// Every detector counter, baseline and flag lives here and is mutated only
/// by the task driving [`SessionController::step`]. Capture devices are
/// released on every path out of `Active`, including drop.
pub struct SessionController {
    session_id: String,
    state: SessionState,
    config: SessionConfig,
    services: SessionServices,
    dispatcher: EventDispatcher,
    gate: IdentityGate,
    monitor: IntegrityMonitor,
    environment: EnvironmentMonitor,
    fullscreen: FullscreenLadder,
    recorder: ScreenRecorder,
    driver: Option<CaptureDriver>,
    /// A lost camera stream is reopened at most once per session
    camera_reopened: bool,
    /// Resolved from the gate but not yet installed (start not accepted)
    pending_baseline: Option<BaselineIdentity>,
    lifetime: CancellationToken,
    inputs: mpsc::UnboundedReceiver<SessionInput>,
    rearm_tx: mpsc::UnboundedSender<()>,
    rearm_rx: mpsc::UnboundedReceiver<()>,
    tasks: Vec<JoinHandle<()>>,
    uploads: Vec<JoinHandle<UploadOutcome>>,
}

impl SessionController {
    /// Create the session on the backend. Nothing else happens until this
    /// succeeds.
    pub async fn create(
        config: SessionConfig,
        services: SessionServices,
    ) -> Result<(Self, SessionHandle), SessionError> {
        let session = services.backend.create_session().await?;
        info!("Session {} created (backend status '{}')", session.session_id, session.status);

        let dispatcher = EventDispatcher::new(
            session.session_id.clone(),
            services.backend.clone(),
            services.surface.clone(),
            config.alerts.clone(),
        );
        let recorder = ScreenRecorder::new(
            services.devices.clone(),
            services.backend.clone(),
            dispatcher.clone(),
        );

        if config.policy.require_fullscreen {
            if let Err(e) = services.shell.request_fullscreen().await {
                warn!("Fullscreen request failed: {}", e);
            }
        }

        let (tx, inputs) = mpsc::unbounded_channel();
        let (rearm_tx, rearm_rx) = mpsc::unbounded_channel();

        let controller = Self {
            session_id: session.session_id,
            state: SessionState::Created,
            gate: IdentityGate::new(&config.monitor),
            monitor: IntegrityMonitor::new(config.monitor.clone()),
            environment: EnvironmentMonitor::new(config.policy.report_window_focus),
            fullscreen: FullscreenLadder::new(config.policy.max_fullscreen_exits),
            config,
            services,
            dispatcher,
            recorder,
            driver: None,
            camera_reopened: false,
            pending_baseline: None,
            lifetime: CancellationToken::new(),
            inputs,
            rearm_tx,
            rearm_rx,
            tasks: Vec::new(),
            uploads: Vec::new(),
        };
        Ok((controller, SessionHandle { tx }))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn verification_state(&self) -> VerificationState {
        self.gate.state()
    }

    pub fn event_log(&self) -> EventLog {
        self.dispatcher.log()
    }

    pub fn fullscreen_exits(&self) -> u32 {
        self.fullscreen.exit_count()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Open the verification camera and start looking for the candidate
    pub async fn begin_verification(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Created, "begin verification")?;

        let driver = self.open_driver("verification").await?;
        self.driver = Some(driver);
        self.transition(SessionState::Verifying);

        self.services.shell.set_confirm_enabled(false);
        self.services.shell.set_status(self.gate.status_message());
        Ok(())
    }

    /// Apply one frame from the active capture driver
    pub fn handle_frame(&mut self, captured: &CapturedFrame) {
        match self.state {
            SessionState::Verifying => {
                let before = self.gate.state();
                if before == VerificationState::Verified {
                    return;
                }
                let after = self.gate.observe(captured);
                self.services.shell.set_status(self.gate.status_message());
                if after == VerificationState::Verified {
                    self.services.shell.set_confirm_enabled(true);
                }
            }
            SessionState::Active => {
                let analysis = self.monitor.process(&captured.observation);
                if analysis.has_events() {
                    debug!(
                        "Frame {} raised {} event(s), worst {:?}",
                        captured.frame.sequence,
                        analysis.events.len(),
                        analysis.most_severe()
                    );
                }
                for kind in analysis.events {
                    self.dispatcher.emit(kind);
                }
            }
            state => trace!("Frame {} ignored while {}", captured.frame.sequence, state),
        }
    }

    /// Apply one page input
    pub async fn handle_input(&mut self, input: SessionInput) -> Result<(), SessionError> {
        debug!("Session {} input {:?}", self.session_id, input);
        match input {
            SessionInput::ConfirmIdentity => self.confirm_identity().await,
            SessionInput::StartRecording => {
                self.require(SessionState::Active, "start recording")?;
                self.recorder.start().await?;
                Ok(())
            }
            SessionInput::StopRecording => {
                if let Some(upload) = self.recorder.stop().await? {
                    self.uploads.push(upload);
                }
                Ok(())
            }
            SessionInput::VisibilityChanged { hidden } => {
                let event = self.environment.on_visibility_change(hidden);
                self.emit_if_active(event);
                Ok(())
            }
            SessionInput::WindowBlur => {
                let event = self.environment.on_window_blur();
                self.emit_if_active(event);
                Ok(())
            }
            SessionInput::WindowFocus => {
                let event = self.environment.on_window_focus();
                self.emit_if_active(event);
                Ok(())
            }
            SessionInput::FullscreenChanged { fullscreen } => {
                self.on_fullscreen_change(fullscreen).await;
                Ok(())
            }
            SessionInput::EndInterview => {
                self.require(SessionState::Active, "end the interview")?;
                self.teardown(SessionState::Ended).await;
                Ok(())
            }
            SessionInput::ExitInterview => {
                if self.state.is_terminal() {
                    return Err(SessionError::InvalidTransition {
                        state: self.state,
                        action: "exit the interview",
                    });
                }
                if self.services.shell.confirm_exit().await {
                    self.teardown(SessionState::Exited).await;
                } else {
                    info!("Exit cancelled by the candidate");
                }
                Ok(())
            }
        }
    }

    /// Wait for and apply the next input, frame, timer or recorder signal.
    ///
    /// Returns `false` once every [`SessionHandle`] is gone.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            input = self.inputs.recv() => {
                let Some(input) = input else {
                    return false;
                };
                if let Err(e) = self.handle_input(input).await {
                    warn!("Session {}: {}", self.session_id, e);
                }
            }
            Some(()) = self.rearm_rx.recv() => self.on_rearm(),
            captured = next_captured(self.driver.as_mut()) => match captured {
                Some(captured) => self.handle_frame(&captured),
                None => self.on_camera_ended().await,
            },
            signal = self.recorder.next_signal() => {
                if let Some(upload) = self.recorder.handle_signal(signal).await {
                    self.uploads.push(upload);
                }
            }
        }
        true
    }

    /// Drive the session until it ends.
    ///
    /// Starts verification if it has not been started. If every handle is
    /// dropped before the session ends, the candidate is treated as having
    /// left without confirmation.
    pub async fn run(&mut self) -> Result<SessionState, SessionError> {
        if self.state == SessionState::Created {
            if let Err(e) = self.begin_verification().await {
                // a camera failure has already torn the session down
                if !self.state.is_terminal() {
                    return Err(e);
                }
            }
        }

        while !self.state.is_terminal() {
            if !self.step().await {
                info!("Session {} inputs closed while {}", self.session_id, self.state);
                self.teardown(SessionState::Exited).await;
            }
        }

        self.settle().await;
        Ok(self.state)
    }

    /// Wait for background uploads and the end-of-session notification
    pub async fn settle(&mut self) {
        for upload in self.uploads.drain(..) {
            if let Err(e) = upload.await {
                warn!("Recording upload task failed: {}", e);
            }
        }
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Session task failed: {}", e);
            }
        }
    }

    async fn confirm_identity(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Verifying, "confirm identity")?;

        if self.pending_baseline.is_none() {
            let baseline = self.gate.resolve()?;
            // verification capture ends before monitoring capture starts
            self.driver = None;
            self.upload_snapshot(&baseline);
            self.pending_baseline = Some(baseline);
        }

        let driver = self.open_driver("monitor").await?;

        match self.services.backend.start_session(&self.session_id).await {
            Ok(status) => debug!(
                "Session {} started (backend status '{}')",
                self.session_id, status.status
            ),
            Err(e) => {
                warn!("Session start rejected, confirmation can be retried: {}", e);
                return Err(e.into());
            }
        }

        let baseline = self.pending_baseline.take().ok_or(MonitorError::NotVerified)?;
        self.monitor.install_baseline(baseline)?;
        self.monitor.set_active(true);
        self.environment.arm();
        if self.config.policy.require_fullscreen {
            self.fullscreen.arm();
        }
        self.driver = Some(driver);
        self.transition(SessionState::Active);

        self.services.shell.set_confirm_enabled(false);
        self.services.shell.set_status(INTERVIEW_STATUS);
        Ok(())
    }

    /// Open a capture driver. A camera that cannot be opened is reported
    /// and ends the session.
    async fn open_driver(&mut self, name: &'static str) -> Result<CaptureDriver, SessionError> {
        let devices = self.services.devices.clone();
        let opened = CaptureDriver::open(name, devices.as_ref(), &self.config.camera).await;
        if let Err(e) = &opened {
            warn!("Session {}: {} camera unavailable: {}", self.session_id, name, e);
            self.camera_failed().await;
        }
        opened.map_err(SessionError::from)
    }

    async fn camera_failed(&mut self) {
        self.dispatcher.emit(EventKind::CameraFailed);
        self.teardown(SessionState::Exited).await;
    }

    async fn on_camera_ended(&mut self) {
        self.driver = None;
        let name = match self.state {
            SessionState::Verifying => "verification",
            SessionState::Active => "monitor",
            state => {
                debug!("Camera stream ended while {}", state);
                return;
            }
        };

        warn!("Session {}: {} camera stream ended", self.session_id, name);
        if self.camera_reopened {
            self.camera_failed().await;
            return;
        }

        self.camera_reopened = true;
        if let Ok(driver) = self.open_driver(name).await {
            info!("Session {}: {} camera reopened", self.session_id, name);
            self.dispatcher.emit(EventKind::CameraFailed);
            self.driver = Some(driver);
        }
    }

    fn upload_snapshot(&mut self, baseline: &BaselineIdentity) {
        let backend = self.services.backend.clone();
        let session_id = self.session_id.clone();
        let snapshot = baseline.snapshot_base64.clone();
        self.tasks.push(tokio::spawn(async move {
            match backend.upload_auth_snapshot(&session_id, &snapshot).await {
                Ok(()) => debug!("Identity snapshot uploaded"),
                Err(e) => warn!("Identity snapshot upload failed: {}", e),
            }
        }));
    }

    fn emit_if_active(&self, event: Option<EventKind>) {
        if let Some(kind) = event {
            if self.state == SessionState::Active {
                self.dispatcher.emit(kind);
            }
        }
    }

    async fn on_fullscreen_change(&mut self, fullscreen: bool) {
        if self.state != SessionState::Active {
            return;
        }

        match self.fullscreen.on_fullscreen_change(fullscreen) {
            LadderStep::Ignore => {}
            LadderStep::Warn { exit } => {
                debug!("Fullscreen exit {} answered with a warning", exit);
                self.dispatcher.emit(EventKind::FullscreenExitWarning);
                if let Err(e) = self.services.shell.request_fullscreen().await {
                    warn!("Forced fullscreen re-entry failed: {}", e);
                }
                self.schedule_rearm();
            }
            LadderStep::Terminate { exit } => {
                warn!("Ending session {} after fullscreen exit {}", self.session_id, exit);
                self.dispatcher.emit(EventKind::FullscreenExitLimitExceeded);
                self.teardown(SessionState::Ended).await;
            }
        }
    }

    fn schedule_rearm(&self) {
        let token = self.lifetime.child_token();
        let tx = self.rearm_tx.clone();
        let grace = self.config.policy.fullscreen_grace();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => trace!("Fullscreen re-arm cancelled"),
                _ = tokio::time::sleep(grace) => {
                    let _ = tx.send(());
                }
            }
        });
    }

    fn on_rearm(&mut self) {
        if self.state == SessionState::Active && !self.lifetime.is_cancelled() {
            self.fullscreen.rearm();
        }
    }

    async fn teardown(&mut self, terminal: SessionState) {
        self.lifetime.cancel();
        self.fullscreen.retire();
        self.environment.disarm();
        self.monitor.set_active(false);
        self.driver = None;

        if self.recorder.is_recording() {
            match self.recorder.stop().await {
                Ok(Some(upload)) => self.uploads.push(upload),
                Ok(None) => {}
                Err(e) => warn!("Stopping recording at teardown failed: {}", e),
            }
        }

        let mut delivered = vec![self.dispatcher.emit(EventKind::InterviewEnded)];
        if terminal == SessionState::Exited {
            delivered.push(self.dispatcher.emit(EventKind::InterviewExited));
        }
        self.transition(terminal);
        metrics::counter!("proctor_sessions_total", "outcome" => terminal.as_str()).increment(1);

        let backend = self.services.backend.clone();
        let session_id = self.session_id.clone();
        let uploads = std::mem::take(&mut self.uploads);
        self.tasks.push(tokio::spawn(async move {
            for upload in uploads {
                if let Err(e) = upload.await {
                    warn!("Recording upload task failed: {}", e);
                }
            }
            for delivery in delivered {
                if let Err(e) = delivery.await {
                    warn!("Event delivery task failed: {}", e);
                }
            }
            match backend.end_session(&session_id).await {
                Ok(()) => info!("Session {} closed on the backend", session_id),
                Err(e) => warn!("Failed to end session {}: {}", session_id, e),
            }
        }));

        let summary = self.dispatcher.log().summary();
        info!(
            "Session {} {} with {} events: {:?}",
            self.session_id,
            terminal,
            self.dispatcher.log().len(),
            summary
        );

        if terminal == SessionState::Exited {
            self.services.shell.navigate_away();
        }
    }

    fn require(&self, state: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state != state {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        info!("Session {}: {} -> {}", self.session_id, self.state, next);
        self.state = next;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

async fn next_captured(driver: Option<&mut CaptureDriver>) -> Option<CapturedFrame> {
    match driver {
        Some(driver) => driver.next_observation().await,
        None => std::future::pending().await,
    }
}
