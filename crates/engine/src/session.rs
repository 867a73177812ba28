//! Recording session management.
//!
//! One `Recorder` owns one session: idle → starting → running ⇄ paused →
//! stopping → finished, or failed at any point. Buffers arrive on
//! arbitrary backend threads through an [`EventSink`]; all mutable
//! session state sits behind a single lock because the cumulative pause
//! offset is only correct if buffers are processed one at a time.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use reel_common::error::{ReelError, ReelResult};
use reel_common::time::RecordingClock;
use reel_media::{
    RecordingOptions, RecordingTarget, SampleBuffer, StreamChannel, StreamPlan,
    target::MAIN_SCREEN_ID,
};

use crate::backend::{CaptureBackend, CaptureEvent};
use crate::power::IdleSleepInhibitor;
use crate::timing::StreamTiming;
use crate::writer::ContainerWriter;

/// State of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session created but not started.
    NotStarted,
    /// Setup complete, capture running, waiting for the first buffer.
    Starting,
    /// Buffers are being written.
    Running,
    /// Buffers are being observed and dropped.
    Paused,
    /// Teardown in progress.
    Stopping,
    /// Container finalized.
    Finished,
    /// Terminal failure; `stop_recording` re-raises the stored error.
    Failed,
}

/// Cloneable handle backends use to deliver capture events into the
/// session. Safe to call from any thread; delivery is synchronous.
#[derive(Clone)]
pub struct EventSink {
    core: Arc<SessionCore>,
}

impl EventSink {
    pub fn deliver(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::Buffer { channel, buffer } => self.core.handle_buffer(channel, buffer),
            CaptureEvent::Stopped { error } => self.core.handle_stream_stopped(error),
        }
    }
}

struct Shared {
    state: SessionState,
    plan: Option<StreamPlan>,
    writer: Option<Box<dyn ContainerWriter>>,
    attached: Vec<StreamChannel>,
    writer_begun: bool,
    timing: StreamTiming,
    resumes_applied: u64,
    failure: Option<ReelError>,
    sleep: Option<IdleSleepInhibitor>,
    clock: Option<RecordingClock>,
    appended: u64,
    dropped: u64,
}

struct SessionCore {
    shared: Mutex<Shared>,
    state_tx: watch::Sender<SessionState>,
    resume_tx: watch::Sender<u64>,
}

impl SessionCore {
    fn set_state(&self, shared: &mut Shared, state: SessionState) {
        shared.state = state;
        let _ = self.state_tx.send(state);
    }

    fn fail(&self, shared: &mut Shared, error: ReelError) {
        tracing::error!(error = %error, "Recording session failed");
        if shared.failure.is_none() {
            shared.failure = Some(error);
        }
        shared.sleep = None;
        // Release any resume rendezvous so the caller observes the failure.
        shared.resumes_applied += 1;
        let _ = self.resume_tx.send(shared.resumes_applied);
        self.set_state(shared, SessionState::Failed);
    }

    /// The per-buffer path. Runs on the delivering backend thread.
    fn handle_buffer(&self, channel: StreamChannel, mut buffer: SampleBuffer) {
        let mut shared = self.shared.lock();

        match shared.state {
            SessionState::Starting | SessionState::Running => {}
            SessionState::Paused => {
                shared.dropped += 1;
                return;
            }
            // Late buffers racing stop/failure.
            _ => return,
        }

        let Some(reference) = shared.plan.as_ref().map(|p| p.reference) else {
            return;
        };
        if !shared.plan.as_ref().is_some_and(|p| p.is_active(channel)) {
            shared.dropped += 1;
            return;
        }

        // The writer session begins at the first reference-channel
        // buffer's raw timestamp; earlier buffers on other channels have
        // no anchor yet and are dropped.
        if !shared.writer_begun {
            if channel != reference {
                shared.dropped += 1;
                return;
            }
            let Some(writer) = shared.writer.as_mut() else {
                return;
            };
            if let Err(e) = writer.begin_session(buffer.pts) {
                self.fail(
                    &mut shared,
                    ReelError::could_not_start_stream(format!(
                        "writer failed to begin session: {e}"
                    )),
                );
                return;
            }
            shared.writer_begun = true;
            shared.sleep = Some(IdleSleepInhibitor::acquire("recording in progress"));
            shared.clock = Some(RecordingClock::start());
            self.set_state(&mut shared, SessionState::Running);
            tracing::info!(%channel, start = %buffer.pts, "Writer session began");
        }

        let was_resuming = shared.timing.is_resuming();
        if !shared.timing.apply(channel == reference, &mut buffer) {
            shared.dropped += 1;
            return;
        }
        if was_resuming && !shared.timing.is_resuming() {
            shared.resumes_applied += 1;
            let _ = self.resume_tx.send(shared.resumes_applied);
        }

        let Some(writer) = shared.writer.as_mut() else {
            return;
        };
        if !writer.is_ready_for(channel) {
            shared.dropped += 1;
            tracing::trace!(%channel, "Channel input not ready; buffer dropped");
            return;
        }
        match writer.append(channel, &buffer) {
            Ok(()) => shared.appended += 1,
            Err(e) => self.fail(&mut shared, e),
        }
    }

    fn handle_stream_stopped(&self, error: ReelError) {
        let mut shared = self.shared.lock();
        match shared.state {
            SessionState::NotStarted
            | SessionState::Stopping
            | SessionState::Finished
            | SessionState::Failed => {
                tracing::debug!(error = %error, "Backend stopped during shutdown; ignoring");
            }
            _ => self.fail(&mut shared, error),
        }
    }
}

/// A recording session coordinating one capture backend, one container
/// writer, and up to four media channels.
pub struct Recorder {
    backend: Box<dyn CaptureBackend>,
    core: Arc<SessionCore>,
    state_rx: watch::Receiver<SessionState>,
    resume_rx: watch::Receiver<u64>,
    destination: Option<PathBuf>,
    capturing: bool,
}

impl Recorder {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::NotStarted);
        let (resume_tx, resume_rx) = watch::channel(0u64);
        let core = Arc::new(SessionCore {
            shared: Mutex::new(Shared {
                state: SessionState::NotStarted,
                plan: None,
                writer: None,
                attached: Vec::new(),
                writer_begun: false,
                timing: StreamTiming::new(),
                resumes_applied: 0,
                failure: None,
                sleep: None,
                clock: None,
                appended: 0,
                dropped: 0,
            }),
            state_tx,
            resume_tx,
        });
        Self {
            backend,
            core,
            state_rx,
            resume_rx,
            destination: None,
            capturing: false,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// The event sink this session consumes from. Exposed for backends
    /// that are driven externally (tests, replay tools).
    pub fn sink(&self) -> EventSink {
        EventSink {
            core: self.core.clone(),
        }
    }

    /// Recording duration so far, excluding time before the first buffer.
    pub fn elapsed_secs(&self) -> f64 {
        self.core
            .shared
            .lock()
            .clock
            .as_ref()
            .map(|c| c.elapsed_secs())
            .unwrap_or(0.0)
    }

    /// Validate, resolve the target, open the writer, and start capture.
    ///
    /// Returns once the backend confirms capture is running; the session
    /// is then `Starting` until the first buffer arrives (see
    /// [`started`](Self::started)). Setup failures tear down every
    /// partially-constructed resource and leave the session `NotStarted`.
    pub async fn start_recording(
        &mut self,
        target: RecordingTarget,
        options: RecordingOptions,
    ) -> ReelResult<()> {
        {
            let shared = self.core.shared.lock();
            if shared.state != SessionState::NotStarted {
                return Err(ReelError::AlreadyStarted);
            }
        }

        let plan = StreamPlan::build(target, options)?;

        {
            let mut shared = self.core.shared.lock();
            self.core.set_state(&mut shared, SessionState::Starting);
        }

        match self.start_inner(plan).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.teardown_partial().await;
                Err(e)
            }
        }
    }

    async fn start_inner(&mut self, mut plan: StreamPlan) -> ReelResult<()> {
        self.backend.ensure_permission().await?;

        plan.target = self.resolve_target(&plan.target).await?;
        if let Some(mic_id) = plan.options.microphone_device_id.clone() {
            let devices = self.backend.list_audio_devices().await?;
            if !devices.iter().any(|d| d.id == mic_id) {
                return Err(ReelError::microphone_not_found(mic_id));
            }
        }

        tracing::info!(
            target = plan.target.kind(),
            id = plan.target.identifier().unwrap_or("-"),
            channels = ?plan.channels,
            reference = %plan.reference,
            destination = %plan.options.destination.display(),
            "Starting recording session"
        );

        let mut writer = self.backend.open_writer(&plan)?;
        for &channel in &plan.channels {
            writer.add_channel(channel).map_err(|e| {
                tracing::warn!(%channel, error = %e, "Writer rejected channel input");
                ReelError::could_not_add_input(channel.name())
            })?;
        }

        self.destination = Some(plan.options.destination.clone());
        {
            let mut shared = self.core.shared.lock();
            shared.attached = plan.channels.clone();
            shared.writer = Some(writer);
            shared.plan = Some(plan.clone());
        }

        let sink = self.sink();
        self.backend
            .start_capture(&plan, sink)
            .await
            .map_err(|e| match e {
                e @ ReelError::PermissionDenied => e,
                e => ReelError::could_not_start_stream(e.to_string()),
            })?;
        self.capturing = true;

        tracing::info!("Capture started; waiting for first buffer");
        Ok(())
    }

    async fn resolve_target(&self, target: &RecordingTarget) -> ReelResult<RecordingTarget> {
        match target {
            RecordingTarget::Screen { id } => {
                let screens = self.backend.list_screens().await?;
                if screens.is_empty() {
                    return Err(ReelError::NoDisplaysConnected);
                }
                let screen = if id == MAIN_SCREEN_ID {
                    screens.iter().find(|s| s.primary).or(screens.first())
                } else {
                    screens.iter().find(|s| &s.id == id)
                };
                let screen = screen.ok_or_else(|| ReelError::target_not_found(id))?;
                Ok(RecordingTarget::Screen {
                    id: screen.id.clone(),
                })
            }
            RecordingTarget::Window { id } => {
                let windows = self.backend.list_windows().await?;
                windows
                    .iter()
                    .find(|w| &w.id == id)
                    .map(|w| RecordingTarget::Window { id: w.id.clone() })
                    .ok_or_else(|| ReelError::target_not_found(id))
            }
            RecordingTarget::ExternalDevice { id } => {
                let devices = self.backend.list_external_devices().await?;
                devices
                    .iter()
                    .find(|d| &d.id == id)
                    .map(|d| RecordingTarget::ExternalDevice { id: d.id.clone() })
                    .ok_or_else(|| ReelError::target_not_found(id))
            }
            RecordingTarget::AudioOnly => Ok(RecordingTarget::AudioOnly),
        }
    }

    async fn teardown_partial(&mut self) {
        if self.capturing {
            if let Err(e) = self.backend.stop_capture().await {
                tracing::warn!(error = %e, "Backend stop during teardown reported an error");
            }
            self.capturing = false;
        }
        let mut shared = self.core.shared.lock();
        shared.writer = None;
        shared.plan = None;
        shared.attached.clear();
        shared.sleep = None;
        self.core.set_state(&mut shared, SessionState::NotStarted);
    }

    /// Resolves once the first buffer has been written and the session
    /// is visibly recording (the moment a CLI host is told about).
    pub async fn started(&self) -> ReelResult<()> {
        let mut rx = self.state_rx.clone();
        loop {
            let state = *rx.borrow_and_update();
            match state {
                SessionState::Running
                | SessionState::Paused
                | SessionState::Stopping
                | SessionState::Finished => return Ok(()),
                SessionState::Failed => return Err(self.failure_summary()),
                SessionState::NotStarted => return Err(ReelError::NotStarted),
                SessionState::Starting => {
                    if rx.changed().await.is_err() {
                        return Err(ReelError::session("session dropped while starting"));
                    }
                }
            }
        }
    }

    /// Pause: subsequent buffers are observed and dropped.
    pub fn pause(&self) -> ReelResult<()> {
        let mut shared = self.core.shared.lock();
        if shared.state != SessionState::Running {
            return Err(ReelError::session("cannot pause: session is not running"));
        }
        shared.sleep = None;
        self.core.set_state(&mut shared, SessionState::Paused);
        tracing::info!("Recording paused");
        Ok(())
    }

    /// Resume a paused recording.
    ///
    /// Suspends the caller until the first post-resume reference-channel
    /// buffer has recomputed the time offset, so resume is visibly in
    /// effect when this returns.
    pub async fn resume(&self) -> ReelResult<()> {
        let rendezvous = {
            let mut shared = self.core.shared.lock();
            if shared.state != SessionState::Paused {
                return Err(ReelError::session("cannot resume: session is not paused"));
            }
            shared.timing.request_resume();
            shared.sleep = Some(IdleSleepInhibitor::acquire("recording in progress"));
            self.core.set_state(&mut shared, SessionState::Running);
            shared.resumes_applied + 1
        };
        tracing::info!("Recording resumed; waiting for the next reference buffer");

        let mut rx = self.resume_rx.clone();
        if rx.wait_for(|applied| *applied >= rendezvous).await.is_err() {
            return Err(ReelError::session("session dropped while resuming"));
        }
        if self.state() == SessionState::Failed {
            return Err(ReelError::session("session failed while resuming"));
        }
        Ok(())
    }

    /// Stop recording, finalize the container, and return the
    /// destination path.
    ///
    /// On a failed session this re-raises the stored error instead of
    /// finalizing. Calling it before `start_recording` is an error and
    /// performs no teardown.
    pub async fn stop_recording(&mut self) -> ReelResult<PathBuf> {
        let (writer, attached, begun, prior_failure) = {
            let mut shared = self.core.shared.lock();
            match shared.state {
                SessionState::NotStarted => return Err(ReelError::NotStarted),
                SessionState::Stopping | SessionState::Finished => {
                    return Err(ReelError::session("recorder already stopped"))
                }
                _ => {}
            }
            if shared.state != SessionState::Failed {
                self.core.set_state(&mut shared, SessionState::Stopping);
            }
            shared.sleep = None;
            if shared.timing.is_resuming() {
                // Release a resume() caller blocked on the rendezvous.
                shared.resumes_applied += 1;
                let _ = self.core.resume_tx.send(shared.resumes_applied);
            }
            // The session stays Failed forever; every stop re-raises.
            // The original error moves out once, a copy of its message
            // stays behind for repeated calls.
            let prior_failure = if shared.state == SessionState::Failed {
                Some(match shared.failure.take() {
                    Some(error) => {
                        let message = match &error {
                            ReelError::Session { message } => message.clone(),
                            other => other.to_string(),
                        };
                        shared.failure = Some(ReelError::session(message));
                        error
                    }
                    None => ReelError::session("session failed"),
                })
            } else {
                None
            };
            (
                shared.writer.take(),
                std::mem::take(&mut shared.attached),
                shared.writer_begun,
                prior_failure,
            )
        };

        // Stop the backend first so no more buffers race the writer
        // teardown below (the writer is already out of reach anyway).
        if self.capturing {
            if let Err(e) = self.backend.stop_capture().await {
                tracing::warn!(error = %e, "Backend stop reported an error");
            }
            self.capturing = false;
        }

        if let Some(error) = prior_failure {
            drop(writer); // abandon the container, never finalize twice
            tracing::warn!(error = %error, "Stopping a failed session; re-raising stored error");
            return Err(error);
        }

        if let Some(mut writer) = writer {
            if begun {
                for channel in attached {
                    if let Err(e) = writer.finish_channel(channel) {
                        tracing::warn!(%channel, error = %e, "Failed to finish channel input");
                    }
                }
                if let Err(e) = writer.finalize() {
                    let mut shared = self.core.shared.lock();
                    shared.failure = Some(ReelError::session(e.to_string()));
                    self.core.set_state(&mut shared, SessionState::Failed);
                    return Err(e);
                }
            } else {
                tracing::warn!("Stopped before the first buffer; abandoning empty container");
            }
        }

        let (appended, dropped, elapsed) = {
            let mut shared = self.core.shared.lock();
            self.core.set_state(&mut shared, SessionState::Finished);
            (
                shared.appended,
                shared.dropped,
                shared.clock.as_ref().map(|c| c.elapsed_secs()).unwrap_or(0.0),
            )
        };

        let destination = self
            .destination
            .clone()
            .ok_or_else(|| ReelError::session("destination missing"))?;
        tracing::info!(
            destination = %destination.display(),
            appended,
            dropped,
            duration_secs = elapsed,
            "Recording stopped"
        );
        Ok(destination)
    }

    fn failure_summary(&self) -> ReelError {
        let shared = self.core.shared.lock();
        match &shared.failure {
            Some(error) => ReelError::could_not_start_stream(error.to_string()),
            None => ReelError::could_not_start_stream("session failed"),
        }
    }
}
