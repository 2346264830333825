//! Calibration session runtime
//!
//! Single-consumer event loop around the [`CalibrationSession`] reducer.
//! Inbound events (detector frames, user actions, fullscreen changes)
//! arrive on one channel and are applied strictly in order; commands
//! coming back from the reducer are executed here: timers become
//! abortable tokio tasks, fullscreen requests go to the platform
//! adapter. State is published through a watch channel so presentation
//! layers observe snapshots without touching the session.

pub mod config;

pub use config::RuntimeConfig;

use calibration::{
    CalibrationSession, Command, SessionEvent, SessionSnapshot, TimerId, TimerToken, UserAction,
};
use face_geometry::{FaceLandmarks, FaceObservation};
use fullscreen_proctor::FullscreenApi;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Runtime error types
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// Events fed into the runtime from the outside world
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// The capture surface finished loading
    CameraReady,
    /// One frame's detected faces, in detector order
    Frame(Vec<FaceLandmarks>),
    /// A user action from the presentation layer
    Action(UserAction),
    /// Platform fullscreen state changed
    FullscreenChanged(bool),
    /// Stop the loop
    Shutdown,
}

/// The session event loop.
///
/// Owns the session, the platform fullscreen adapter, and the live
/// timer tasks. One timer per purpose: arming a purpose aborts the
/// previous task, so an abandoned step's timer can never fire late
/// (the session's epoch guard backstops the race where it already has).
pub struct SessionRuntime<F: FullscreenApi> {
    session: CalibrationSession,
    fullscreen: F,
    events: mpsc::Receiver<RuntimeEvent>,
    timer_tx: mpsc::UnboundedSender<TimerToken>,
    timer_rx: mpsc::UnboundedReceiver<TimerToken>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    camera_ready: bool,
}

impl<F: FullscreenApi> SessionRuntime<F> {
    /// Build a runtime around a fresh session. Returns the runtime and
    /// the snapshot receiver for the presentation layer.
    pub fn new(
        config: RuntimeConfig,
        fullscreen: F,
        events: mpsc::Receiver<RuntimeEvent>,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let session = CalibrationSession::new(config.calibration);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        (
            Self {
                session,
                fullscreen,
                events,
                timer_tx,
                timer_rx,
                timers: HashMap::new(),
                snapshot_tx,
                camera_ready: false,
            },
            snapshot_rx,
        )
    }

    /// Run until the event channel closes or a shutdown event arrives
    pub async fn run(mut self) {
        info!("session runtime started");
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(RuntimeEvent::Shutdown) | None => break,
                    Some(event) => self.on_event(event),
                },
                Some(token) = self.timer_rx.recv() => {
                    self.dispatch(SessionEvent::TimerFired(token));
                }
            }
        }
        for (_, task) in self.timers.drain() {
            task.abort();
        }
        info!("session runtime stopped");
    }

    fn on_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::CameraReady => {
                info!("camera ready");
                self.camera_ready = true;
            }
            RuntimeEvent::Frame(faces) => match FaceObservation::from_faces(&faces) {
                Ok(observation) => self.dispatch(SessionEvent::Frame(observation)),
                Err(e) => warn!(error = %e, "dropping unusable detection frame"),
            },
            RuntimeEvent::Action(action) => {
                if action == UserAction::Begin && !self.camera_ready {
                    debug!("begin ignored, camera not ready");
                    return;
                }
                self.dispatch(SessionEvent::Action(action));
            }
            RuntimeEvent::FullscreenChanged(is_fullscreen) => {
                self.dispatch(SessionEvent::FullscreenChanged(is_fullscreen));
            }
            RuntimeEvent::Shutdown => unreachable!("handled in run"),
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let commands = self.session.handle(event);
        for command in commands {
            self.execute(command);
        }
        // Best effort: presentation may have gone away
        let _ = self.snapshot_tx.send(self.session.snapshot());
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::StartTimer { token, after } => {
                let tx = self.timer_tx.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(token);
                });
                if let Some(previous) = self.timers.insert(token.id, task) {
                    previous.abort();
                }
            }
            Command::EnterFullscreen => {
                if let Err(e) = self.fullscreen.request() {
                    // Degrade silently: the session continues without
                    // mandatory fullscreen enforcement
                    warn!(error = %e, "fullscreen request failed");
                }
            }
        }
    }
}

/// Initialize logging for a runtime host
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
