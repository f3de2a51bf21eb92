//! Harvest engine: run state machine + worker thread.

use crate::{Checkpoint, ConfigSnapshot, CoreResult, CycleUnits};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The visible progress readout is refreshed after every multiple of this many iterations.
pub const PROGRESS_REFRESH_EVERY: u32 = 10;

/// Run state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No worker has started yet.
    #[default]
    Idle,
    /// Worker is executing iterations.
    Running,
    /// All iterations finished.
    Completed,
    /// Stopped at an iteration boundary on request.
    Cancelled,
    /// An iteration raised a fatal error.
    Failed,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Completed | EngineState::Cancelled | EngineState::Failed)
    }
}

/// Events emitted by the worker. The worker is the only producer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged { old: EngineState, new: EngineState },
    /// Progress readout refresh (every 10th iteration and the last one).
    Progress { completed: u32, total: u32 },
    /// Both clipboard reads failed; an empty text was written.
    ClipboardDegraded { index: u32 },
    CheckpointWritten { completed: u32, total: u32 },
    Completed { total: u32 },
    Cancelled { completed: u32, total: u32 },
    Failed { completed: u32, total: u32, message: String },
}

impl EngineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineEvent::Completed { .. } | EngineEvent::Cancelled { .. } | EngineEvent::Failed { .. }
        )
    }
}

/// Final result of a run, returned when the worker is joined.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: EngineState,
    pub completed: u32,
    pub total: u32,
    pub error: Option<String>,
}

/// State shared between the worker and its handle.
#[derive(Default)]
struct Shared {
    state: Mutex<EngineState>,
    completed: AtomicU32,
    cancel: AtomicBool,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to control a running worker. Owned by the foreground.
pub struct RunHandle {
    shared: Arc<Shared>,
    total: u32,
    event_rx: Receiver<EngineEvent>,
    thread: Option<JoinHandle<RunOutcome>>,
}

impl RunHandle {
    /// Request a stop. Observed at the top of the next iteration.
    pub fn cancel(&self) {
        if !self.shared.cancel.swap(true, Ordering::SeqCst) {
            info!("cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state()
    }

    /// Iterations fully completed so far.
    pub fn completed(&self) -> u32 {
        self.shared.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn percent(&self) -> f64 {
        percent(self.completed(), self.total)
    }

    /// Event stream, for use with `crossbeam_channel::select!`.
    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.event_rx
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker to exit.
    pub fn join(mut self) -> RunOutcome {
        let fallback = RunOutcome {
            state: EngineState::Failed,
            completed: self.completed(),
            total: self.total,
            error: Some("worker thread panicked".into()),
        };
        match self.thread.take() {
            Some(handle) => handle.join().unwrap_or(fallback),
            None => fallback,
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        // A dropped handle must not leave an orphaned worker clicking away.
        if self.thread.is_some() {
            self.cancel();
        }
    }
}

pub(crate) fn percent(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Worker: runs the capture → extract → trigger cycle `total` times.
pub struct Harvester {
    units: CycleUnits,
    snapshot: ConfigSnapshot,
    total: u32,
    rng: StdRng,
    shared: Arc<Shared>,
    event_tx: Sender<EngineEvent>,
}

impl Harvester {
    /// Spawn a worker thread and return a handle to control it.
    pub fn spawn(units: CycleUnits, snapshot: ConfigSnapshot, total: u32) -> RunHandle {
        Self::spawn_with_rng(units, snapshot, total, StdRng::from_entropy())
    }

    /// Like [`Harvester::spawn`] with a caller-provided jitter RNG.
    pub fn spawn_with_rng(
        units: CycleUnits,
        snapshot: ConfigSnapshot,
        total: u32,
        rng: StdRng,
    ) -> RunHandle {
        let (event_tx, event_rx) = unbounded();
        let shared = Arc::new(Shared::default());

        let harvester = Harvester {
            units,
            snapshot,
            total,
            rng,
            shared: shared.clone(),
            event_tx,
        };

        let thread = thread::Builder::new()
            .name("dnacap-worker".into())
            .spawn(move || harvester.run())
            .map_err(|e| error!(error = %e, "failed to spawn worker thread"))
            .ok();

        if thread.is_none() {
            *shared.state() = EngineState::Failed;
        }

        RunHandle { shared, total, event_rx, thread }
    }

    fn run(mut self) -> RunOutcome {
        info!(total = self.total, "worker started");
        self.transition_state(EngineState::Running);

        for index in 1..=self.total {
            if self.shared.cancel.load(Ordering::SeqCst) {
                let completed = index - 1;
                info!(completed, total = self.total, "run cancelled");
                self.transition_state(EngineState::Cancelled);
                self.emit(EngineEvent::Cancelled { completed, total: self.total });
                return self.outcome(EngineState::Cancelled, None);
            }

            if let Err(e) = self.run_iteration(index) {
                let completed = self.shared.completed.load(Ordering::SeqCst);
                error!(index, error = %e, "iteration failed, aborting run");
                let message = format!("iteration {index} failed: {e}");
                self.transition_state(EngineState::Failed);
                self.emit(EngineEvent::Failed {
                    completed,
                    total: self.total,
                    message: message.clone(),
                });
                return self.outcome(EngineState::Failed, Some(message));
            }
        }

        info!(total = self.total, "run completed");
        self.transition_state(EngineState::Completed);
        self.emit(EngineEvent::Completed { total: self.total });
        self.outcome(EngineState::Completed, None)
    }

    fn run_iteration(&mut self, index: u32) -> CoreResult<()> {
        let timing = *self.snapshot.timing();

        let file_name = self.units.capture.capture(self.snapshot.region(), index)?;

        let extracted = self.units.extractor.extract(
            self.snapshot.extract_point(),
            timing.clipboard_delay(),
            &file_name,
        )?;
        if extracted.degraded {
            self.emit(EngineEvent::ClipboardDegraded { index });
        }

        self.units.trigger.trigger(self.snapshot.action_point(), timing.ui_update_delay())?;

        let jitter = timing.sample_delay(&mut self.rng);
        self.sleep(jitter);

        self.shared.completed.store(index, Ordering::SeqCst);
        debug!(index, file = %file_name, ?jitter, "iteration done");

        if index % PROGRESS_REFRESH_EVERY == 0 || index == self.total {
            self.emit(EngineEvent::Progress { completed: index, total: self.total });
        }

        if Checkpoint::is_due(index) {
            let checkpoint = Checkpoint { completed: index, total: self.total };
            self.units.dataset().write_checkpoint(checkpoint)?;
            self.emit(EngineEvent::CheckpointWritten { completed: index, total: self.total });
        }

        Ok(())
    }

    fn sleep(&self, duration: Duration) {
        self.units.sleeper.sleep(duration);
    }

    fn outcome(&self, state: EngineState, error: Option<String>) -> RunOutcome {
        RunOutcome {
            state,
            completed: self.shared.completed.load(Ordering::SeqCst),
            total: self.total,
            error,
        }
    }

    fn transition_state(&self, new_state: EngineState) {
        let old = {
            let mut guard = self.shared.state();
            let old = *guard;
            if old != new_state {
                *guard = new_state;
                debug!(?old, ?new_state, "state transition");
                Some(old)
            } else {
                None
            }
        };

        if let Some(old) = old {
            self.emit(EngineEvent::StateChanged { old, new: new_state });
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Err(e) = self.event_tx.send(event) {
            warn!("failed to emit event: {}", e);
        }
    }
}
