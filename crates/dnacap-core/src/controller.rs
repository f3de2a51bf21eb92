//! Foreground owner of the configuration and of at most one running worker.

use crate::{
    Calibrator, ConfigStore, CoreError, CoreResult, CycleUnits, Dataset, Devices, Harvester,
    Point, Prompter, Region, RunHandle, RunOutcome, ValidationError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// Parse a user-entered iteration count; must be a positive integer.
pub fn parse_count(text: &str) -> Result<u32, ValidationError> {
    match text.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ValidationError::InvalidCount(text.trim().to_string())),
    }
}

pub struct Controller {
    store: ConfigStore,
    dataset: Dataset,
    devices: Devices,
    active: Option<RunHandle>,
}

impl Controller {
    pub fn new(store: ConfigStore, dataset: Dataset, devices: Devices) -> Self {
        Self { store, dataset, devices, active: None }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Mutable access to the configuration. The running worker holds its own
    /// snapshot, so edits only affect the next run.
    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// True while a worker exists that has not been joined.
    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn active(&self) -> Option<&RunHandle> {
        self.active.as_ref()
    }

    pub fn calibrate_region(&mut self, prompter: &dyn Prompter) -> CoreResult<Region> {
        self.ensure_idle()?;
        self.dataset.ensure()?;
        let region = self.calibrator(prompter).capture_region()?;
        self.store.set_region(region);
        Ok(region)
    }

    pub fn calibrate_points(
        &mut self,
        prompter: &dyn Prompter,
        extract_label: &str,
        action_label: &str,
    ) -> CoreResult<(Point, Point)> {
        self.ensure_idle()?;
        let (extract, action) =
            self.calibrator(prompter).capture_control_points(extract_label, action_label)?;
        self.store.set_extract_point(extract);
        self.store.set_action_point(action);
        Ok((extract, action))
    }

    fn calibrator<'a>(&'a self, prompter: &'a dyn Prompter) -> Calibrator<'a> {
        Calibrator::new(
            &*self.devices.pointer,
            &*self.devices.screen,
            &self.dataset,
            prompter,
        )
    }

    /// Start a run of `count` iterations on a background worker.
    pub fn start(&mut self, count: u32) -> CoreResult<&RunHandle> {
        self.start_with_rng(count, StdRng::from_entropy())
    }

    pub fn start_with_rng(&mut self, count: u32, rng: StdRng) -> CoreResult<&RunHandle> {
        if count == 0 {
            return Err(ValidationError::InvalidCount(count.to_string()).into());
        }
        self.ensure_idle()?;
        if let Some(previous) = self.active.take() {
            let outcome = previous.join();
            warn!(?outcome, "reaped a finished run that was never collected");
        }

        let snapshot = self.store.snapshot();
        snapshot.ensure_ready()?;
        self.dataset.ensure()?;

        info!(count, timing = %snapshot.timing(), "starting run");
        let units = CycleUnits::new(&self.devices, self.dataset.clone());
        let handle = Harvester::spawn_with_rng(units, snapshot, count, rng);
        Ok(self.active.insert(handle))
    }

    /// Request cancellation of the active run. Returns false when idle.
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Join the worker and return to idle.
    pub fn finish(&mut self) -> Option<RunOutcome> {
        let outcome = self.active.take()?.join();
        info!(state = ?outcome.state, completed = outcome.completed, total = outcome.total, "run finished");
        Some(outcome)
    }

    fn ensure_idle(&self) -> CoreResult<()> {
        if self.is_running() {
            return Err(CoreError::AlreadyRunning);
        }
        Ok(())
    }
}
