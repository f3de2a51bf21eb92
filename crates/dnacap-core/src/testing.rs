//! Test doubles for the device traits.

use crate::{
    ClickInjector, ClipboardSource, CoreError, CoreResult, CycleUnits, Dataset, Devices, Point,
    PointerSource, Prompter, Region, ScreenCapturer, Sleeper,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use image::RgbaImage;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Produces blank images of the requested size.
#[derive(Default)]
pub struct FakeScreen {
    regions: Mutex<Vec<Region>>,
    fail_at: Option<usize>,
}

impl FakeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the n-th (1-based) capture call.
    pub fn failing_at(call: usize) -> Self {
        Self { fail_at: Some(call), ..Self::default() }
    }

    pub fn captured_regions(&self) -> Vec<Region> {
        self.regions.lock().unwrap().clone()
    }

    pub fn capture_count(&self) -> usize {
        self.regions.lock().unwrap().len()
    }
}

impl ScreenCapturer for FakeScreen {
    fn capture(&self, region: &Region) -> CoreResult<RgbaImage> {
        let mut regions = self.regions.lock().unwrap();
        if self.fail_at == Some(regions.len() + 1) {
            return Err(CoreError::Capture("display went away".into()));
        }
        regions.push(*region);
        Ok(RgbaImage::new(region.width(), region.height()))
    }
}

/// Records clicks and replays scripted pointer positions.
#[derive(Default)]
pub struct FakeInput {
    clicks: Mutex<Vec<Point>>,
    positions: Mutex<VecDeque<Point>>,
    fail_at: Option<usize>,
    gate: Option<(usize, Sender<()>, Receiver<()>)>,
}

impl FakeInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positions(positions: impl IntoIterator<Item = Point>) -> Self {
        Self { positions: Mutex::new(positions.into_iter().collect()), ..Self::default() }
    }

    /// Fail the n-th (1-based) click.
    pub fn failing_at(click: usize) -> Self {
        Self { fail_at: Some(click), ..Self::default() }
    }

    /// Block inside the n-th click until released.
    ///
    /// Returns the input plus a receiver signalled when the click is reached
    /// and a sender that releases it.
    pub fn gated_at(click: usize) -> (Self, Receiver<()>, Sender<()>) {
        let (reached_tx, reached_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let input = Self { gate: Some((click, reached_tx, release_rx)), ..Self::default() };
        (input, reached_rx, release_tx)
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.clicks.lock().unwrap().clone()
    }
}

impl ClickInjector for FakeInput {
    fn click(&self, point: Point) -> CoreResult<()> {
        let count = {
            let mut clicks = self.clicks.lock().unwrap();
            if self.fail_at == Some(clicks.len() + 1) {
                return Err(CoreError::Injection("input device unavailable".into()));
            }
            clicks.push(point);
            clicks.len()
        };

        if let Some((at, reached, release)) = &self.gate {
            if *at == count {
                reached.send(()).unwrap();
                release.recv().unwrap();
            }
        }
        Ok(())
    }
}

impl PointerSource for FakeInput {
    fn position(&self) -> CoreResult<Point> {
        self.positions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CoreError::Injection("no scripted pointer position".into()))
    }
}

enum ClipMode {
    Always(String),
    Failing(String),
    Counting,
}

/// Scripted clipboard. `counting()` returns `dna-<call number>`.
pub struct FakeClipboard {
    mode: ClipMode,
    fail_calls: Vec<u32>,
    calls: AtomicU32,
}

impl FakeClipboard {
    fn with_mode(mode: ClipMode) -> Self {
        Self { mode, fail_calls: vec![], calls: AtomicU32::new(0) }
    }

    pub fn always(text: &str) -> Self {
        Self::with_mode(ClipMode::Always(text.into()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_mode(ClipMode::Failing(message.into()))
    }

    pub fn counting() -> Self {
        Self::with_mode(ClipMode::Counting)
    }

    pub fn counting_failing_on(calls: &[u32]) -> Self {
        Self { fail_calls: calls.to_vec(), ..Self::counting() }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClipboardSource for FakeClipboard {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn read_text(&self) -> Result<String, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_calls.contains(&call) {
            return Err(format!("scripted failure on call {call}"));
        }
        match &self.mode {
            ClipMode::Always(text) => Ok(text.clone()),
            ClipMode::Failing(message) => Err(message.clone()),
            ClipMode::Counting => Ok(format!("dna-{call}")),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    durations: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn durations(&self) -> Vec<Duration> {
        self.durations.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.durations.lock().unwrap().push(duration);
    }
}

/// Answers yes/no questions from a script; runs out → `Aborted`.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<bool>>,
    messages: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        Self { answers: RefCell::new(answers.into_iter().collect()), ..Self::default() }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn notify(&self, message: &str) -> CoreResult<()> {
        self.messages.borrow_mut().push(message.to_string());
        Ok(())
    }

    fn wait_for_confirm(&self, message: &str) -> CoreResult<()> {
        self.messages.borrow_mut().push(message.to_string());
        Ok(())
    }

    fn ask_yes_no(&self, question: &str) -> CoreResult<bool> {
        self.messages.borrow_mut().push(question.to_string());
        self.answers.borrow_mut().pop_front().ok_or(CoreError::Aborted)
    }
}

/// A dataset in a temp dir plus fake devices.
pub struct Rig {
    _dir: TempDir,
    pub dataset: Dataset,
    pub screen: Arc<FakeScreen>,
    pub input: Arc<FakeInput>,
    pub clipboard: Arc<FakeClipboard>,
    pub fallback: Arc<FakeClipboard>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with(FakeScreen::new(), FakeInput::new())
    }

    pub fn with(screen: FakeScreen, input: FakeInput) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::in_workdir(dir.path());
        dataset.ensure().unwrap();
        Self {
            _dir: dir,
            dataset,
            screen: Arc::new(screen),
            input: Arc::new(input),
            clipboard: Arc::new(FakeClipboard::counting()),
            fallback: Arc::new(FakeClipboard::failing("no fallback")),
            sleeper: Arc::new(RecordingSleeper::default()),
        }
    }

    pub fn with_clipboard(mut self, primary: FakeClipboard, fallback: FakeClipboard) -> Self {
        self.clipboard = Arc::new(primary);
        self.fallback = Arc::new(fallback);
        self
    }

    pub fn devices(&self) -> Devices {
        Devices {
            screen: self.screen.clone(),
            pointer: self.input.clone(),
            clicker: self.input.clone(),
            clipboard: self.clipboard.clone(),
            clipboard_fallback: self.fallback.clone(),
            sleeper: self.sleeper.clone(),
        }
    }

    pub fn units(&self) -> CycleUnits {
        CycleUnits::new(&self.devices(), self.dataset.clone())
    }
}
