//! Interactive console: the foreground surface of a run.

use crate::prompt::ConsolePrompter;
use anyhow::Result;
use crossbeam_channel::{bounded, never, select, unbounded, Receiver};
use dnacap_core::{
    parse_count, save_settings, Controller, CoreError, EngineEvent, EngineState, Settings,
    TimingDraft, TimingField, TimingPreset,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

const EXTRACT_LABEL: &str = "Copy DNA";
const ACTION_LABEL: &str = "Randomize appearance";

const HELP: &str = "\
Commands:
  region                      calibrate the capture region
  points                      calibrate the two control points
  timing                      show timing values
  timing fast|normal|slow     apply a timing preset
  timing <c> <u> <min> <max>  set clipboard, UI update and random delay bounds (seconds)
  show                        show the current configuration
  start [N]                   start a run of N iterations
  stop                        stop the running run after the current iteration
  status                      show run state, checkpoint and dataset size
  save                        save timing and defaults to the settings file
  help                        show this help
  quit                        exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Region,
    Points,
    ShowTiming,
    Preset(TimingPreset),
    SetTiming([String; 4]),
    Show,
    Start(Option<u32>),
    Stop,
    Status,
    Save,
    Help,
    Quit,
    Empty,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((head, rest)) = words.split_first() else {
            return Ok(Command::Empty);
        };

        let command = match (head.to_ascii_lowercase().as_str(), rest) {
            ("region", []) => Command::Region,
            ("points", []) => Command::Points,
            ("timing", []) => Command::ShowTiming,
            ("timing", [preset]) => Command::Preset(preset.parse()?),
            ("timing", [c, u, min, max]) => {
                Command::SetTiming([c, u, min, max].map(|s| s.to_string()))
            }
            ("timing", _) => {
                return Err("usage: timing [fast|normal|slow | <c> <u> <min> <max>]".into())
            }
            ("show", []) => Command::Show,
            ("start", []) => Command::Start(None),
            ("start", [count]) => {
                Command::Start(Some(parse_count(count).map_err(|e| e.to_string())?))
            }
            ("stop", []) => Command::Stop,
            ("status", []) => Command::Status,
            ("save", []) => Command::Save,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            (other, []) => return Err(format!("unknown command {other:?}, type `help`")),
            (other, _) => return Err(format!("`{other}` takes different arguments, type `help`")),
        };
        Ok(command)
    }
}

/// Progress line: `progress: i/N (p.p%)`.
pub fn progress_line(completed: u32, total: u32) -> String {
    let percent = if total == 0 { 0.0 } else { f64::from(completed) * 100.0 / f64::from(total) };
    format!("progress: {completed}/{total} ({percent:.1}%)")
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    controller: Controller,
    settings: Settings,
    settings_path: PathBuf,
    lines: Receiver<String>,
    interrupts: Receiver<()>,
    readout: bool,
}

impl Console {
    /// Spawns the stdin reader and installs the Ctrl-C handler.
    pub fn new(controller: Controller, settings: Settings, settings_path: PathBuf) -> Result<Self> {
        let (line_tx, lines) = unbounded();
        std::thread::Builder::new().name("dnacap-stdin".into()).spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        })?;

        let (interrupt_tx, interrupts) = bounded(1);
        ctrlc::set_handler(move || {
            let _ = interrupt_tx.try_send(());
        })?;

        Ok(Self::with_channels(controller, settings, settings_path, lines, interrupts))
    }

    /// Build a console fed by the given line and interrupt channels.
    pub fn with_channels(
        controller: Controller,
        settings: Settings,
        settings_path: PathBuf,
        lines: Receiver<String>,
        interrupts: Receiver<()>,
    ) -> Self {
        Self { controller, settings, settings_path, lines, interrupts, readout: false }
    }

    /// Process commands until `quit`, Ctrl-C while idle, or end of input.
    ///
    /// When input ends during a run, the run is left to finish first.
    pub fn run(mut self) -> Result<()> {
        println!("dnacap: dataset at {}", self.controller.dataset().root().display());
        println!("{HELP}");
        self.print_missing();
        self.prompt();

        let mut lines = self.lines.clone();
        let interrupts = self.interrupts.clone();
        let mut input_closed = false;
        loop {
            let events = match self.controller.active() {
                Some(handle) => handle.events().clone(),
                None => never(),
            };

            select! {
                recv(lines) -> line => match line {
                    Ok(line) => {
                        if self.handle_line(&line) == Flow::Quit {
                            break;
                        }
                    }
                    Err(_) => {
                        info!("console input closed");
                        if !self.controller.is_running() {
                            break;
                        }
                        self.end_readout_line();
                        println!("Input closed; waiting for the run to finish.");
                        input_closed = true;
                    }
                },
                recv(interrupts) -> _ => {
                    if self.controller.is_running() {
                        self.stop();
                    } else {
                        println!();
                        break;
                    }
                },
                recv(events) -> event => match event {
                    Ok(event) => self.on_event(event),
                    Err(_) => self.finish_run(),
                },
            }

            if input_closed {
                if self.controller.active().is_none() {
                    break;
                }
                lines = never();
            }
        }

        self.shutdown();
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                self.prompt();
                return Flow::Continue;
            }
        };

        match command {
            Command::Quit => return Flow::Quit,
            Command::Empty => {}
            Command::Help => println!("{HELP}"),
            Command::Region => self.calibrate_region(),
            Command::Points => self.calibrate_points(),
            Command::ShowTiming => self.print_timing(),
            Command::Preset(preset) => {
                let mut draft = self.controller.store().draft();
                draft.apply_preset(preset);
                self.apply_timing(&draft, &format!("{} preset", preset.name()));
            }
            Command::SetTiming(fields) => {
                let draft = TimingDraft::from_texts(fields.each_ref().map(String::as_str));
                self.apply_timing(&draft, "custom timing");
            }
            Command::Show => self.print_config(),
            Command::Start(count) => self.start(count.unwrap_or(self.settings.default_count)),
            Command::Stop => {
                if !self.controller.is_running() {
                    println!("No run in progress.");
                } else {
                    self.stop();
                }
            }
            Command::Status => self.print_status(),
            Command::Save => self.save(),
        }

        if !self.readout {
            self.prompt();
        }
        Flow::Continue
    }

    fn calibrate_region(&mut self) {
        let prompter = ConsolePrompter::new(&self.lines, &self.interrupts);
        match self.controller.calibrate_region(&prompter) {
            Ok(region) => println!("Capture region: {region}"),
            Err(CoreError::Aborted) => println!("Region calibration aborted."),
            Err(e) => println!("Region calibration failed: {e}"),
        }
    }

    fn calibrate_points(&mut self) {
        let prompter = ConsolePrompter::new(&self.lines, &self.interrupts);
        match self.controller.calibrate_points(&prompter, EXTRACT_LABEL, ACTION_LABEL) {
            Ok((extract, action)) => {
                println!("{EXTRACT_LABEL}: {extract}");
                println!("{ACTION_LABEL}: {action}");
            }
            Err(CoreError::Aborted) => println!("Control point calibration aborted."),
            Err(e) => println!("Control point calibration failed: {e}"),
        }
    }

    fn apply_timing(&mut self, draft: &TimingDraft, what: &str) {
        match self.controller.store_mut().apply_draft(draft) {
            Ok(()) => {
                println!("Applied {what}.");
                if self.controller.is_running() {
                    println!("The running run keeps its timing; changes apply to the next start.");
                }
                self.print_timing();
            }
            Err(e) => println!("Timing unchanged: {e}"),
        }
    }

    fn start(&mut self, count: u32) {
        match self.controller.start(count) {
            Ok(handle) => {
                println!("Started {} iterations. Type `stop` or press Ctrl-C to stop.", handle.total());
                self.readout = true;
                self.draw_progress(0, count);
            }
            Err(CoreError::NotConfigured(item)) => {
                println!("Cannot start: {item} is not set.");
                self.print_missing();
            }
            Err(e) => println!("Cannot start: {e}"),
        }
    }

    fn stop(&mut self) {
        if self.controller.cancel() {
            self.end_readout();
            println!("Stopping after the current iteration...");
        }
    }

    fn on_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Progress { completed, total } => self.draw_progress(completed, total),
            EngineEvent::ClipboardDegraded { index } => {
                self.end_readout_line();
                println!("Clipboard empty at iteration {index}; wrote an empty text file.");
            }
            EngineEvent::CheckpointWritten { completed, total } => {
                debug!(completed, total, "checkpoint event");
            }
            EngineEvent::StateChanged { old, new } => debug!(?old, ?new, "engine state"),
            EngineEvent::Completed { .. }
            | EngineEvent::Cancelled { .. }
            | EngineEvent::Failed { .. } => self.finish_run(),
        }
    }

    fn finish_run(&mut self) {
        let Some(outcome) = self.controller.finish() else {
            return;
        };
        self.end_readout();
        match outcome.state {
            EngineState::Completed => println!("Done: {} pairs captured.", outcome.completed),
            EngineState::Cancelled => {
                println!("Stopped after {}/{} iterations.", outcome.completed, outcome.total)
            }
            EngineState::Failed => println!(
                "Run failed after {}/{} iterations: {}",
                outcome.completed,
                outcome.total,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
            state => warn!(?state, "run ended in a non-terminal state"),
        }
        self.prompt();
    }

    fn draw_progress(&self, completed: u32, total: u32) {
        if self.readout {
            print!("\r{}", progress_line(completed, total));
            let _ = std::io::stdout().flush();
        }
    }

    fn end_readout_line(&self) {
        if self.readout {
            println!();
        }
    }

    fn end_readout(&mut self) {
        self.end_readout_line();
        self.readout = false;
    }

    fn print_timing(&self) {
        let draft = self.controller.store().draft();
        for field in TimingField::ALL {
            println!("  {field}: {}s", draft.get(field));
        }
    }

    fn print_config(&self) {
        let store = self.controller.store();
        let show = |value: Option<String>| value.unwrap_or_else(|| "not set".into());
        println!("Capture region: {}", show(store.region().map(|r| r.to_string())));
        println!("{EXTRACT_LABEL}: {}", show(store.extract_point().map(|p| p.to_string())));
        println!("{ACTION_LABEL}: {}", show(store.action_point().map(|p| p.to_string())));
        println!("Timing: {}", store.timing());
        println!("Default count: {}", self.settings.default_count);
    }

    fn print_missing(&self) {
        let missing = self.controller.store().missing_items();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|item| item.to_string()).collect();
            println!("Not configured yet: {}.", names.join(", "));
        }
    }

    fn print_status(&self) {
        match self.controller.active() {
            Some(handle) if !handle.is_finished() => {
                println!("Running: {}", progress_line(handle.completed(), handle.total()))
            }
            _ => println!("Idle."),
        }

        let dataset = self.controller.dataset();
        match dataset.read_checkpoint() {
            Ok(Some(checkpoint)) => println!("Last checkpoint: {checkpoint}"),
            Ok(None) => println!("No checkpoint."),
            Err(e) => println!("Checkpoint unreadable: {e}"),
        }
        match dataset.complete_pairs() {
            Ok(pairs) => println!("Complete pairs on disk: {}", pairs.len()),
            Err(e) => println!("Could not scan dataset: {e}"),
        }
    }

    fn save(&mut self) {
        self.settings.timing = *self.controller.store().timing();
        match save_settings(&self.settings_path, &self.settings) {
            Ok(()) => println!("Saved settings to {}.", self.settings_path.display()),
            Err(e) => println!("Could not save settings: {e}"),
        }
    }

    fn prompt(&self) {
        print!("> ");
        let _ = std::io::stdout().flush();
    }

    /// Cancel any active run and wait for the worker to finish its iteration.
    fn shutdown(&mut self) {
        if self.controller.is_running() {
            self.controller.cancel();
            println!("Waiting for the current iteration to finish...");
        }
        if let Some(outcome) = self.controller.finish() {
            self.end_readout();
            info!(state = ?outcome.state, completed = outcome.completed, "run closed on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnacap_core::{
        ClickInjector, ClipboardSource, ConfigStore, CoreResult, Dataset, Devices, Point,
        PointerSource, Region, RgbaImage, ScreenCapturer, Sleeper,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct BlankScreen;

    impl ScreenCapturer for BlankScreen {
        fn capture(&self, region: &Region) -> CoreResult<RgbaImage> {
            Ok(RgbaImage::new(region.width(), region.height()))
        }
    }

    struct StillInput;

    impl ClickInjector for StillInput {
        fn click(&self, _point: Point) -> CoreResult<()> {
            Ok(())
        }
    }

    impl PointerSource for StillInput {
        fn position(&self) -> CoreResult<Point> {
            Ok(Point::new(0, 0))
        }
    }

    struct FixedText;

    impl ClipboardSource for FixedText {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn read_text(&self) -> Result<String, String> {
            Ok("dna".into())
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    fn console_fed(dataset: &Dataset, script: &[&str]) -> Console {
        let input = Arc::new(StillInput);
        let devices = Devices {
            screen: Arc::new(BlankScreen),
            pointer: input.clone(),
            clicker: input,
            clipboard: Arc::new(FixedText),
            clipboard_fallback: Arc::new(FixedText),
            sleeper: Arc::new(NoSleep),
        };
        let mut controller = Controller::new(ConfigStore::default(), dataset.clone(), devices);
        let store = controller.store_mut();
        store.set_region(Region::new(0, 0, 3, 2).unwrap());
        store.set_extract_point(Point::new(1, 1));
        store.set_action_point(Point::new(2, 2));

        let (line_tx, lines) = unbounded();
        for line in script {
            line_tx.send(line.to_string()).unwrap();
        }
        drop(line_tx);
        let (_interrupt_tx, interrupts) = bounded(1);
        let settings_path = dataset.root().join("settings.yaml");
        Console::with_channels(controller, Settings::default(), settings_path, lines, interrupts)
    }

    #[test]
    fn test_closed_input_lets_run_finish() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::in_workdir(dir.path());
        dataset.ensure().unwrap();

        console_fed(&dataset, &["start 250"]).run().unwrap();

        assert_eq!(dataset.complete_pairs().unwrap(), (1..=250).collect::<Vec<_>>());
        assert_eq!(dataset.read_checkpoint().unwrap().map(|c| c.completed), Some(200));
    }

    #[test]
    fn test_quit_while_running_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::in_workdir(dir.path());
        dataset.ensure().unwrap();

        console_fed(&dataset, &["start 100000", "quit"]).run().unwrap();

        let pairs = dataset.complete_pairs().unwrap();
        assert!(pairs.len() < 100000);
        assert_eq!(pairs, (1..=pairs.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("".parse::<Command>(), Ok(Command::Empty));
        assert_eq!("  Region ".parse::<Command>(), Ok(Command::Region));
        assert_eq!("timing".parse::<Command>(), Ok(Command::ShowTiming));
        assert_eq!("timing SLOW".parse::<Command>(), Ok(Command::Preset(TimingPreset::Slow)));
        assert_eq!(
            "timing 0.1 0.3 0.05 0.15".parse::<Command>(),
            Ok(Command::SetTiming(["0.1", "0.3", "0.05", "0.15"].map(String::from)))
        );
        assert_eq!("start".parse::<Command>(), Ok(Command::Start(None)));
        assert_eq!("start 37".parse::<Command>(), Ok(Command::Start(Some(37))));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("start 0".parse::<Command>().is_err());
        assert!("start many".parse::<Command>().is_err());
        assert!("timing turbo".parse::<Command>().is_err());
        assert!("timing 1 2".parse::<Command>().is_err());
        assert!("stop now".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(progress_line(0, 1000), "progress: 0/1000 (0.0%)");
        assert_eq!(progress_line(37, 1000), "progress: 37/1000 (3.7%)");
        assert_eq!(progress_line(2, 3), "progress: 2/3 (66.7%)");
        assert_eq!(progress_line(0, 0), "progress: 0/0 (0.0%)");
    }
}
