mod console;
mod logging;
mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use dnacap_core::{
    default_settings_path, load_settings, ConfigStore, Controller, Dataset, TimingPreset,
};
use std::path::PathBuf;
use tracing::info;

/// Capture a screen region, copy clipboard text and click through a UI, N times.
#[derive(Debug, Parser)]
#[command(name = "dnacap", version, about)]
struct Args {
    /// Directory the dataset folder is created in (defaults to settings, then cwd).
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Settings file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default iteration count for `start`.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    count: Option<u32>,

    /// Start with a timing preset instead of the saved timing.
    #[arg(long, value_parser = parse_preset)]
    preset: Option<TimingPreset>,

    /// Log clicks instead of injecting them.
    #[arg(long)]
    dry_run: bool,

    /// Console log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_preset(s: &str) -> Result<TimingPreset, String> {
    s.parse()
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup(args.verbose);

    let settings_path = args.config.clone().unwrap_or_else(default_settings_path);
    let mut settings = load_settings(&settings_path);
    if let Some(count) = args.count {
        settings.default_count = count;
    }

    let mut store = ConfigStore::new(settings.timing);
    if let Some(preset) = args.preset {
        let mut draft = store.draft();
        draft.apply_preset(preset);
        store.apply_draft(&draft).context("applying timing preset")?;
    }

    let workdir = match args.workdir.clone().or_else(|| settings.workdir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolving working directory")?,
    };
    let dataset = Dataset::in_workdir(&workdir);
    dataset
        .ensure()
        .with_context(|| format!("creating dataset under {}", workdir.display()))?;
    info!(root = ?dataset.root(), dry_run = args.dry_run, "dataset ready");

    let devices = dnacap_platform::default_devices(args.dry_run)
        .context("initializing input and capture devices")?;
    let controller = Controller::new(store, dataset, devices);

    console::Console::new(controller, settings, settings_path)?.run()
}
