//! dnacap-core: calibration, capture cycle and scheduling primitives.
//!
//! Design goal: keep this crate UI-agnostic and platform-agnostic.
//! OS I/O (screenshot, click injection, pointer sampling, clipboard) lives in
//! `dnacap-platform` behind the traits in [`device`](crate::Devices).

mod calibrator;
mod clipboard;
mod config;
mod controller;
mod dataset;
mod device;
mod engine;
mod error;
mod settings;
mod timing;
mod units;

#[cfg(test)]
mod testing;

pub use calibrator::{Calibrator, Prompter};
pub use clipboard::ClipboardRead;
pub use config::{ConfigSnapshot, ConfigStore};
pub use controller::{parse_count, Controller};
pub use dataset::{
    Checkpoint, Dataset, CHECKPOINT_EVERY, CHECKPOINT_FILE_NAME, DATASET_DIR_NAME, IMAGE_DIR_NAME,
    TEXT_DIR_NAME, VERIFICATION_IMAGE_NAME,
};
pub use device::{
    ClickInjector, ClipboardSource, Devices, PointerSource, ScreenCapturer, Sleeper, ThreadSleeper,
};
pub use engine::{
    EngineEvent, EngineState, Harvester, RunHandle, RunOutcome, PROGRESS_REFRESH_EVERY,
};
pub use error::{ConfigItem, CoreError, CoreResult, ValidationError};
pub use image::RgbaImage;
pub use settings::{
    default_settings_path, get_app_data_dir, get_log_dir, load_settings, save_settings, Settings,
};
pub use timing::{TimingConfig, TimingDraft, TimingField, TimingPreset};
pub use units::{ActionTrigger, CaptureUnit, ClipboardExtractor, CycleUnits, ExtractOutcome};


/// A screen coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rectangular capture bounds.
///
/// A constructed `Region` always has a non-zero width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
}

impl Region {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::DegenerateRegion { width, height });
        }
        Ok(Self { left, top, width, height })
    }

    /// Build a region from two corner samples.
    ///
    /// The corners are normalized per axis, so the second sample may lie
    /// above or left of the first.
    pub fn from_corners(a: Point, b: Point) -> CoreResult<Self> {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        let width = a.x.abs_diff(b.x);
        let height = a.y.abs_diff(b.y);
        Self::new(left, top, width, height)
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Exclusive bottom-right corner.
    pub fn bottom_right(&self) -> Point {
        Point::new(
            self.left.saturating_add_unsigned(self.width),
            self.top.saturating_add_unsigned(self.height),
        )
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.left, self.top)
    }
}
