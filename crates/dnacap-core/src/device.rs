//! Traits for the OS primitives the core drives (implemented by dnacap-platform).

use crate::{CoreResult, Point, Region};
use image::RgbaImage;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Takes a screenshot of exactly the given region.
pub trait ScreenCapturer: Send + Sync {
    fn capture(&self, region: &Region) -> CoreResult<RgbaImage>;
}

/// Reads the current pointer position.
pub trait PointerSource: Send + Sync {
    fn position(&self) -> CoreResult<Point>;
}

/// Injects a left click at a screen coordinate.
pub trait ClickInjector: Send + Sync {
    fn click(&self, point: Point) -> CoreResult<()>;
}

/// One mechanism for reading clipboard text.
///
/// Failures are plain strings: the caller decides whether a miss is fatal.
pub trait ClipboardSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn read_text(&self) -> Result<String, String>;
}

/// Blocking delay. The settle delays and the jitter are the engine's only
/// intentional suspension points and all go through this.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// The set of external collaborators for a session.
#[derive(Clone)]
pub struct Devices {
    pub screen: Arc<dyn ScreenCapturer>,
    pub pointer: Arc<dyn PointerSource>,
    pub clicker: Arc<dyn ClickInjector>,
    pub clipboard: Arc<dyn ClipboardSource>,
    pub clipboard_fallback: Arc<dyn ClipboardSource>,
    pub sleeper: Arc<dyn Sleeper>,
}
