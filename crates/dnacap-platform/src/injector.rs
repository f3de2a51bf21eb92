//! Click injection and pointer sampling.

use crate::PlatformError;
use dnacap_core::{ClickInjector, CoreResult, Point, PointerSource};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Logs clicks instead of injecting them.
pub struct NoopInjector;

impl ClickInjector for NoopInjector {
    fn click(&self, point: Point) -> CoreResult<()> {
        debug!(%point, "NoopInjector: would click");
        Ok(())
    }
}

/// Real input backend using the `enigo` crate.
pub struct EnigoInjector {
    enigo: Mutex<Enigo>,
}

impl EnigoInjector {
    pub fn new() -> Result<Self, PlatformError> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| {
            PlatformError::InjectionFailed(format!("failed to create Enigo: {e}"))
        })?;
        Ok(Self { enigo: Mutex::new(enigo) })
    }

    fn lock(&self) -> MutexGuard<'_, Enigo> {
        self.enigo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClickInjector for EnigoInjector {
    fn click(&self, point: Point) -> CoreResult<()> {
        let mut enigo = self.lock();
        debug!(%point, "injecting click");
        enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(|e| PlatformError::InjectionFailed(e.to_string()))?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| PlatformError::InjectionFailed(e.to_string()))?;
        Ok(())
    }
}

impl PointerSource for EnigoInjector {
    fn position(&self) -> CoreResult<Point> {
        let (x, y) = self
            .lock()
            .location()
            .map_err(|e| PlatformError::InjectionFailed(format!("pointer location: {e}")))?;
        Ok(Point::new(x, y))
    }
}
