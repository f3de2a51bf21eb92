//! dnacap-platform: OS boundary for dnacap.
//!
//! This crate provides:
//! - Click injection and pointer sampling via `enigo`
//! - Screen region capture via `xcap`
//! - Clipboard text via `arboard`, with a system command fallback
//!
//! `default_devices` wires these into the core's [`Devices`] bundle.

mod clipboard;
mod error;
mod injector;
mod screen;

use dnacap_core::{Devices, ThreadSleeper};
use std::sync::Arc;
use tracing::info;

pub use clipboard::{ArboardClipboard, CommandClipboard, PasteCommand};
pub use error::{PlatformError, PlatformResult};
pub use injector::{EnigoInjector, NoopInjector};
pub use screen::{crop_to_monitor, XcapCapturer};

/// Build the device bundle for this machine.
///
/// With `dry_run` clicks are logged instead of injected. Pointer sampling
/// still goes through enigo so calibration keeps working.
pub fn default_devices(dry_run: bool) -> PlatformResult<Devices> {
    let enigo = Arc::new(EnigoInjector::new()?);
    let clicker: Arc<dyn dnacap_core::ClickInjector> = if dry_run {
        info!("dry run: clicks will not be injected");
        Arc::new(NoopInjector)
    } else {
        enigo.clone()
    };

    Ok(Devices {
        screen: Arc::new(XcapCapturer),
        pointer: enigo,
        clicker,
        clipboard: Arc::new(ArboardClipboard),
        clipboard_fallback: Arc::new(CommandClipboard::for_current_os()),
        sleeper: Arc::new(ThreadSleeper),
    })
}
