//! Screen region capture via `xcap`.

use crate::{PlatformError, PlatformResult};
use dnacap_core::{CoreResult, Region, RgbaImage, ScreenCapturer};
use image::imageops::{self, FilterType};
use tracing::debug;
use xcap::Monitor;

/// Captures the monitor containing the region's top-left corner and crops it.
pub struct XcapCapturer;

impl ScreenCapturer for XcapCapturer {
    fn capture(&self, region: &Region) -> CoreResult<RgbaImage> {
        let origin = region.top_left();
        let monitor = Monitor::from_point(origin.x, origin.y)
            .map_err(|_| PlatformError::NoMonitor { x: origin.x, y: origin.y })?;
        let capture_err = |e: xcap::XCapError| PlatformError::CaptureFailed(e.to_string());
        let mx = monitor.x().map_err(capture_err)?;
        let my = monitor.y().map_err(capture_err)?;
        let scale = monitor.scale_factor().map_err(capture_err)?;
        let frame = monitor.capture_image().map_err(capture_err)?;
        debug!(%region, monitor_x = mx, monitor_y = my, scale, "captured monitor frame");
        Ok(crop_to_monitor(&frame, mx, my, scale, region)?)
    }
}

/// Crop `region` out of a monitor frame.
///
/// `region` and the monitor origin `(mx, my)` are logical coordinates; the
/// frame is in physical pixels, `scale` physical pixels per logical one. The
/// result is always `region.width() x region.height()`.
///
/// Fails when the region does not lie entirely on the frame.
pub fn crop_to_monitor(
    frame: &RgbaImage,
    mx: i32,
    my: i32,
    scale: f32,
    region: &Region,
) -> PlatformResult<RgbaImage> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PlatformError::CaptureFailed(format!("invalid monitor scale factor {scale}")));
    }
    let out_of_bounds = || {
        PlatformError::CaptureFailed(format!(
            "region {region} exceeds monitor frame {}x{} at ({mx}, {my}), scale {scale}",
            frame.width(),
            frame.height()
        ))
    };
    let physical = |logical: f64| (logical * f64::from(scale)).round();

    let left = physical(f64::from(region.left()) - f64::from(mx));
    let top = physical(f64::from(region.top()) - f64::from(my));
    let width = physical(f64::from(region.width())).max(1.0);
    let height = physical(f64::from(region.height())).max(1.0);
    if left < 0.0
        || top < 0.0
        || left + width > f64::from(frame.width())
        || top + height > f64::from(frame.height())
    {
        return Err(out_of_bounds());
    }

    // Bounded by the frame dimensions above, so the casts are exact.
    let cropped =
        imageops::crop_imm(frame, left as u32, top as u32, width as u32, height as u32).to_image();
    if cropped.dimensions() == (region.width(), region.height()) {
        return Ok(cropped);
    }
    Ok(imageops::resize(&cropped, region.width(), region.height(), FilterType::Nearest))
}
