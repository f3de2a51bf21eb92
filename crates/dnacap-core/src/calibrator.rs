//! Interactive region and control-point calibration.

use crate::{CoreError, CoreResult, Dataset, Point, PointerSource, Region, ScreenCapturer};
use tracing::{info, warn};

/// Human-facing prompts used during calibration.
///
/// Implementations block until the user responds. Returning
/// [`CoreError::Aborted`] ends the calibration flow.
pub trait Prompter {
    /// Show a message; no response needed.
    fn notify(&self, message: &str) -> CoreResult<()>;
    /// Show a message and block until the user confirms (pointer is sampled afterwards).
    fn wait_for_confirm(&self, message: &str) -> CoreResult<()>;
    fn ask_yes_no(&self, question: &str) -> CoreResult<bool>;
}

pub struct Calibrator<'a> {
    pointer: &'a dyn PointerSource,
    screen: &'a dyn ScreenCapturer,
    dataset: &'a Dataset,
    prompter: &'a dyn Prompter,
}

impl<'a> Calibrator<'a> {
    pub fn new(
        pointer: &'a dyn PointerSource,
        screen: &'a dyn ScreenCapturer,
        dataset: &'a Dataset,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self { pointer, screen, dataset, prompter }
    }

    /// Sample two corners, save a verification capture, and ask for approval.
    ///
    /// Rejected or zero-area samples are discarded and sampling starts over.
    pub fn capture_region(&self) -> CoreResult<Region> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let top_left = self.sample("Move the pointer to the TOP-LEFT corner of the capture region")?;
            let bottom_right = self.sample(&format!(
                "Top-left: {top_left}. Move the pointer to the BOTTOM-RIGHT corner of the capture region"
            ))?;

            let region = match Region::from_corners(top_left, bottom_right) {
                Ok(region) => region,
                Err(CoreError::DegenerateRegion { width, height }) => {
                    warn!(attempt, width, height, "degenerate region sampled");
                    self.prompter.notify(&format!(
                        "The region is {width}x{height}; both corners must differ. Starting over."
                    ))?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let image = self.screen.capture(&region)?;
            let path = self.dataset.verification_image_path();
            image.save(&path)?;
            info!(attempt, %region, ?path, "saved verification capture");

            self.prompter.notify(&format!("Region set to {region}."))?;
            let question = format!("Test capture saved to {}. Use this region?", path.display());
            if self.prompter.ask_yes_no(&question)? {
                return Ok(region);
            }
            info!(attempt, "region rejected, resampling");
        }
    }

    /// Sample a single control point and return it verbatim.
    pub fn capture_control_point(&self, label: &str) -> CoreResult<Point> {
        let point = self.sample(&format!("Move the pointer onto the '{label}' button"))?;
        info!(label, %point, "control point sampled");
        Ok(point)
    }

    /// Sample the extract trigger, then the action trigger.
    pub fn capture_control_points(
        &self,
        extract_label: &str,
        action_label: &str,
    ) -> CoreResult<(Point, Point)> {
        let extract = self.capture_control_point(extract_label)?;
        let action = self.capture_control_point(action_label)?;
        self.prompter.notify("Control points set.")?;
        Ok((extract, action))
    }

    fn sample(&self, message: &str) -> CoreResult<Point> {
        self.prompter.wait_for_confirm(message)?;
        self.pointer.position()
    }
}
