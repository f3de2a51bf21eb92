//! The three per-iteration units: capture, clipboard extraction, action trigger.

use crate::{
    ClickInjector, ClipboardRead, ClipboardSource, ConfigItem, CoreError, CoreResult, Dataset,
    Devices, Point, Region, ScreenCapturer, Sleeper,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Screenshots the region and saves it under the iteration's file name.
pub struct CaptureUnit {
    screen: Arc<dyn ScreenCapturer>,
    dataset: Dataset,
}

impl CaptureUnit {
    pub fn new(screen: Arc<dyn ScreenCapturer>, dataset: Dataset) -> Self {
        Self { screen, dataset }
    }

    /// Capture `region` into `face_{index:04}.png` and return the file name.
    pub fn capture(&self, region: Option<Region>, index: u32) -> CoreResult<String> {
        let region = region.ok_or(CoreError::NotConfigured(ConfigItem::Region))?;
        let image = self.screen.capture(&region)?;

        let file_name = Dataset::image_file_name(index);
        let path = self.dataset.image_path(&file_name);
        image.save(&path)?;
        debug!(index, ?path, width = image.width(), height = image.height(), "saved capture");

        Ok(file_name)
    }
}

/// What an extraction wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutcome {
    pub text_path: PathBuf,
    /// True when both clipboard reads failed and an empty text was written.
    pub degraded: bool,
}

/// Clicks the extract trigger, waits, reads the clipboard and writes the paired text.
pub struct ClipboardExtractor {
    clicker: Arc<dyn ClickInjector>,
    primary: Arc<dyn ClipboardSource>,
    fallback: Arc<dyn ClipboardSource>,
    sleeper: Arc<dyn Sleeper>,
    dataset: Dataset,
}

impl ClipboardExtractor {
    pub fn new(
        clicker: Arc<dyn ClickInjector>,
        primary: Arc<dyn ClipboardSource>,
        fallback: Arc<dyn ClipboardSource>,
        sleeper: Arc<dyn Sleeper>,
        dataset: Dataset,
    ) -> Self {
        Self { clicker, primary, fallback, sleeper, dataset }
    }

    pub fn extract(
        &self,
        trigger: Option<Point>,
        clipboard_delay: Duration,
        image_file_name: &str,
    ) -> CoreResult<ExtractOutcome> {
        let trigger = trigger.ok_or(CoreError::NotConfigured(ConfigItem::ExtractPoint))?;

        self.clicker.click(trigger)?;
        self.sleeper.sleep(clipboard_delay);

        let read = ClipboardRead::read(self.primary.as_ref(), self.fallback.as_ref());
        let degraded = read.is_failed();
        if degraded {
            warn!(image = image_file_name, "clipboard unreadable, writing empty text");
        }

        let text_path = self.dataset.write_text(image_file_name, &read.into_text_or_empty())?;
        Ok(ExtractOutcome { text_path, degraded })
    }
}

/// Clicks the action trigger and waits for the target UI to update.
pub struct ActionTrigger {
    clicker: Arc<dyn ClickInjector>,
    sleeper: Arc<dyn Sleeper>,
}

impl ActionTrigger {
    pub fn new(clicker: Arc<dyn ClickInjector>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { clicker, sleeper }
    }

    pub fn trigger(&self, point: Option<Point>, ui_update_delay: Duration) -> CoreResult<()> {
        let point = point.ok_or(CoreError::NotConfigured(ConfigItem::ActionPoint))?;
        self.clicker.click(point)?;
        self.sleeper.sleep(ui_update_delay);
        Ok(())
    }
}

/// Everything one worker needs to run iterations.
pub struct CycleUnits {
    pub capture: CaptureUnit,
    pub extractor: ClipboardExtractor,
    pub trigger: ActionTrigger,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) dataset: Dataset,
}

impl CycleUnits {
    pub fn new(devices: &Devices, dataset: Dataset) -> Self {
        Self {
            capture: CaptureUnit::new(devices.screen.clone(), dataset.clone()),
            extractor: ClipboardExtractor::new(
                devices.clicker.clone(),
                devices.clipboard.clone(),
                devices.clipboard_fallback.clone(),
                devices.sleeper.clone(),
                dataset.clone(),
            ),
            trigger: ActionTrigger::new(devices.clicker.clone(), devices.sleeper.clone()),
            sleeper: devices.sleeper.clone(),
            dataset,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClipboard, FakeInput, FakeScreen, RecordingSleeper, Rig};
    use std::fs;

    #[test]
    fn test_capture_writes_region_sized_png() {
        let rig = Rig::new();
        let units = rig.units();
        let region = Region::new(30, 40, 120, 80).unwrap();

        let name = units.capture.capture(Some(region), 7).unwrap();
        assert_eq!(name, "face_0007.png");

        let path = rig.dataset.image_path(&name);
        assert_eq!(image::image_dimensions(&path).unwrap(), (120, 80));
        assert_eq!(rig.screen.captured_regions(), vec![region]);
    }

    #[test]
    fn test_capture_requires_region() {
        let rig = Rig::new();
        let err = rig.units().capture.capture(None, 1).unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured(ConfigItem::Region)));
        assert!(rig.screen.captured_regions().is_empty());
    }

    #[test]
    fn test_capture_failure_propagates() {
        let rig = Rig::with(FakeScreen::failing_at(1), FakeInput::new());
        let region = Region::new(0, 0, 4, 4).unwrap();
        let err = rig.units().capture.capture(Some(region), 1).unwrap_err();
        assert!(matches!(err, CoreError::Capture(_)));
        assert!(!rig.dataset.image_path("face_0001.png").exists());
    }

    #[test]
    fn test_extract_clicks_waits_and_writes_text() {
        let rig = Rig::new();
        let units = rig.units();
        let point = Point::new(900, 100);

        let outcome = units
            .extractor
            .extract(Some(point), Duration::from_millis(200), "face_0003.png")
            .unwrap();

        assert!(!outcome.degraded);
        assert_eq!(outcome.text_path, rig.dataset.text_path_for("face_0003.png"));
        assert_eq!(fs::read_to_string(&outcome.text_path).unwrap(), "dna-1");
        assert_eq!(rig.input.clicks(), vec![point]);
        assert_eq!(rig.sleeper.durations(), vec![Duration::from_millis(200)]);
    }

    #[test]
    fn test_extract_degrades_to_empty_text() {
        let rig = Rig::new()
            .with_clipboard(FakeClipboard::failing("busy"), FakeClipboard::failing("missing"));
        let outcome = rig
            .units()
            .extractor
            .extract(Some(Point::new(1, 1)), Duration::ZERO, "face_0001.png")
            .unwrap();

        assert!(outcome.degraded);
        assert_eq!(fs::read_to_string(&outcome.text_path).unwrap(), "");
    }

    #[test]
    fn test_extract_text_write_failure_is_fatal() {
        let rig = Rig::new();
        fs::remove_dir_all(rig.dataset.text_dir()).unwrap();
        let err = rig
            .units()
            .extractor
            .extract(Some(Point::new(1, 1)), Duration::ZERO, "face_0001.png")
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn test_extract_requires_point() {
        let rig = Rig::new();
        let err = rig.units().extractor.extract(None, Duration::ZERO, "face_0001.png").unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured(ConfigItem::ExtractPoint)));
        assert!(rig.input.clicks().is_empty());
    }

    #[test]
    fn test_trigger_clicks_then_waits() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let input = Arc::new(FakeInput::new());
        let trigger = ActionTrigger::new(input.clone(), sleeper.clone());

        trigger.trigger(Some(Point::new(5, 6)), Duration::from_millis(300)).unwrap();
        assert_eq!(input.clicks(), vec![Point::new(5, 6)]);
        assert_eq!(sleeper.durations(), vec![Duration::from_millis(300)]);

        let err = trigger.trigger(None, Duration::ZERO).unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured(ConfigItem::ActionPoint)));
    }

    #[test]
    fn test_trigger_injection_failure_skips_wait() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let input = Arc::new(FakeInput::failing_at(1));
        let trigger = ActionTrigger::new(input, sleeper.clone());

        let err = trigger.trigger(Some(Point::new(5, 6)), Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, CoreError::Injection(_)));
        assert!(sleeper.durations().is_empty());
    }
}
