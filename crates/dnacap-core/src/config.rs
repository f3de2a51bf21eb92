//! Configuration store: calibration results and timing.

use crate::{ConfigItem, CoreError, CoreResult, Point, Region, TimingConfig, TimingDraft};
use crate::ValidationError;
use tracing::info;

/// Session configuration. Calibration is held in memory only.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    region: Option<Region>,
    extract_point: Option<Point>,
    action_point: Option<Point>,
    timing: TimingConfig,
}

impl ConfigStore {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing, ..Self::default() }
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn extract_point(&self) -> Option<Point> {
        self.extract_point
    }

    pub fn action_point(&self) -> Option<Point> {
        self.action_point
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn set_region(&mut self, region: Region) {
        info!(%region, "capture region set");
        self.region = Some(region);
    }

    pub fn set_extract_point(&mut self, point: Point) {
        info!(%point, "extract trigger point set");
        self.extract_point = Some(point);
    }

    pub fn set_action_point(&mut self, point: Point) {
        info!(%point, "action trigger point set");
        self.action_point = Some(point);
    }

    /// Replace all four timing values together, or none of them.
    pub fn update_timing(
        &mut self,
        clipboard_delay: f64,
        ui_update_delay: f64,
        random_delay_min: f64,
        random_delay_max: f64,
    ) -> Result<(), ValidationError> {
        let timing =
            TimingConfig::new(clipboard_delay, ui_update_delay, random_delay_min, random_delay_max)?;
        info!(%timing, "timing updated");
        self.timing = timing;
        Ok(())
    }

    /// Parse and commit a pending edit buffer.
    pub fn apply_draft(&mut self, draft: &TimingDraft) -> Result<(), ValidationError> {
        let [c, u, min, max] = draft.parse()?;
        self.update_timing(c, u, min, max)
    }

    /// Start a new edit buffer from the committed values.
    pub fn draft(&self) -> TimingDraft {
        TimingDraft::from_config(&self.timing)
    }

    pub fn missing_items(&self) -> Vec<ConfigItem> {
        self.snapshot().missing_items()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            region: self.region,
            extract_point: self.extract_point,
            action_point: self.action_point,
            timing: self.timing,
        }
    }
}

/// Immutable copy of the configuration, moved into a run's worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSnapshot {
    region: Option<Region>,
    extract_point: Option<Point>,
    action_point: Option<Point>,
    timing: TimingConfig,
}

impl ConfigSnapshot {
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn extract_point(&self) -> Option<Point> {
        self.extract_point
    }

    pub fn action_point(&self) -> Option<Point> {
        self.action_point
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn missing_items(&self) -> Vec<ConfigItem> {
        let mut missing = Vec::new();
        if self.region.is_none() {
            missing.push(ConfigItem::Region);
        }
        if self.extract_point.is_none() {
            missing.push(ConfigItem::ExtractPoint);
        }
        if self.action_point.is_none() {
            missing.push(ConfigItem::ActionPoint);
        }
        missing
    }

    /// Fails with the first missing item.
    pub fn ensure_ready(&self) -> CoreResult<()> {
        match self.missing_items().first() {
            Some(item) => Err(CoreError::NotConfigured(*item)),
            None => Ok(()),
        }
    }
}
