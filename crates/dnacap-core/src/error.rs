//! Error types shared by the core crate.

use crate::timing::TimingField;
use thiserror::Error;

/// A piece of configuration that must be calibrated before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigItem {
    Region,
    ExtractPoint,
    ActionPoint,
}

impl std::fmt::Display for ConfigItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConfigItem::Region => "capture region",
            ConfigItem::ExtractPoint => "extract trigger point",
            ConfigItem::ActionPoint => "action trigger point",
        };
        f.write_str(name)
    }
}

/// Rejected user input. Recovered locally; never aborts a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is not a valid number: {value:?}")]
    NotANumber { field: TimingField, value: String },
    #[error("{field} must be a finite number")]
    NotFinite { field: TimingField },
    #[error("{field} must be greater than 0 (got {value})")]
    NonPositive { field: TimingField, value: f64 },
    #[error("random delay minimum ({min}) must be less than maximum ({max})")]
    InvertedRange { min: f64, max: f64 },
    #[error("iteration count must be a positive integer (got {0:?})")]
    InvalidCount(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} is not configured")]
    NotConfigured(ConfigItem),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("region has zero area ({width}x{height})")]
    DegenerateRegion { width: u32, height: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("screen capture failed: {0}")]
    Capture(String),
    #[error("input injection failed: {0}")]
    Injection(String),
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("aborted")]
    Aborted,
    #[error("settings error: {0}")]
    Settings(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
