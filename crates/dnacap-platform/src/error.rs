//! Common error types for dnacap-platform.

use dnacap_core::CoreError;
use thiserror::Error;

/// Platform-level errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("injection failed: {0}")]
    InjectionFailed(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("no monitor contains ({x}, {y})")]
    NoMonitor { x: i32, y: i32 },
    #[error("clipboard read failed: {0}")]
    ClipboardFailed(String),
    #[error("`{program}` failed: {message}")]
    CommandFailed { program: String, message: String },
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

impl From<PlatformError> for CoreError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::InjectionFailed(_) => CoreError::Injection(e.to_string()),
            _ => CoreError::Capture(e.to_string()),
        }
    }
}
