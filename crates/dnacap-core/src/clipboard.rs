//! Two-stage clipboard read.

use crate::ClipboardSource;
use tracing::{debug, warn};

/// Result of reading the clipboard through a primary and a fallback source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardRead {
    Primary(String),
    Fallback(String),
    /// Both mechanisms failed; carries both error messages.
    Failed { primary: String, fallback: String },
}

impl ClipboardRead {
    /// Try `primary`, and on failure `fallback`. Never errors.
    pub fn read(primary: &dyn ClipboardSource, fallback: &dyn ClipboardSource) -> Self {
        let primary_err = match primary.read_text() {
            Ok(text) => return ClipboardRead::Primary(text),
            Err(e) => e,
        };
        debug!(source = primary.name(), error = %primary_err, "primary clipboard read failed");

        match fallback.read_text() {
            Ok(text) => ClipboardRead::Fallback(text),
            Err(fallback_err) => {
                warn!(
                    primary = %primary_err,
                    fallback = %fallback_err,
                    "both clipboard reads failed"
                );
                ClipboardRead::Failed { primary: primary_err, fallback: fallback_err }
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ClipboardRead::Failed { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ClipboardRead::Primary(text) | ClipboardRead::Fallback(text) => Some(text),
            ClipboardRead::Failed { .. } => None,
        }
    }

    /// Text content, with a failed read degraded to an empty string.
    pub fn into_text_or_empty(self) -> String {
        match self {
            ClipboardRead::Primary(text) | ClipboardRead::Fallback(text) => text,
            ClipboardRead::Failed { .. } => String::new(),
        }
    }
}
