//! Timing parameters: settle delays, inter-iteration jitter and presets.

use crate::ValidationError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// One of the four timing fields, used in validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingField {
    ClipboardDelay,
    UiUpdateDelay,
    RandomDelayMin,
    RandomDelayMax,
}

impl TimingField {
    pub const ALL: [TimingField; 4] = [
        TimingField::ClipboardDelay,
        TimingField::UiUpdateDelay,
        TimingField::RandomDelayMin,
        TimingField::RandomDelayMax,
    ];
}

impl std::fmt::Display for TimingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TimingField::ClipboardDelay => "clipboard delay",
            TimingField::UiUpdateDelay => "UI update delay",
            TimingField::RandomDelayMin => "random delay minimum",
            TimingField::RandomDelayMax => "random delay maximum",
        };
        f.write_str(name)
    }
}

/// Validated timing values, in seconds.
///
/// All four values are finite and positive, and `random_delay_min < random_delay_max`.
/// Fields are private so the only way in is through [`TimingConfig::new`] (or
/// deserialization followed by [`TimingConfig::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    clipboard_delay: f64,
    ui_update_delay: f64,
    random_delay_min: f64,
    random_delay_max: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clipboard_delay: 0.2,
            ui_update_delay: 0.2,
            random_delay_min: 0.1,
            random_delay_max: 0.2,
        }
    }
}

impl TimingConfig {
    pub fn new(
        clipboard_delay: f64,
        ui_update_delay: f64,
        random_delay_min: f64,
        random_delay_max: f64,
    ) -> Result<Self, ValidationError> {
        let config = Self { clipboard_delay, ui_update_delay, random_delay_min, random_delay_max };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in TimingField::ALL.into_iter().zip(self.as_array()) {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
            if value <= 0.0 {
                return Err(ValidationError::NonPositive { field, value });
            }
        }
        if self.random_delay_min >= self.random_delay_max {
            return Err(ValidationError::InvertedRange {
                min: self.random_delay_min,
                max: self.random_delay_max,
            });
        }
        Ok(())
    }

    /// Values in field order: clipboard, UI update, random min, random max.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.clipboard_delay,
            self.ui_update_delay,
            self.random_delay_min,
            self.random_delay_max,
        ]
    }

    pub fn clipboard_delay(&self) -> Duration {
        Duration::from_secs_f64(self.clipboard_delay)
    }

    pub fn ui_update_delay(&self) -> Duration {
        Duration::from_secs_f64(self.ui_update_delay)
    }

    pub fn random_delay_range(&self) -> (f64, f64) {
        (self.random_delay_min, self.random_delay_max)
    }

    /// Draw an inter-iteration delay uniformly from `[min, max)`.
    pub fn sample_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs_f64(rng.gen_range(self.random_delay_min..self.random_delay_max))
    }
}

impl std::fmt::Display for TimingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "clipboard {}s, UI update {}s, random delay {}s..{}s",
            self.clipboard_delay, self.ui_update_delay, self.random_delay_min, self.random_delay_max
        )
    }
}

/// Fixed timing presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingPreset {
    Fast,
    Normal,
    Slow,
}

impl TimingPreset {
    pub const ALL: [TimingPreset; 3] = [TimingPreset::Fast, TimingPreset::Normal, TimingPreset::Slow];

    /// Literal field texts, as they are placed into a [`TimingDraft`].
    pub fn fields(self) -> [&'static str; 4] {
        match self {
            TimingPreset::Fast => ["0.1", "0.2", "0.05", "0.15"],
            TimingPreset::Normal => ["0.2", "0.3", "0.1", "0.3"],
            TimingPreset::Slow => ["0.5", "1.0", "0.5", "1.5"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimingPreset::Fast => "fast",
            TimingPreset::Normal => "normal",
            TimingPreset::Slow => "slow",
        }
    }
}

impl FromStr for TimingPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(TimingPreset::Fast),
            "normal" => Ok(TimingPreset::Normal),
            "slow" => Ok(TimingPreset::Slow),
            other => Err(format!("unknown preset {other:?} (expected fast, normal or slow)")),
        }
    }
}

/// Pending edit buffer for the four timing fields.
///
/// Edits and presets only touch the text; nothing is committed until the
/// draft is parsed and applied to a [`ConfigStore`](crate::ConfigStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingDraft {
    fields: [String; 4],
}

impl TimingDraft {
    pub fn from_config(config: &TimingConfig) -> Self {
        Self { fields: config.as_array().map(|v| v.to_string()) }
    }

    pub fn from_texts(texts: [&str; 4]) -> Self {
        Self { fields: texts.map(str::to_string) }
    }

    pub fn apply_preset(&mut self, preset: TimingPreset) {
        self.fields = preset.fields().map(str::to_string);
    }

    pub fn set(&mut self, field: TimingField, text: impl Into<String>) {
        self.fields[field_slot(field)] = text.into();
    }

    pub fn get(&self, field: TimingField) -> &str {
        &self.fields[field_slot(field)]
    }

    /// Parse the four texts into numbers. Range checks happen in
    /// [`TimingConfig::new`].
    pub fn parse(&self) -> Result<[f64; 4], ValidationError> {
        let mut values = [0.0; 4];
        for (slot, field) in TimingField::ALL.into_iter().enumerate() {
            let text = self.fields[slot].trim();
            values[slot] = text.parse::<f64>().map_err(|_| ValidationError::NotANumber {
                field,
                value: text.to_string(),
            })?;
        }
        Ok(values)
    }
}

fn field_slot(field: TimingField) -> usize {
    match field {
        TimingField::ClipboardDelay => 0,
        TimingField::UiUpdateDelay => 1,
        TimingField::RandomDelayMin => 2,
        TimingField::RandomDelayMax => 3,
    }
}
