//! Settings domain types and validation.
//!
//! These are pure domain types with no infrastructure dependencies. The CLI
//! fills them from `.env` / environment / command-line arguments; the
//! playback crate reads the effective values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Synthesis endpoint used when none is configured.
pub const DEFAULT_SYNTHESIS_URL: &str = "http://localhost:8000/tts";

/// Default synthesis request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default progress sampling cadence in milliseconds.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 200;

/// Valid playback rate range.
pub const RATE_RANGE: (f32, f32) = (0.5, 2.0);

/// Playback settings.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// URL of the synthesis endpoint (`POST`, JSON `{ "text": … }`).
    pub synthesis_url: Option<String>,

    /// Timeout for a single synthesis request, in seconds (1–600).
    pub request_timeout_secs: Option<u64>,

    /// Progress sampling cadence while playing, in milliseconds (20–5000).
    pub progress_interval_ms: Option<u64>,

    /// Output volume (0.0–1.0).
    pub volume: Option<f32>,

    /// Playback rate multiplier (0.5–2.0).
    pub rate: Option<f32>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            synthesis_url: None,
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            progress_interval_ms: Some(DEFAULT_PROGRESS_INTERVAL_MS),
            volume: Some(1.0),
            rate: Some(1.0),
        }
    }

    /// Effective synthesis endpoint (with default fallback).
    #[must_use]
    pub fn effective_synthesis_url(&self) -> &str {
        self.synthesis_url
            .as_deref()
            .unwrap_or(DEFAULT_SYNTHESIS_URL)
    }

    /// Effective request timeout.
    #[must_use]
    pub const fn effective_request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Effective progress sampling cadence.
    #[must_use]
    pub const fn effective_progress_interval(&self) -> Duration {
        match self.progress_interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_PROGRESS_INTERVAL_MS),
        }
    }

    /// Effective volume, clamped to `[0, 1]`.
    #[must_use]
    pub fn effective_volume(&self) -> f32 {
        clamp_volume(self.volume.unwrap_or(1.0))
    }

    /// Effective playback rate, clamped to [`RATE_RANGE`].
    #[must_use]
    pub fn effective_rate(&self) -> f32 {
        clamp_rate(self.rate.unwrap_or(1.0))
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref url) = other.synthesis_url {
            self.synthesis_url.clone_from(url);
        }
        if let Some(timeout) = other.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(interval) = other.progress_interval_ms {
            self.progress_interval_ms = interval;
        }
        if let Some(volume) = other.volume {
            self.volume = volume;
        }
        if let Some(rate) = other.rate {
            self.rate = rate;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub synthesis_url: Option<Option<String>>,
    pub request_timeout_secs: Option<Option<u64>>,
    pub progress_interval_ms: Option<Option<u64>>,
    pub volume: Option<Option<f32>>,
    pub rate: Option<Option<f32>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Synthesis URL must start with http:// or https://, got '{0}'")]
    InvalidSynthesisUrl(String),

    #[error("Request timeout must be between 1 and 600 seconds, got {0}")]
    InvalidRequestTimeout(u64),

    #[error("Progress interval must be between 20 and 5000 ms, got {0}")]
    InvalidProgressInterval(u64),

    #[error("Volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("Rate must be between 0.5 and 2.0, got {0}")]
    InvalidRate(f32),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(ref url) = settings.synthesis_url {
        let trimmed = url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(SettingsError::InvalidSynthesisUrl(url.clone()));
        }
    }

    if let Some(timeout) = settings.request_timeout_secs {
        if !(1..=600).contains(&timeout) {
            return Err(SettingsError::InvalidRequestTimeout(timeout));
        }
    }

    if let Some(interval) = settings.progress_interval_ms {
        if !(20..=5000).contains(&interval) {
            return Err(SettingsError::InvalidProgressInterval(interval));
        }
    }

    if let Some(volume) = settings.volume {
        if !(0.0..=1.0).contains(&volume) {
            return Err(SettingsError::InvalidVolume(volume));
        }
    }

    if let Some(rate) = settings.rate {
        if !(RATE_RANGE.0..=RATE_RANGE.1).contains(&rate) {
            return Err(SettingsError::InvalidRate(rate));
        }
    }

    Ok(())
}

/// Clamp a volume into `[0, 1]`. NaN maps to full volume.
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() { 1.0 } else { volume.clamp(0.0, 1.0) }
}

/// Clamp a rate into [`RATE_RANGE`]. NaN maps to normal speed.
#[must_use]
pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        1.0
    } else {
        rate.clamp(RATE_RANGE.0, RATE_RANGE.1)
    }
}
