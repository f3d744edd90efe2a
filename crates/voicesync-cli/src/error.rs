//! CLI-specific error types and mappings.
//!
//! Maps configuration, audio device and playback failures to exit codes
//! and user-facing messages.

use thiserror::Error;

use voicesync_core::{PlaybackError, SettingsError};

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable audio output.
    #[error("Audio device error: {0}")]
    Audio(String),

    /// A session failed (synthesis or playback).
    #[error("{0}")]
    Playback(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Playback(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Audio(_) => 69,    // EX_UNAVAILABLE
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PlaybackError> for CliError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::InvalidSettings(msg) => Self::Config(msg),
            PlaybackError::OutputStream(_) | PlaybackError::AudioThreadDied => {
                Self::Audio(err.to_string())
            }
            other => Self::Playback(other.to_string()),
        }
    }
}
