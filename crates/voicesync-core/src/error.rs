//! Playback error taxonomy.

use serde::{Deserialize, Serialize};

use crate::session::SessionState;
use crate::settings::SettingsError;

/// Errors produced by the playback orchestrator and its adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The synthesis endpoint was unreachable or answered with a
    /// non-success status.
    #[error("Speech synthesis request failed{}: {message}", status_suffix(.status))]
    SynthesisRequestFailed {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Transport or server detail.
        message: String,
    },

    /// The audio layer could not play a successfully synthesized payload.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// An operation was invoked outside its valid source state.
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        /// The rejected operation (`"pause"`, `"speak"`, …).
        operation: &'static str,
        /// State the session was in when the operation was rejected.
        state: SessionState,
    },

    /// Failed to open the audio output device.
    #[error("Failed to open audio output stream: {0}")]
    OutputStream(String),

    /// The dedicated audio thread exited unexpectedly.
    #[error("Audio thread is not running")]
    AudioThreadDied,

    /// The orchestrator task has shut down.
    #[error("Playback orchestrator is not running")]
    OrchestratorClosed,

    /// Settings were rejected before any session started.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl PlaybackError {
    /// Shorthand for an [`InvalidTransition`](Self::InvalidTransition).
    #[must_use]
    pub const fn invalid(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidTransition { operation, state }
    }

    /// Coarse classification, used for event payloads.
    #[must_use]
    pub const fn kind(&self) -> PlaybackErrorKind {
        match self {
            Self::SynthesisRequestFailed { .. } => PlaybackErrorKind::SynthesisRequestFailed,
            Self::InvalidTransition { .. } => PlaybackErrorKind::InvalidTransition,
            Self::PlaybackFailed(_)
            | Self::OutputStream(_)
            | Self::AudioThreadDied
            | Self::OrchestratorClosed
            | Self::InvalidSettings(_) => PlaybackErrorKind::PlaybackFailed,
        }
    }
}

impl From<SettingsError> for PlaybackError {
    fn from(err: SettingsError) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Serializable error class carried by error events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackErrorKind {
    SynthesisRequestFailed,
    PlaybackFailed,
    InvalidTransition,
}
