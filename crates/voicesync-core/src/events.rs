//! Events emitted by the playback orchestrator to the presentation layer.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag so non-Rust front ends can
//! consume them unchanged:
//!
//! ```json
//! { "type": "state_changed", "state": "playing", "progress": 0.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PlaybackErrorKind;
use crate::session::{PlaybackSnapshot, SessionState};

/// Orchestrator → presentation events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// The session moved to a new state. Carries the progress at the time
    /// of the transition so a renderer never has to combine two events.
    StateChanged(PlaybackSnapshot),

    /// Progress was re-sampled while playing.
    Progress {
        /// Fraction of the audio played, in `[0, 1]`.
        progress: f32,
    },

    /// The media layer reported that audible playback began.
    PlaybackStarted,

    /// Playback drained naturally.
    PlaybackFinished,

    /// A session failed. The orchestrator has already recovered to `Idle`.
    Error {
        /// Error class.
        kind: PlaybackErrorKind,
        /// Human-readable description.
        message: String,
    },
}

impl PlaybackEvent {
    /// Convenience constructor for a state change.
    #[must_use]
    pub const fn state_changed(state: SessionState, progress: f32) -> Self {
        Self::StateChanged(PlaybackSnapshot { state, progress })
    }

    /// The new state, if this is a state change.
    #[must_use]
    pub const fn state(&self) -> Option<SessionState> {
        match self {
            Self::StateChanged(snapshot) => Some(snapshot.state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_changed_wire_shape() {
        let event = PlaybackEvent::state_changed(SessionState::Playing, 0.0);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["state"], "playing");
        assert_eq!(json["progress"], 0.0);
    }

    #[test]
    fn error_wire_shape() {
        let event = PlaybackEvent::Error {
            kind: PlaybackErrorKind::SynthesisRequestFailed,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "synthesis_request_failed");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn state_accessor() {
        assert_eq!(
            PlaybackEvent::state_changed(SessionState::Idle, 0.0).state(),
            Some(SessionState::Idle)
        );
        assert_eq!(PlaybackEvent::PlaybackFinished.state(), None);
    }
}
