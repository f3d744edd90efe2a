//! Playback session domain types.
//!
//! A session is one text → speech → playback cycle. These types are shared
//! between the orchestrator (which owns the live session) and the
//! presentation layer (which only ever sees [`PlaybackSnapshot`]s).
//!
//! ```text
//!   Idle → Requesting → Playing ⇄ Paused
//!    ▲         │           │  │      │
//!    │         ▼           │  ▼      ▼
//!    ├──── Failed          │  Stopped
//!    └─────────────────────┴────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Session state machine ──────────────────────────────────────────

/// Lifecycle state of the playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session is live; a fresh `speak` is possible.
    #[default]
    Idle,

    /// The synthesis request is outstanding.
    Requesting,

    /// Audio is playing.
    Playing,

    /// Audio is loaded but paused in place.
    Paused,

    /// Playback was stopped by the user (transient, settles to `Idle`).
    Stopped,

    /// Synthesis failed (transient, settles to `Idle`).
    Failed,
}

impl SessionState {
    /// Whether a session is in flight (request outstanding or audio loaded).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Requesting | Self::Playing | Self::Paused)
    }

    /// Whether the session currently owns a loaded media handle.
    #[must_use]
    pub const fn holds_audio(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Wire label, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    /// Human-readable status label for a status indicator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Requesting => "Synthesizing",
            Self::Playing => "Speaking",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Session identity ───────────────────────────────────────────────

/// Monotonically increasing session generation.
///
/// Every asynchronous callback (synthesis result, media signal, progress
/// tick) carries the id of the session it was issued for. A callback whose
/// id no longer matches the live session is stale and must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw generation number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The generation following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw generation number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Snapshot ───────────────────────────────────────────────────────

/// What the presentation layer sees: state plus progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// Current session state.
    pub state: SessionState,

    /// Playback progress in `[0, 1]`. Zero outside `Playing`/`Paused`.
    pub progress: f32,
}

impl PlaybackSnapshot {
    /// Snapshot of an idle orchestrator.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            progress: 0.0,
        }
    }

    /// Progress as a whole percentage (0–100), for display.
    #[must_use]
    pub fn percent(&self) -> u8 {
        // Clamped to [0, 100] before the cast.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8;
        pct
    }
}

/// Clamp a raw position/duration ratio into `[0, 1]`.
///
/// Returns `None` when the duration is unknown or zero, in which case the
/// previous progress value should be kept.
#[must_use]
pub fn progress_fraction(position_secs: f64, duration_secs: Option<f64>) -> Option<f32> {
    let duration = duration_secs.filter(|d| d.is_finite() && *d > 0.0)?;
    if !position_secs.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let fraction = (position_secs / duration).clamp(0.0, 1.0) as f32;
    Some(fraction)
}
