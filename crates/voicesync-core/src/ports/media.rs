//! Media playback port: the host's "audio element".
//!
//! A [`MediaBackend`] turns a transient resource into a [`MediaHandle`]. The
//! handle exposes the handful of controls the orchestrator needs (play,
//! pause, rewind, position, duration) and reports asynchronous signals
//! through the [`MediaSignalSink`] bound at load time.
//!
//! Handle methods run on the orchestrator's task. They take `&self` and
//! must return without waiting on the output device.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::error::PlaybackError;

/// Asynchronous notifications from the media layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSignal {
    /// Audible playback began (or resumed).
    Play,

    /// Playback drained to the end on its own.
    Ended,

    /// The media layer failed after the resource was loaded.
    Error(String),
}

/// Callback through which a loaded handle reports [`MediaSignal`]s.
///
/// Invoked from arbitrary threads; must never block.
pub type MediaSignalSink = Arc<dyn Fn(MediaSignal) + Send + Sync + 'static>;

/// A playable resource, resolved from a transient URL.
#[derive(Debug, Clone)]
pub struct MediaSource {
    /// The transient URL this resource was resolved from (for logging).
    pub url: String,

    /// Encoded audio bytes.
    pub data: Bytes,

    /// MIME type of `data`.
    pub content_type: String,
}

/// Loads playable resources.
pub trait MediaBackend: Send + Sync {
    /// Decode `source` and return a paused handle.
    ///
    /// Decode failures (corrupt or unsupported payload) are reported as
    /// [`PlaybackError::PlaybackFailed`].
    fn load(
        &self,
        source: MediaSource,
        signals: MediaSignalSink,
    ) -> Result<Box<dyn MediaHandle>, PlaybackError>;
}

/// Exclusive control over one loaded resource.
///
/// Dropping the handle must release the underlying audio output. After
/// [`unload`](Self::unload) (or drop) no further signals may be delivered.
pub trait MediaHandle: Send + Sync {
    /// Begin or resume playback.
    fn play(&self) -> Result<(), PlaybackError>;

    /// Pause in place, keeping the resource loaded.
    fn pause(&self) -> Result<(), PlaybackError>;

    /// Return to the start of the resource, keeping the play/pause state.
    fn rewind(&self) -> Result<(), PlaybackError>;

    /// Current playback position.
    fn position(&self) -> Duration;

    /// Total duration, if the decoder knows it.
    fn duration(&self) -> Option<Duration>;

    /// Set the output volume (0.0 = muted, 1.0 = full).
    fn set_volume(&self, volume: f32);

    /// Set the playback rate multiplier (1.0 = normal).
    fn set_rate(&self, rate: f32);

    /// Halt playback and free the audio output.
    fn unload(&self);
}
