//! Core domain types and port definitions for voicesync.
//!
//! This crate has no adapter dependencies: the orchestrator in
//! `voicesync-playback` and any presentation layer build on the types here.
//!
//! - [`session`]: session state machine labels, ids and snapshots
//! - [`events`]: events emitted to the presentation layer
//! - [`error`]: the playback error taxonomy
//! - [`ports`]: synthesis and media traits
//! - [`settings`]: configuration and validation

pub mod error;
pub mod events;
pub mod ports;
pub mod session;
pub mod settings;

// Re-export commonly used types for convenience
pub use error::{PlaybackError, PlaybackErrorKind};
pub use events::PlaybackEvent;
pub use ports::{
    DEFAULT_AUDIO_CONTENT_TYPE, MediaBackend, MediaHandle, MediaSignal, MediaSignalSink,
    MediaSource, SynthesisPort, SynthesizedAudio,
};
pub use session::{PlaybackSnapshot, SessionId, SessionState, progress_fraction};
pub use settings::{
    DEFAULT_PROGRESS_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SYNTHESIS_URL,
    RATE_RANGE, Settings, SettingsError, SettingsUpdate, clamp_rate, clamp_volume,
    validate_settings,
};
