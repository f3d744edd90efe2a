//! Port definitions (trait abstractions) for external collaborators.
//!
//! The orchestrator depends only on these traits; concrete adapters live in
//! `voicesync-playback` (reqwest synthesis client, rodio media backend) and
//! in test code (mocks).

pub mod media;
pub mod synthesis;

pub use media::{MediaBackend, MediaHandle, MediaSignal, MediaSignalSink, MediaSource};
pub use synthesis::{DEFAULT_AUDIO_CONTENT_TYPE, SynthesisPort, SynthesizedAudio};
