//! Playback orchestration for voicesync.
//!
//! [`PlaybackOrchestrator`] drives one text → speech → playback session at
//! a time against two ports from `voicesync-core`:
//!
//! - [`HttpSynthesisClient`] implements `SynthesisPort` over reqwest.
//! - [`LocalMediaBackend`] implements `MediaBackend` with rodio sinks; the
//!   output stream lives on a dedicated audio thread.
//!
//! Synthesized audio is parked in a [`BlobStore`] under a revocable URL for
//! as long as it backs a media handle.

pub mod audio_local;
pub mod audio_thread;
pub mod blob;
pub mod orchestrator;
pub mod playback;
pub mod sampler;
pub mod synthesis;

// Re-export key types for convenience
pub use audio_local::{LocalMediaBackend, LocalMediaHandle};
pub use blob::{Blob, BlobStore, BlobUrl};
pub use orchestrator::PlaybackOrchestrator;
pub use sampler::ProgressSampler;
pub use synthesis::HttpSynthesisClient;
