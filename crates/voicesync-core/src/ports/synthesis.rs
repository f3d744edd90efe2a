//! Speech synthesis port.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PlaybackError;

/// Content type assumed when the synthesis endpoint does not send one.
pub const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/wav";

/// Opaque audio payload returned by the synthesis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Encoded audio bytes (WAV, MP3, …).
    pub data: Bytes,

    /// MIME type reported by the service.
    pub content_type: String,
}

impl SynthesizedAudio {
    /// Wrap a payload with its content type.
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Remote text → audio conversion.
///
/// Implementations must be `Send + Sync`: the orchestrator runs each request
/// on its own task so the session stays responsive while the network
/// round-trip is outstanding.
///
/// Any failure (transport error, non-success status, empty payload) is
/// reported as [`PlaybackError::SynthesisRequestFailed`]. Implementations do
/// not retry.
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    /// Synthesize the full text into a single audio payload.
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, PlaybackError>;
}
