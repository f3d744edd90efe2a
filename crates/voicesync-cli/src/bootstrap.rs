//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Synthesis client (reqwest, via voicesync-playback)
//! - Media backend (rodio audio thread, via voicesync-playback)
//! - Blob store and the playback orchestrator
//!
//! Command handlers receive the composed [`CliContext`].

use std::sync::Arc;

use tokio::sync::mpsc;

use voicesync_core::{PlaybackEvent, Settings, validate_settings};
use voicesync_playback::{BlobStore, HttpSynthesisClient, LocalMediaBackend, PlaybackOrchestrator};

use crate::error::CliError;

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// Handle to the running orchestrator.
    pub orchestrator: PlaybackOrchestrator,
    /// Orchestrator events, consumed by the presentation layer.
    pub events: mpsc::UnboundedReceiver<PlaybackEvent>,
    /// Effective settings.
    pub settings: Settings,
}

/// Validate settings and compose the orchestrator.
///
/// Fails early on invalid settings or a missing output device, before any
/// text is sent for synthesis.
pub fn bootstrap(settings: Settings) -> Result<CliContext, CliError> {
    validate_settings(&settings)?;

    let synthesis = HttpSynthesisClient::from_settings(&settings)?;
    let media = LocalMediaBackend::open()?;

    tracing::debug!(
        endpoint = %synthesis.endpoint(),
        timeout = ?settings.effective_request_timeout(),
        "Bootstrapped voicesync"
    );

    let (orchestrator, events) = PlaybackOrchestrator::new(
        Arc::new(synthesis),
        Arc::new(media),
        BlobStore::new(),
        &settings,
    );

    Ok(CliContext {
        orchestrator,
        events,
        settings,
    })
}
