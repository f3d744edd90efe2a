//! One-shot `speak` command.

use anyhow::Result;

use voicesync_core::{PlaybackEvent, SessionState};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::StatusBar;

/// Speak `text` once and wait for the session to settle.
///
/// Ctrl-C stops playback. Returns [`CliError::Playback`] if synthesis or
/// playback failed.
pub async fn execute(ctx: CliContext, text: &str) -> Result<()> {
    let CliContext {
        orchestrator,
        mut events,
        ..
    } = ctx;

    if text.trim().is_empty() {
        return Err(CliError::Arguments("nothing to speak".to_string()).into());
    }

    let mut bar = StatusBar::new();
    orchestrator.speak(text).await.map_err(CliError::from)?;

    let mut failure = None;
    let mut interrupted = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                bar.apply(&event);
                if let PlaybackEvent::Error { message, .. } = &event {
                    failure = Some(message.clone());
                }
                if event.state() == Some(SessionState::Idle) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                tracing::debug!("Interrupted, stopping playback");
                if let Err(e) = orchestrator.stop().await {
                    tracing::debug!(error = %e, "Stop after interrupt rejected");
                }
            }
        }
    }

    orchestrator.shutdown().await.map_err(CliError::from)?;

    if let Some(message) = failure {
        bar.abandon("Failed");
        return Err(CliError::Playback(message).into());
    }
    bar.finish(if interrupted { "Stopped" } else { "Done" });
    Ok(())
}
