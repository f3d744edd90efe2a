//! Terminal rendering of playback state.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use voicesync_core::{PlaybackEvent, PlaybackSnapshot};

/// One-line status, e.g. `Speaking 42%` or `Ready`.
pub fn status_line(snapshot: &PlaybackSnapshot) -> String {
    let label = snapshot.state.label();
    if snapshot.state.holds_audio() {
        format!("{label} {}%", snapshot.percent())
    } else {
        label.to_string()
    }
}

/// Progress bar driven by orchestrator events.
pub(crate) struct StatusBar {
    bar: ProgressBar,
    snapshot: PlaybackSnapshot,
}

impl StatusBar {
    /// Create a bar showing 0–100 %.
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg:<12} [{bar:40.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        let snapshot = PlaybackSnapshot::idle();
        bar.set_message(snapshot.state.label());
        Self { bar, snapshot }
    }

    /// Fold an event into the displayed state.
    pub(crate) fn apply(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::StateChanged(snapshot) => {
                self.snapshot = *snapshot;
                self.bar.set_message(snapshot.state.label());
            }
            PlaybackEvent::Progress { progress } => {
                self.snapshot.progress = *progress;
            }
            PlaybackEvent::Error { message, .. } => {
                self.bar.println(format!("Error: {message}"));
            }
            PlaybackEvent::PlaybackStarted | PlaybackEvent::PlaybackFinished => {}
        }
        self.bar.set_position(u64::from(self.snapshot.percent()));
    }

    /// Leave the bar on screen with a final message.
    pub(crate) fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop drawing, keeping the last frame, with an error message.
    pub(crate) fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use voicesync_core::SessionState;

    use super::*;

    #[test]
    fn test_status_line_labels() {
        assert_eq!(status_line(&PlaybackSnapshot::idle()), "Ready");
        assert_eq!(
            status_line(&PlaybackSnapshot {
                state: SessionState::Requesting,
                progress: 0.0,
            }),
            "Synthesizing"
        );
    }

    #[test]
    fn test_status_line_includes_percent_while_holding_audio() {
        let snapshot = PlaybackSnapshot {
            state: SessionState::Paused,
            progress: 0.42,
        };
        assert_eq!(status_line(&snapshot), "Paused 42%");
    }

    #[test]
    fn test_status_bar_tracks_events() {
        let mut bar = StatusBar::new();
        bar.apply(&PlaybackEvent::state_changed(SessionState::Playing, 0.0));
        bar.apply(&PlaybackEvent::Progress { progress: 0.5 });
        assert_eq!(bar.snapshot.state, SessionState::Playing);
        assert_eq!(bar.bar.position(), 50);

        bar.apply(&PlaybackEvent::state_changed(SessionState::Idle, 0.0));
        assert_eq!(bar.snapshot.state, SessionState::Idle);
        assert_eq!(bar.bar.position(), 0);
        bar.finish("done");
    }
}
