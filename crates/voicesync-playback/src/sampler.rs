//! Progress sampling task.
//!
//! A [`ProgressSampler`] is a cancellable recurring task armed when a session
//! enters `Playing` and cancelled on every transition out of it. It never
//! touches the media handle itself: on each tick it only invokes a callback
//! (the orchestrator posts a session-tagged tick message), and the owner of
//! the handle reads the position.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Armed progress sampling task. Cancelled on [`cancel`](Self::cancel) or drop.
#[derive(Debug)]
pub struct ProgressSampler {
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressSampler {
    /// Spawn a sampler that calls `on_tick` every `period`.
    ///
    /// The first tick fires immediately. The task ends on its own when
    /// `on_tick` returns `false` (the receiving side is gone).
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(period: Duration, on_tick: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        tracing::trace!("Progress sampler cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !on_tick() {
                            tracing::trace!("Progress sampler receiver dropped");
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel_token, task }
    }

    /// Stop sampling. No tick is delivered after this returns.
    pub fn cancel(self) {
        // Drop does the work.
        drop(self);
    }

    /// Whether the sampling task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self.task.abort();
    }
}
