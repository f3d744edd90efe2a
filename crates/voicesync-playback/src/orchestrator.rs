//! Playback orchestrator: turns text into a played audio stream.
//!
//! The orchestrator is an actor task that owns the single live
//! [`PlaybackSession`]. [`PlaybackOrchestrator`] is the cloneable handle the
//! presentation layer talks to:
//!
//! ```text
//!   Idle → Requesting → Playing ⇄ Paused
//!            │            │  │       │
//!            │            │  └───────┴──(stop)──→ Stopped → Idle
//!            │            └──(ended)──────────────────────→ Idle
//!            └──(synthesis failed)──→ Failed → Idle
//! ```
//!
//! User commands, synthesis results, media signals and sampler ticks all
//! arrive through one FIFO mailbox. Everything except commands is tagged
//! with the [`SessionId`] it was issued against; anything addressed to a
//! session that is no longer live is discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use voicesync_core::{
    MediaBackend, MediaHandle, MediaSignal, MediaSignalSink, PlaybackError, PlaybackEvent,
    PlaybackSnapshot, SessionId, SessionState, Settings, SynthesisPort, SynthesizedAudio,
    clamp_rate, clamp_volume, progress_fraction,
};

use crate::blob::{BlobStore, BlobUrl};
use crate::sampler::ProgressSampler;

type Reply = oneshot::Sender<Result<(), PlaybackError>>;

// ── Mailbox ────────────────────────────────────────────────────────

/// Everything the actor reacts to, in arrival order.
enum Message {
    Speak { text: String, reply: Reply },
    TogglePlayPause { text: String, reply: Reply },
    Pause { reply: Reply },
    Resume { reply: Reply },
    Stop { reply: Reply },
    SetVolume { volume: f32, reply: Reply },
    SetRate { rate: f32, reply: Reply },
    Snapshot { reply: oneshot::Sender<PlaybackSnapshot> },
    Shutdown { reply: oneshot::Sender<()> },

    /// The synthesis request issued for `session` completed.
    SynthesisSettled {
        session: SessionId,
        result: Result<SynthesizedAudio, PlaybackError>,
    },

    /// The media handle loaded for `session` reported a signal.
    Media {
        session: SessionId,
        signal: MediaSignal,
    },

    /// The progress sampler armed for `session` fired.
    Tick { session: SessionId },
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable handle to the orchestrator actor.
///
/// Every operation is a request–reply round trip through the mailbox and
/// takes effect when the actor dequeues it. Once every handle is dropped the
/// actor releases any live session and exits.
#[derive(Clone)]
pub struct PlaybackOrchestrator {
    mailbox: mpsc::UnboundedSender<Message>,
}

impl PlaybackOrchestrator {
    /// Spawn the orchestrator actor.
    ///
    /// Returns the handle and the receiver for [`PlaybackEvent`]s. Must be
    /// called from within a tokio runtime.
    pub fn new(
        synthesis: Arc<dyn SynthesisPort>,
        media: Arc<dyn MediaBackend>,
        store: BlobStore,
        settings: &Settings,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            synthesis,
            media,
            store,
            mailbox: mailbox.downgrade(),
            events: EventSink(event_tx),
            session: None,
            next_id: SessionId::new(1),
            volume: settings.effective_volume(),
            rate: settings.effective_rate(),
            progress_interval: settings.effective_progress_interval(),
        };
        tokio::spawn(actor.run(inbox));

        (Self { mailbox }, event_rx)
    }

    /// Synthesize `text` and play it.
    ///
    /// Blank text is accepted and ignored. Fails with
    /// [`PlaybackError::InvalidTransition`] while a session is requesting,
    /// playing or paused. Synthesis and loading happen after this returns;
    /// their outcome is reported through events.
    pub async fn speak(&self, text: impl Into<String>) -> Result<(), PlaybackError> {
        let text = text.into();
        self.request(|reply| Message::Speak { text, reply }).await
    }

    /// Speak when idle, pause when playing, resume when paused.
    pub async fn toggle_play_pause(&self, text: impl Into<String>) -> Result<(), PlaybackError> {
        let text = text.into();
        self.request(|reply| Message::TogglePlayPause { text, reply })
            .await
    }

    /// Pause the playing session in place.
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Message::Pause { reply }).await
    }

    /// Resume the paused session.
    pub async fn resume(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Message::Resume { reply }).await
    }

    /// Stop the current session and release everything it holds.
    ///
    /// Valid while requesting, playing or paused. An outstanding synthesis
    /// result is discarded when it arrives.
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.request(|reply| Message::Stop { reply }).await
    }

    /// Set the output volume, clamped to `[0, 1]`.
    pub async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        self.request(|reply| Message::SetVolume { volume, reply })
            .await
    }

    /// Set the playback rate, clamped to the supported range.
    pub async fn set_rate(&self, rate: f32) -> Result<(), PlaybackError> {
        self.request(|reply| Message::SetRate { rate, reply }).await
    }

    /// Current state and progress.
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.mailbox
            .send(Message::Snapshot { reply })
            .map_err(|_| PlaybackError::OrchestratorClosed)?;
        rx.await.map_err(|_| PlaybackError::OrchestratorClosed)
    }

    /// Stop any session and end the actor. Later calls on any clone fail
    /// with [`PlaybackError::OrchestratorClosed`].
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.mailbox
            .send(Message::Shutdown { reply })
            .map_err(|_| PlaybackError::OrchestratorClosed)?;
        rx.await.map_err(|_| PlaybackError::OrchestratorClosed)
    }

    async fn request(&self, build: impl FnOnce(Reply) -> Message) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.mailbox
            .send(build(reply))
            .map_err(|_| PlaybackError::OrchestratorClosed)?;
        rx.await.map_err(|_| PlaybackError::OrchestratorClosed)?
    }
}

impl std::fmt::Debug for PlaybackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackOrchestrator")
            .field("closed", &self.mailbox.is_closed())
            .finish()
    }
}

// ── Session ────────────────────────────────────────────────────────

/// The single live playback session.
struct PlaybackSession {
    id: SessionId,
    text: String,
    state: SessionState,
    progress: f32,

    /// Present iff `state` is `Playing` or `Paused`.
    audio: Option<Box<dyn MediaHandle>>,

    /// Backs `audio`. Revoked exactly once by `release_resources`.
    source_url: Option<BlobUrl>,

    /// Armed iff `state` is `Playing`.
    sampler: Option<ProgressSampler>,
}

impl PlaybackSession {
    fn new(id: SessionId, text: String) -> Self {
        Self {
            id,
            text,
            state: SessionState::Idle,
            progress: 0.0,
            audio: None,
            source_url: None,
            sampler: None,
        }
    }

    /// Transition to `new` and emit a state-change event.
    fn transition(&mut self, new: SessionState, events: &EventSink) {
        if self.state != new {
            tracing::debug!(session = %self.id, old = ?self.state, new = ?new, "Playback state transition");
            self.state = new;
            events.emit(PlaybackEvent::state_changed(new, self.progress));
        }
    }

    /// Cancel sampling, halt and unload the media, revoke the blob URL and
    /// reset progress. Idempotent.
    fn release_resources(&mut self, store: &BlobStore) {
        if let Some(sampler) = self.sampler.take() {
            sampler.cancel();
            tracing::debug!(session = %self.id, "Progress sampler cancelled");
        }

        if let Some(audio) = self.audio.take() {
            if let Err(e) = audio.pause() {
                tracing::debug!(session = %self.id, error = %e, "Pause during release failed");
            }
            if let Err(e) = audio.rewind() {
                tracing::debug!(session = %self.id, error = %e, "Rewind during release failed");
            }
            audio.unload();
        }

        if let Some(url) = self.source_url.take() {
            store.revoke(url);
        }

        self.progress = 0.0;
    }
}

// ── Actor ──────────────────────────────────────────────────────────

/// Best-effort event channel to the presentation layer.
struct EventSink(mpsc::UnboundedSender<PlaybackEvent>);

impl EventSink {
    fn emit(&self, event: PlaybackEvent) {
        if self.0.send(event).is_err() {
            tracing::warn!("Playback event receiver dropped");
        }
    }
}

struct Actor {
    synthesis: Arc<dyn SynthesisPort>,
    media: Arc<dyn MediaBackend>,
    store: BlobStore,

    /// Weak so that dropping every handle closes the mailbox.
    mailbox: mpsc::WeakUnboundedSender<Message>,
    events: EventSink,

    session: Option<PlaybackSession>,
    next_id: SessionId,

    volume: f32,
    rate: f32,
    progress_interval: Duration,
}

impl Actor {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Message>) {
        tracing::info!(interval = ?self.progress_interval, "Playback orchestrator started");

        while let Some(message) = inbox.recv().await {
            match message {
                Message::Speak { text, reply } => {
                    let _ = reply.send(self.speak(text));
                }
                Message::TogglePlayPause { text, reply } => {
                    let _ = reply.send(self.toggle_play_pause(text));
                }
                Message::Pause { reply } => {
                    let _ = reply.send(self.pause());
                }
                Message::Resume { reply } => {
                    let _ = reply.send(self.resume());
                }
                Message::Stop { reply } => {
                    let _ = reply.send(self.stop());
                }
                Message::SetVolume { volume, reply } => {
                    self.set_volume(volume);
                    let _ = reply.send(Ok(()));
                }
                Message::SetRate { rate, reply } => {
                    self.set_rate(rate);
                    let _ = reply.send(Ok(()));
                }
                Message::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Message::Shutdown { reply } => {
                    self.finish(SessionState::Stopped, None);
                    let _ = reply.send(());
                    break;
                }
                Message::SynthesisSettled { session, result } => {
                    self.on_synthesis_settled(session, result);
                }
                Message::Media { session, signal } => self.on_media_signal(session, signal),
                Message::Tick { session } => self.on_tick(session),
            }
        }

        self.finish(SessionState::Stopped, None);
        tracing::info!(
            blobs_minted = self.store.minted(),
            blobs_revoked = self.store.revoked(),
            "Playback orchestrator stopped"
        );
    }

    fn state(&self) -> SessionState {
        self.session.as_ref().map_or(SessionState::Idle, |s| s.state)
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.session
            .as_ref()
            .map_or_else(PlaybackSnapshot::idle, |s| PlaybackSnapshot {
                state: s.state,
                progress: s.progress,
            })
    }

    // ── Commands ───────────────────────────────────────────────────

    fn speak(&mut self, text: String) -> Result<(), PlaybackError> {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring speak request with blank text");
            return Ok(());
        }

        let state = self.state();
        if state.is_active() {
            return Err(PlaybackError::invalid("speak", state));
        }

        // `finish` takes every session that leaves the active states.
        debug_assert!(self.session.is_none());

        let id = self.next_id;
        self.next_id = id.next();

        let mut session = PlaybackSession::new(id, text);
        session.transition(SessionState::Requesting, &self.events);
        tracing::info!(session = %id, chars = session.text.chars().count(), "Session started");

        let synthesis = Arc::clone(&self.synthesis);
        let mailbox = self.mailbox.clone();
        let text = session.text.clone();
        tokio::spawn(async move {
            let result = synthesis.synthesize(&text).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(Message::SynthesisSettled {
                    session: id,
                    result,
                });
            }
        });

        self.session = Some(session);
        Ok(())
    }

    fn toggle_play_pause(&mut self, text: String) -> Result<(), PlaybackError> {
        match self.state() {
            SessionState::Playing => self.pause(),
            SessionState::Paused => self.resume(),
            SessionState::Idle | SessionState::Stopped | SessionState::Failed => self.speak(text),
            SessionState::Requesting => Err(PlaybackError::invalid(
                "toggle play/pause",
                SessionState::Requesting,
            )),
        }
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        let state = self.state();
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.state == SessionState::Playing)
        else {
            return Err(PlaybackError::invalid("pause", state));
        };

        if let Err(e) = session.audio.as_ref().map_or(Ok(()), |audio| audio.pause()) {
            return Err(self.fail(e));
        }

        if let Some(sampler) = session.sampler.take() {
            sampler.cancel();
        }
        session.transition(SessionState::Paused, &self.events);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        let state = self.state();
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.state == SessionState::Paused)
        else {
            return Err(PlaybackError::invalid("resume", state));
        };

        if let Err(e) = session.audio.as_ref().map_or(Ok(()), |audio| audio.play()) {
            return Err(self.fail(e));
        }

        session.sampler = Some(arm_sampler(&self.mailbox, self.progress_interval, session.id));
        session.transition(SessionState::Playing, &self.events);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        let state = self.state();
        if !state.is_active() {
            return Err(PlaybackError::invalid("stop", state));
        }
        self.finish(SessionState::Stopped, None);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
        if let Some(audio) = self.session.as_ref().and_then(|s| s.audio.as_ref()) {
            audio.set_volume(self.volume);
        }
        tracing::debug!(volume = self.volume, "Volume updated");
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = clamp_rate(rate);
        if let Some(audio) = self.session.as_ref().and_then(|s| s.audio.as_ref()) {
            audio.set_rate(self.rate);
        }
        tracing::debug!(rate = self.rate, "Rate updated");
    }

    // ── Callbacks ──────────────────────────────────────────────────

    fn on_synthesis_settled(
        &mut self,
        id: SessionId,
        result: Result<SynthesizedAudio, PlaybackError>,
    ) {
        let current = self.live_session_state(id);
        if current != Some(SessionState::Requesting) {
            tracing::debug!(session = %id, ?current, "Discarding stale synthesis result");
            return;
        }

        let outcome = result.and_then(|audio| self.start_playback(id, audio));
        if let Err(e) = outcome {
            tracing::warn!(session = %id, error = %e, "Session failed");
            self.fail(e);
        }
    }

    fn on_media_signal(&mut self, id: SessionId, signal: MediaSignal) {
        let current = self.live_session_state(id);
        if !current.is_some_and(SessionState::holds_audio) {
            tracing::debug!(session = %id, ?signal, ?current, "Discarding stale media signal");
            return;
        }

        match signal {
            MediaSignal::Play => self.events.emit(PlaybackEvent::PlaybackStarted),
            MediaSignal::Ended => {
                self.events.emit(PlaybackEvent::PlaybackFinished);
                self.finish(SessionState::Idle, None);
            }
            MediaSignal::Error(message) => {
                tracing::warn!(session = %id, error = %message, "Media error during playback");
                self.fail(PlaybackError::PlaybackFailed(message));
            }
        }
    }

    fn on_tick(&mut self, id: SessionId) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.id == id && s.state == SessionState::Playing)
        else {
            tracing::trace!(session = %id, "Discarding stale progress tick");
            return;
        };
        let Some(audio) = session.audio.as_ref() else {
            return;
        };

        let position = audio.position().as_secs_f64();
        let duration = audio.duration().map(|d| d.as_secs_f64());
        let Some(progress) = progress_fraction(position, duration) else {
            return;
        };

        if (progress - session.progress).abs() > f32::EPSILON {
            session.progress = progress;
            self.events.emit(PlaybackEvent::Progress { progress });
        }
    }

    // ── Internal helpers ───────────────────────────────────────────

    /// State of the live session if it is `id`.
    fn live_session_state(&self, id: SessionId) -> Option<SessionState> {
        self.session
            .as_ref()
            .filter(|s| s.id == id)
            .map(|s| s.state)
    }

    /// Mint the blob URL, load it, apply voice settings and start playing.
    ///
    /// Whatever was acquired before a failure stays on the session so the
    /// caller's `fail` releases it.
    fn start_playback(&mut self, id: SessionId, audio: SynthesizedAudio) -> Result<(), PlaybackError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        tracing::debug!(session = %id, bytes = audio.len(), content_type = %audio.content_type, "Synthesis succeeded");

        let url = self.store.create_from(audio);
        let source = self.store.media_source(&url);
        session.source_url = Some(url);
        let source = source.ok_or_else(|| {
            PlaybackError::PlaybackFailed("audio blob was released before loading".to_string())
        })?;

        let handle = self.media.load(source, signal_sink(&self.mailbox, id))?;
        handle.set_volume(self.volume);
        handle.set_rate(self.rate);
        session.audio.insert(handle).play()?;

        session.sampler = Some(arm_sampler(&self.mailbox, self.progress_interval, id));
        session.transition(SessionState::Playing, &self.events);
        Ok(())
    }

    /// Report `error`, then tear the session down through `Failed`.
    fn fail(&mut self, error: PlaybackError) -> PlaybackError {
        self.finish(SessionState::Failed, Some(error.clone()));
        error
    }

    /// End the live session: release everything it holds, pass through
    /// `terminal` (unless it is `Idle`) and settle in `Idle`.
    fn finish(&mut self, terminal: SessionState, error: Option<PlaybackError>) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        session.release_resources(&self.store);
        session.transition(terminal, &self.events);
        if let Some(error) = error {
            self.events.emit(PlaybackEvent::Error {
                kind: error.kind(),
                message: error.to_string(),
            });
        }
        session.transition(SessionState::Idle, &self.events);

        tracing::info!(
            session = %session.id,
            outcome = terminal.as_str(),
            live_blobs = self.store.live_count(),
            "Session finished"
        );
    }
}

/// Media signal callback that posts into the mailbox tagged with `session`.
fn signal_sink(mailbox: &mpsc::WeakUnboundedSender<Message>, session: SessionId) -> MediaSignalSink {
    let mailbox = mailbox.clone();
    Arc::new(move |signal| {
        if let Some(tx) = mailbox.upgrade() {
            let _ = tx.send(Message::Media { session, signal });
        }
    })
}

/// Arm a sampler that posts session-tagged ticks into the mailbox.
fn arm_sampler(
    mailbox: &mpsc::WeakUnboundedSender<Message>,
    period: Duration,
    session: SessionId,
) -> ProgressSampler {
    let mailbox = mailbox.clone();
    tracing::debug!(session = %session, ?period, "Progress sampler armed");
    ProgressSampler::arm(period, move || {
        mailbox
            .upgrade()
            .is_some_and(|tx| tx.send(Message::Tick { session }).is_ok())
    })
}
