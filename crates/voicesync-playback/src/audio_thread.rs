//! Dedicated audio I/O thread. Isolates the `!Send` output stream from the
//! async runtime.
//!
//! `rodio::OutputStream` is `!Send` on some platforms. Rather than using
//! `unsafe impl Send/Sync`, we confine it to a single OS thread that keeps
//! it alive until shutdown. The `Send + Sync` [`OutputStreamHandle`] it
//! hands back is all that sinks need.

use std::sync::{Arc, mpsc};
use std::thread;

use rodio::{OutputStream, OutputStreamHandle, Sink};

use voicesync_core::PlaybackError;

use crate::playback::SinkFactory;

/// `Send + Sync` handle to the dedicated audio thread.
pub struct AudioThreadHandle {
    stream: OutputStreamHandle,
    shutdown_tx: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioThreadHandle {
    /// Spawn the audio thread, open the default output device, and return
    /// the handle.
    ///
    /// Device errors are propagated back via a one-shot init channel.
    pub fn spawn() -> Result<Self, PlaybackError> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (init_tx, init_rx) = mpsc::channel::<Result<OutputStreamHandle, PlaybackError>>();

        let thread = thread::Builder::new()
            .name("voicesync-audio".into())
            .spawn(move || Self::run(&shutdown_rx, &init_tx))
            .map_err(|e| PlaybackError::OutputStream(format!("failed to spawn audio thread: {e}")))?;

        let stream = init_rx.recv().map_err(|_| PlaybackError::AudioThreadDied)??;

        Ok(Self {
            stream,
            shutdown_tx,
            thread: Some(thread),
        })
    }

    /// Factory that opens sinks on this thread's output stream.
    pub fn sink_factory(&self) -> SinkFactory {
        let stream = self.stream.clone();
        Arc::new(move || {
            Sink::try_new(&stream).map_err(|e| PlaybackError::OutputStream(e.to_string()))
        })
    }

    /// Body of the audio thread. Owns the [`OutputStream`] for its entire
    /// lifetime.
    fn run(
        shutdown_rx: &mpsc::Receiver<()>,
        init_tx: &mpsc::Sender<Result<OutputStreamHandle, PlaybackError>>,
    ) {
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(PlaybackError::OutputStream(e.to_string())));
                return;
            }
        };
        tracing::info!("Audio playback initialized on default output device");

        if init_tx.send(Ok(handle)).is_err() {
            return;
        }

        // Returns on an explicit shutdown or when the handle is dropped.
        let _ = shutdown_rx.recv();

        // `_stream` is dropped here, on the audio thread.
        tracing::debug!("Audio thread shutting down");
    }
}

impl Drop for AudioThreadHandle {
    fn drop(&mut self) {
        // Best-effort; the thread may already be dead.
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
