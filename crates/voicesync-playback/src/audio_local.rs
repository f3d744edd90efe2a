//! Local audio backend: [`MediaBackend`] over the default output device.
//!
//! [`LocalMediaBackend`] keeps the audio thread alive and hands out
//! [`LocalMediaHandle`]s, each owning one [`AudioTrack`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use voicesync_core::{MediaBackend, MediaHandle, MediaSignalSink, MediaSource, PlaybackError};

use crate::audio_thread::AudioThreadHandle;
use crate::playback::AudioTrack;

/// Media backend that plays through the default output device.
pub struct LocalMediaBackend {
    audio: Arc<AudioThreadHandle>,
}

impl LocalMediaBackend {
    /// Spawn the audio thread and open the default output device.
    ///
    /// Fails with [`PlaybackError::OutputStream`] when no device is available.
    pub fn open() -> Result<Self, PlaybackError> {
        Ok(Self {
            audio: Arc::new(AudioThreadHandle::spawn()?),
        })
    }
}

impl MediaBackend for LocalMediaBackend {
    fn load(
        &self,
        source: MediaSource,
        signals: MediaSignalSink,
    ) -> Result<Box<dyn MediaHandle>, PlaybackError> {
        let track = AudioTrack::load(source, signals, self.audio.sink_factory())?;
        Ok(Box::new(LocalMediaHandle {
            track: Mutex::new(track),
            _audio: Arc::clone(&self.audio),
        }))
    }
}

/// One loaded track. Unloads on drop.
pub struct LocalMediaHandle {
    track: Mutex<AudioTrack>,

    /// Keeps the output stream open while the track exists.
    _audio: Arc<AudioThreadHandle>,
}

impl LocalMediaHandle {
    fn track(&self) -> MutexGuard<'_, AudioTrack> {
        self.track.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaHandle for LocalMediaHandle {
    fn play(&self) -> Result<(), PlaybackError> {
        self.track().play()
    }

    fn pause(&self) -> Result<(), PlaybackError> {
        self.track().pause()
    }

    fn rewind(&self) -> Result<(), PlaybackError> {
        self.track().rewind()
    }

    fn position(&self) -> Duration {
        self.track().position()
    }

    fn duration(&self) -> Option<Duration> {
        self.track().duration()
    }

    fn set_volume(&self, volume: f32) {
        self.track().set_volume(volume);
    }

    fn set_rate(&self, rate: f32) {
        self.track().set_speed(rate);
    }

    fn unload(&self) {
        self.track().unload();
    }
}
