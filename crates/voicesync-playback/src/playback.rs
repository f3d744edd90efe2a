//! Audio playback via `rodio`.
//!
//! An [`AudioTrack`] is one decoded resource queued on a rodio [`Sink`].
//! Sink controls are atomics or short locks inside rodio, so every method
//! here returns without waiting on the output device. Rewinding re-cues
//! the resource on a fresh sink; `Sink::try_seek` blocks until the device
//! callback services the seek and is never called.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rodio::{Decoder, Sink, Source};

use voicesync_core::{MediaSignal, MediaSignalSink, MediaSource, PlaybackError};

/// Opens a new sink on the output device.
pub type SinkFactory = Arc<dyn Fn() -> Result<Sink, PlaybackError> + Send + Sync>;

/// The resource queued once on its own sink.
struct Cue {
    sink: Arc<Sink>,
    /// Set before the sink is stopped so the completion watcher can tell
    /// a retired cue from a natural drain.
    retired: Arc<AtomicBool>,
}

impl Cue {
    fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}

/// A decoded resource bound to the output device.
pub struct AudioTrack {
    source: MediaSource,
    open_sink: SinkFactory,
    signals: MediaSignalSink,
    duration: Option<Duration>,
    volume: f32,
    speed: f32,

    /// `None` once unloaded.
    cue: Option<Cue>,
}

impl AudioTrack {
    /// Decode `source` onto a fresh, paused sink.
    ///
    /// A completion watcher reports [`MediaSignal::Ended`] when the sink
    /// drains on its own.
    pub fn load(
        source: MediaSource,
        signals: MediaSignalSink,
        open_sink: SinkFactory,
    ) -> Result<Self, PlaybackError> {
        let mut track = Self {
            source,
            open_sink,
            signals,
            duration: None,
            volume: 1.0,
            speed: 1.0,
            cue: None,
        };

        let (cue, duration) = track.new_cue()?;
        track.duration = duration;
        track.cue = Some(cue);

        tracing::debug!(url = %track.source.url, ?duration, "Track loaded");
        Ok(track)
    }

    /// Start or resume the track. Reports [`MediaSignal::Play`].
    pub fn play(&self) -> Result<(), PlaybackError> {
        self.current()?.sink.play();
        (self.signals)(MediaSignal::Play);
        Ok(())
    }

    /// Pause the track in place.
    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.current()?.sink.pause();
        Ok(())
    }

    /// Swap in a fresh cue at position zero. A playing track keeps playing.
    pub fn rewind(&mut self) -> Result<(), PlaybackError> {
        let was_paused = self.current()?.sink.is_paused();
        let (fresh, _) = self.new_cue()?;
        let sink = Arc::clone(&fresh.sink);

        if let Some(old) = self.cue.replace(fresh) {
            old.retire();
        }
        if !was_paused {
            sink.play();
        }
        Ok(())
    }

    /// Current position (zero once unloaded).
    pub fn position(&self) -> Duration {
        self.cue
            .as_ref()
            .map_or(Duration::ZERO, |cue| cue.sink.get_pos())
    }

    /// Total duration reported by the decoder, if known.
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Set volume (0.0 = muted, 1.0 = full). Survives a rewind.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(cue) = &self.cue {
            cue.sink.set_volume(self.volume);
        }
    }

    /// Set playback speed multiplier (1.0 = normal). Survives a rewind.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.1);
        if let Some(cue) = &self.cue {
            cue.sink.set_speed(self.speed);
        }
    }

    /// Stop and drop the sink. Idempotent.
    pub fn unload(&mut self) {
        if let Some(cue) = self.cue.take() {
            cue.retire();
            tracing::debug!(url = %self.source.url, "Track unloaded");
        }
    }

    fn current(&self) -> Result<&Cue, PlaybackError> {
        self.cue
            .as_ref()
            .ok_or_else(|| PlaybackError::PlaybackFailed(format!("{} is not loaded", self.source.url)))
    }

    /// Decode the resource onto a new paused sink carrying the current
    /// volume and speed.
    fn new_cue(&self) -> Result<(Cue, Option<Duration>), PlaybackError> {
        let decoder = Decoder::new(Cursor::new(self.source.data.clone())).map_err(|e| {
            PlaybackError::PlaybackFailed(format!(
                "cannot decode {} payload from {}: {e}",
                self.source.content_type, self.source.url
            ))
        })?;
        let duration = decoder.total_duration();

        let sink = (self.open_sink)()?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.set_speed(self.speed);
        sink.append(decoder);

        let cue = Cue {
            sink: Arc::new(sink),
            retired: Arc::new(AtomicBool::new(false)),
        };
        spawn_completion_watcher(&cue, Arc::clone(&self.signals));
        Ok((cue, duration))
    }
}

impl Drop for AudioTrack {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Spawn a thread that blocks until the sink drains or is stopped.
///
/// `sleep_until_end()` also returns once `stop()` drops the queued source,
/// in which case `retired` is already set and nothing is reported.
fn spawn_completion_watcher(cue: &Cue, signals: MediaSignalSink) {
    let sink = Arc::clone(&cue.sink);
    let retired = Arc::clone(&cue.retired);

    std::thread::spawn(move || {
        sink.sleep_until_end();

        if retired.load(Ordering::SeqCst) {
            return;
        }

        tracing::debug!("Playback finished naturally");
        signals(MediaSignal::Ended);
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use rodio::queue::SourcesQueueOutput;

    use super::*;

    /// Sinks whose outputs are never pulled, like a stalled device.
    #[derive(Clone, Default)]
    struct StalledOutput {
        outputs: Arc<Mutex<Vec<SourcesQueueOutput<f32>>>>,
    }

    impl StalledOutput {
        fn factory(&self) -> SinkFactory {
            let outputs = Arc::clone(&self.outputs);
            Arc::new(move || -> Result<Sink, PlaybackError> {
                let (sink, output) = Sink::new_idle();
                outputs.lock().unwrap().push(output);
                Ok(sink)
            })
        }

        fn opened(&self) -> usize {
            self.outputs.lock().unwrap().len()
        }
    }

    /// 16-bit mono PCM WAV of `samples` silent frames at 8 kHz.
    fn wav(samples: u32) -> Bytes {
        let data_len = samples * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&8_000u32.to_le_bytes());
        out.extend_from_slice(&16_000u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(out.len() + data_len as usize, 0);
        Bytes::from(out)
    }

    fn source(data: Bytes) -> MediaSource {
        MediaSource {
            url: "blob:voicesync/test".to_string(),
            data,
            content_type: "audio/wav".to_string(),
        }
    }

    fn counting_signals() -> (MediaSignalSink, Arc<Mutex<Vec<MediaSignal>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let signals: MediaSignalSink = Arc::new(move |signal: MediaSignal| sink_seen.lock().unwrap().push(signal));
        (signals, seen)
    }

    #[test]
    fn load_starts_paused() {
        let output = StalledOutput::default();
        let (signals, seen) = counting_signals();

        let track = AudioTrack::load(source(wav(800)), signals, output.factory()).unwrap();

        assert_eq!(output.opened(), 1);
        assert!(track.cue.as_ref().unwrap().sink.is_paused());
        assert_eq!(track.position(), Duration::ZERO);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn corrupt_payload_fails_before_opening_a_sink() {
        let output = StalledOutput::default();
        let (signals, _) = counting_signals();

        let err = AudioTrack::load(source(Bytes::from_static(b"not audio")), signals, output.factory())
            .err()
            .unwrap();

        assert!(matches!(err, PlaybackError::PlaybackFailed(_)));
        assert_eq!(output.opened(), 0);
    }

    #[test]
    fn rewind_returns_while_the_device_is_stalled() {
        let output = StalledOutput::default();
        let (signals, seen) = counting_signals();
        let mut track = AudioTrack::load(source(wav(800)), signals, output.factory()).unwrap();
        track.play().unwrap();
        let first = Arc::clone(&track.cue.as_ref().unwrap().retired);

        track.pause().unwrap();
        track.rewind().unwrap();

        assert_eq!(output.opened(), 2);
        assert!(first.load(Ordering::SeqCst));
        assert!(track.cue.as_ref().unwrap().sink.is_paused());
        assert_eq!(track.position(), Duration::ZERO);
        assert_eq!(*seen.lock().unwrap(), vec![MediaSignal::Play]);
    }

    #[test]
    fn rewind_keeps_a_playing_track_playing() {
        let output = StalledOutput::default();
        let (signals, _) = counting_signals();
        let mut track = AudioTrack::load(source(wav(800)), signals, output.factory()).unwrap();
        track.play().unwrap();

        track.rewind().unwrap();

        assert!(!track.cue.as_ref().unwrap().sink.is_paused());
    }

    #[test]
    fn volume_and_speed_carry_over_to_a_fresh_cue() {
        let output = StalledOutput::default();
        let (signals, _) = counting_signals();
        let mut track = AudioTrack::load(source(wav(800)), signals, output.factory()).unwrap();

        track.set_volume(0.25);
        track.set_speed(1.5);
        track.rewind().unwrap();

        let sink = &track.cue.as_ref().unwrap().sink;
        assert!((sink.volume() - 0.25).abs() < f32::EPSILON);
        assert!((sink.speed() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn unloaded_track_rejects_controls() {
        let output = StalledOutput::default();
        let (signals, seen) = counting_signals();
        let mut track = AudioTrack::load(source(wav(800)), signals, output.factory()).unwrap();
        let retired = Arc::clone(&track.cue.as_ref().unwrap().retired);

        track.unload();
        track.unload();

        assert!(retired.load(Ordering::SeqCst));
        assert!(track.play().is_err());
        assert!(track.rewind().is_err());
        assert_eq!(track.position(), Duration::ZERO);
        assert!(seen.lock().unwrap().is_empty());
    }
}
