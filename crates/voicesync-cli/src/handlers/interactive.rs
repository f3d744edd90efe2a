//! Interactive prompt.
//!
//! Lines are read on a dedicated thread (rustyline blocks) and forwarded as
//! parsed [`ReplCommand`]s; the async side interleaves them with
//! orchestrator events.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use voicesync_core::{PlaybackError, PlaybackEvent, RATE_RANGE, Settings};
use voicesync_playback::PlaybackOrchestrator;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::status_line;

const PROMPT: &str = "voicesync> ";

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Set the current text and speak it.
    Speak(String),
    /// Play, pause or resume the current text.
    TogglePlayPause,
    Stop,
    Volume(f32),
    Rate(f32),
    /// Print the current status.
    Status,
    Help,
    Quit,
    /// Recognized command with a bad argument.
    Invalid(String),
}

impl ReplCommand {
    /// Parse one line of input. Anything that is not a command is text.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(head, rest)| (head, rest.trim()));

        match (head, rest.is_empty()) {
            ("", _) => Self::Status,
            ("p", true) => Self::TogglePlayPause,
            ("s", true) => Self::Stop,
            ("q" | "quit" | "exit", true) => Self::Quit,
            ("?" | "help", true) => Self::Help,
            ("v", false) => match rest.parse::<f32>() {
                Ok(v) if (0.0..=1.0).contains(&v) => Self::Volume(v),
                Ok(_) => Self::Invalid("Volume must be between 0 and 1".to_string()),
                Err(_) => Self::Speak(line.to_string()),
            },
            ("r", false) => match rest.parse::<f32>() {
                Ok(r) if (RATE_RANGE.0..=RATE_RANGE.1).contains(&r) => Self::Rate(r),
                Ok(_) => Self::Invalid(format!(
                    "Rate must be between {} and {}",
                    RATE_RANGE.0, RATE_RANGE.1
                )),
                Err(_) => Self::Speak(line.to_string()),
            },
            _ => Self::Speak(line.to_string()),
        }
    }
}

/// Run the prompt until `q`, Ctrl-D or Ctrl-C.
pub async fn execute(ctx: CliContext) -> Result<()> {
    let CliContext {
        orchestrator,
        mut events,
        settings,
    } = ctx;

    print_banner(&settings);
    let mut commands = spawn_reader()?;
    let mut text = String::new();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if !dispatch(&orchestrator, &mut text, command).await? {
                    break;
                }
            }
            Some(event) = events.recv() => render(&event),
        }
    }

    orchestrator.shutdown().await.map_err(CliError::from)?;
    Ok(())
}

/// Apply one command. Returns `false` when the prompt should exit.
async fn dispatch(
    orchestrator: &PlaybackOrchestrator,
    text: &mut String,
    command: ReplCommand,
) -> Result<bool, CliError> {
    let result = match command {
        ReplCommand::Speak(new_text) => {
            stop_if_active(orchestrator).await?;
            *text = new_text;
            orchestrator.speak(text.as_str()).await
        }
        ReplCommand::TogglePlayPause => {
            if text.is_empty() {
                println!("Type some text first.");
                return Ok(true);
            }
            orchestrator.toggle_play_pause(text.as_str()).await
        }
        ReplCommand::Stop => orchestrator.stop().await,
        ReplCommand::Volume(volume) => orchestrator.set_volume(volume).await,
        ReplCommand::Rate(rate) => orchestrator.set_rate(rate).await,
        ReplCommand::Status => {
            println!("{}", status_line(&orchestrator.snapshot().await?));
            Ok(())
        }
        ReplCommand::Help => {
            print_help();
            Ok(())
        }
        ReplCommand::Invalid(message) => {
            println!("{message}");
            Ok(())
        }
        ReplCommand::Quit => return Ok(false),
    };

    match result {
        Ok(()) => Ok(true),
        Err(e @ PlaybackError::InvalidTransition { .. }) => {
            println!("{e}");
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

/// Stop the live session, if any. One that ended on its own since the
/// last prompt is not an error.
async fn stop_if_active(orchestrator: &PlaybackOrchestrator) -> Result<(), PlaybackError> {
    match orchestrator.stop().await {
        Ok(()) | Err(PlaybackError::InvalidTransition { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

fn render(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::StateChanged(snapshot) => println!("[{}]", status_line(snapshot)),
        PlaybackEvent::Error { message, .. } => eprintln!("Error: {message}"),
        PlaybackEvent::Progress { .. }
        | PlaybackEvent::PlaybackStarted
        | PlaybackEvent::PlaybackFinished => {}
    }
}

/// Read lines on a dedicated thread until quit or end of input.
fn spawn_reader() -> Result<mpsc::UnboundedReceiver<ReplCommand>> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("voicesync-repl".into())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to initialise line editor");
                    let _ = tx.send(ReplCommand::Quit);
                    return;
                }
            };

            loop {
                match editor.readline(PROMPT) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = editor.add_history_entry(line.as_str());
                        }
                        let command = ReplCommand::parse(&line);
                        let quit = command == ReplCommand::Quit;
                        if tx.send(command).is_err() || quit {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                        let _ = tx.send(ReplCommand::Quit);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Line editor failed");
                        let _ = tx.send(ReplCommand::Quit);
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

fn print_banner(settings: &Settings) {
    println!("voicesync - speaking via {}", settings.effective_synthesis_url());
    print_help();
}

fn print_help() {
    println!("  <text>     speak text");
    println!("  p          play / pause / resume");
    println!("  s          stop");
    println!("  v <0-1>    volume");
    println!("  r <0.5-2>  rate");
    println!("  <enter>    status");
    println!("  q          quit");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use voicesync_core::{
        MediaBackend, MediaHandle, MediaSignal, MediaSignalSink, MediaSource, SessionState,
        SynthesisPort, SynthesizedAudio,
    };
    use voicesync_playback::BlobStore;

    use super::*;

    struct InstantSynthesis;

    #[async_trait]
    impl SynthesisPort for InstantSynthesis {
        async fn synthesize(&self, _text: &str) -> Result<SynthesizedAudio, PlaybackError> {
            Ok(SynthesizedAudio::new(b"RIFF....WAVE".to_vec(), "audio/wav"))
        }
    }

    /// Media backend whose tracks end when the test says so.
    #[derive(Default)]
    struct ScriptedMedia {
        sinks: Mutex<Vec<MediaSignalSink>>,
    }

    impl ScriptedMedia {
        fn end_current(&self) {
            let sink = self.sinks.lock().unwrap().last().cloned().unwrap();
            sink(MediaSignal::Ended);
        }
    }

    impl MediaBackend for ScriptedMedia {
        fn load(
            &self,
            _source: MediaSource,
            signals: MediaSignalSink,
        ) -> Result<Box<dyn MediaHandle>, PlaybackError> {
            self.sinks.lock().unwrap().push(signals);
            Ok(Box::new(SilentHandle))
        }
    }

    struct SilentHandle;

    impl MediaHandle for SilentHandle {
        fn play(&self) -> Result<(), PlaybackError> {
            Ok(())
        }

        fn pause(&self) -> Result<(), PlaybackError> {
            Ok(())
        }

        fn rewind(&self) -> Result<(), PlaybackError> {
            Ok(())
        }

        fn position(&self) -> Duration {
            Duration::ZERO
        }

        fn duration(&self) -> Option<Duration> {
            None
        }

        fn set_volume(&self, _volume: f32) {}

        fn set_rate(&self, _rate: f32) {}

        fn unload(&self) {}
    }

    fn orchestrator(
        media: &Arc<ScriptedMedia>,
    ) -> (PlaybackOrchestrator, mpsc::UnboundedReceiver<PlaybackEvent>) {
        PlaybackOrchestrator::new(
            Arc::new(InstantSynthesis),
            Arc::clone(media) as Arc<dyn MediaBackend>,
            BlobStore::new(),
            &Settings::with_defaults(),
        )
    }

    async fn wait_for_state(
        events: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
        state: SessionState,
    ) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = events.recv().await {
                if event.state() == Some(state) {
                    return;
                }
            }
            panic!("event stream closed before {state:?}");
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_speak_after_natural_end_keeps_prompt_running() {
        let media = Arc::new(ScriptedMedia::default());
        let (orchestrator, mut events) = orchestrator(&media);
        let mut text = String::new();

        let keep_going = dispatch(&orchestrator, &mut text, ReplCommand::Speak("first".into()))
            .await
            .unwrap();
        assert!(keep_going);
        wait_for_state(&mut events, SessionState::Playing).await;

        media.end_current();
        wait_for_state(&mut events, SessionState::Idle).await;

        let keep_going = dispatch(&orchestrator, &mut text, ReplCommand::Speak("second".into()))
            .await
            .unwrap();
        assert!(keep_going);
        assert_eq!(text, "second");
        wait_for_state(&mut events, SessionState::Playing).await;
    }

    #[tokio::test]
    async fn test_speak_replaces_a_playing_session() {
        let media = Arc::new(ScriptedMedia::default());
        let (orchestrator, mut events) = orchestrator(&media);
        let mut text = String::new();

        dispatch(&orchestrator, &mut text, ReplCommand::Speak("first".into()))
            .await
            .unwrap();
        wait_for_state(&mut events, SessionState::Playing).await;

        let keep_going = dispatch(&orchestrator, &mut text, ReplCommand::Speak("second".into()))
            .await
            .unwrap();

        assert!(keep_going);
        wait_for_state(&mut events, SessionState::Stopped).await;
        wait_for_state(&mut events, SessionState::Playing).await;
        assert_eq!(media.sinks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_controls_without_a_session_are_reported_not_fatal() {
        let media = Arc::new(ScriptedMedia::default());
        let (orchestrator, _events) = orchestrator(&media);
        let mut text = String::new();

        assert!(dispatch(&orchestrator, &mut text, ReplCommand::Stop).await.unwrap());
        assert!(dispatch(&orchestrator, &mut text, ReplCommand::Status).await.unwrap());
        assert!(!dispatch(&orchestrator, &mut text, ReplCommand::Quit).await.unwrap());
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!(ReplCommand::parse("p"), ReplCommand::TogglePlayPause);
        assert_eq!(ReplCommand::parse(" s "), ReplCommand::Stop);
        assert_eq!(ReplCommand::parse("q"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse(""), ReplCommand::Status);
        assert_eq!(ReplCommand::parse("help"), ReplCommand::Help);
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!(ReplCommand::parse("v 0.5"), ReplCommand::Volume(0.5));
        assert_eq!(ReplCommand::parse("r 1.25"), ReplCommand::Rate(1.25));
        assert!(matches!(ReplCommand::parse("v 2"), ReplCommand::Invalid(_)));
        assert!(matches!(ReplCommand::parse("r 3"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(
            ReplCommand::parse("Hello world"),
            ReplCommand::Speak("Hello world".to_string())
        );
        assert_eq!(
            ReplCommand::parse("v is for voice"),
            ReplCommand::Speak("v is for voice".to_string())
        );
        assert_eq!(
            ReplCommand::parse("p q r"),
            ReplCommand::Speak("p q r".to_string())
        );
    }
}
