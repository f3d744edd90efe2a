//! Main CLI parser and top-level argument handling.
//!
//! Voice options are global so every subcommand shares one configuration
//! path: `.env` → environment variables → flags.

use clap::{Args, Parser};

use voicesync_core::{Settings, SettingsUpdate};

use crate::commands::Commands;

/// Command-line interface for voicesync.
#[derive(Parser)]
#[command(name = "voicesync")]
#[command(about = "Speak text through a remote synthesis service")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub voice: VoiceArgs,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Synthesis and playback options.
#[derive(Args, Debug, Clone, Default)]
pub struct VoiceArgs {
    /// Speech synthesis endpoint
    #[arg(long = "url", env = "VOICESYNC_TTS_URL", global = true)]
    pub synthesis_url: Option<String>,

    /// Synthesis request timeout in seconds
    #[arg(long = "timeout", env = "VOICESYNC_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Progress refresh interval in milliseconds
    #[arg(long = "progress-interval", env = "VOICESYNC_PROGRESS_MS", global = true)]
    pub progress_interval_ms: Option<u64>,

    /// Output volume (0.0 - 1.0)
    #[arg(long, env = "VOICESYNC_VOLUME", global = true)]
    pub volume: Option<f32>,

    /// Playback rate (0.5 - 2.0)
    #[arg(long, env = "VOICESYNC_RATE", global = true)]
    pub rate: Option<f32>,
}

impl VoiceArgs {
    /// Layer the given options over the defaults.
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::with_defaults();
        settings.merge(&SettingsUpdate {
            synthesis_url: self.synthesis_url.clone().map(Some),
            request_timeout_secs: self.timeout_secs.map(Some),
            progress_interval_ms: self.progress_interval_ms.map(Some),
            volume: self.volume.map(Some),
            rate: self.rate.map(Some),
        });
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_voice_args_override_defaults() {
        let cli = Cli::parse_from([
            "voicesync",
            "--url",
            "http://tts.local:9000/speak",
            "--volume",
            "0.5",
            "speak",
            "hello",
        ]);
        let settings = cli.voice.to_settings();
        assert_eq!(settings.effective_synthesis_url(), "http://tts.local:9000/speak");
        assert_eq!(settings.effective_volume(), 0.5);
        assert_eq!(
            settings.request_timeout_secs,
            Settings::with_defaults().request_timeout_secs
        );
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["voicesync", "interactive", "--rate", "1.5", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.voice.rate, Some(1.5));
    }
}
