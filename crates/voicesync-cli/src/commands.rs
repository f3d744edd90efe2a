//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize text, play it once and exit
    Speak {
        /// Text to speak (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Interactive prompt with play/pause/stop controls
    Interactive,
}
