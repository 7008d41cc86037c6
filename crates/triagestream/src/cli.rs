use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "triagestream")]
#[command(
    author,
    version,
    about = "Streaming log triage with model-backed escalation and spoken alerts"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Triage log lines from a file or stdin
    Watch {
        /// Log file to read
        #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
        file: Option<PathBuf>,

        /// Read lines from stdin
        #[arg(long)]
        stdin: bool,

        /// Enable voice alerts (overrides config)
        #[arg(long, conflicts_with = "no_voice")]
        voice: bool,

        /// Disable voice alerts (overrides config)
        #[arg(long)]
        no_voice: bool,
    },

    /// Run deep analysis on a source file and suggest a patch
    Suggest {
        /// Source file to analyze
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print mock error logs, for piping into `watch --stdin`
    Simulate,

    /// Speak a test alert through the configured voice
    VoiceTest,
}

impl Commands {
    /// `Some(enabled)` when a voice flag was passed to `watch`
    pub fn voice_override(&self) -> Option<bool> {
        match self {
            Self::Watch { voice: true, .. } => Some(true),
            Self::Watch { no_voice: true, .. } => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_requires_source() {
        assert!(Cli::try_parse_from(["triagestream", "watch"]).is_err());
        assert!(Cli::try_parse_from(["triagestream", "watch", "app.log", "--stdin"]).is_err());

        let cli = Cli::try_parse_from(["triagestream", "watch", "--stdin"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { stdin: true, file: None, .. }));
    }

    #[test]
    fn test_voice_flags() {
        let cli = Cli::try_parse_from(["triagestream", "watch", "--stdin", "--voice"]).unwrap();
        assert_eq!(cli.command.voice_override(), Some(true));

        let cli = Cli::try_parse_from(["triagestream", "watch", "app.log", "--no-voice"]).unwrap();
        assert_eq!(cli.command.voice_override(), Some(false));

        let cli = Cli::try_parse_from(["triagestream", "watch", "app.log"]).unwrap();
        assert_eq!(cli.command.voice_override(), None);

        assert!(Cli::try_parse_from(["triagestream", "watch", "--stdin", "--voice", "--no-voice"]).is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["triagestream", "suggest", "-f", "auth.js", "-c", "custom.yaml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(matches!(cli.command, Commands::Suggest { .. }));
        assert!(matches!(
            Cli::try_parse_from(["triagestream", "voice-test"]).unwrap().command,
            Commands::VoiceTest
        ));
    }
}
