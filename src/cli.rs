//! Command-line interface for sidekick
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Word-by-word karaoke for whatever Spotify is playing
#[derive(Parser, Debug)]
#[command(
    name = "sidekick",
    version,
    about = "Word-by-word karaoke for whatever Spotify is playing"
)]
pub struct Cli {
    /// Subcommand to execute (default: live karaoke)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Playback poll interval. Examples: 100ms, 1s
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_interval)]
    pub poll: Option<Duration>,

    /// Show lyrics as-is instead of romanizing Devanagari
    #[arg(long, global = true)]
    pub no_transliterate: bool,

    /// Spacing between synthesized word times on line-timed lyrics
    #[arg(long, global = true, value_name = "MS")]
    pub word_spacing_ms: Option<u64>,
}

/// Parse a poll interval.
///
/// Accepts anything `humantime` does (`100ms`, `1s`, `1s 500ms`); a bare
/// number is milliseconds.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an LRC file and print its timeline
    Parse {
        /// LRC file to parse
        file: PathBuf,

        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play an LRC file as karaoke against the local clock
    Play {
        /// LRC file to play
        file: PathBuf,

        /// Playback speed multiplier
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Start position. Examples: 45s, 1m30s
        #[arg(long, value_name = "DURATION", default_value = "0s", value_parser = humantime::parse_duration)]
        start: Duration,
    },

    /// Print the romanization of Devanagari text
    Transliterate {
        /// Text to transliterate
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML (secrets masked)
    Dump,
    /// Print the default configuration file path
    Path,
}

impl Cli {
    /// Apply global flags on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(poll) = self.poll {
            config.playback.poll_interval_ms =
                u64::try_from(poll.as_millis()).unwrap_or(u64::MAX).max(1);
        }
        if self.no_transliterate {
            config.display.transliterate = false;
        }
        if let Some(spacing) = self.word_spacing_ms {
            config.karaoke.word_spacing_ms = spacing;
        }
    }
}
