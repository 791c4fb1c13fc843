//! lyrics-sidekick - Word-by-word karaoke for the track that is playing
//!
//! Parses timestamped lyrics, reveals them in step with playback progress,
//! and romanizes Devanagari on the way to the terminal.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod fetch;
pub mod karaoke;
pub mod logging;
pub mod lyrics;
pub mod output;
pub mod playback;
pub mod transliterate;

// Composition root
pub mod app;

// Core traits (provider → controller → sink)
pub use fetch::LyricSource;
pub use karaoke::sink::{CollectorSink, KaraokeSink, RenderedWord, TerminalSink};
pub use playback::PlaybackProvider;
pub use transliterate::Transliterator;

// Core state machines
pub use karaoke::controller::SongChangeController;
pub use karaoke::reveal::RevealEngine;
pub use lyrics::{LrcParser, Timeline, TimelineEntry, TimestampMode};

// Error handling
pub use error::{Result, SidekickError};

// Config
pub use config::{Config, MixedModePolicy, ResumePolicy};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
