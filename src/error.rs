//! Error types for lyrics-sidekick.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SidekickError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Lyric parsing errors
    #[error(
        "Lyrics mix timestamp modes: {word_lines} word-timed lines, {line_lines} line-timed lines"
    )]
    MixedTimestampModes { word_lines: usize, line_lines: usize },

    // Playback provider errors
    #[error("Playback state unavailable: {message}")]
    PlaybackUnavailable { message: String },

    #[error("Authorization failed: {message}")]
    Auth { message: String },

    // Lyric source errors
    #[error("Lyric lookup failed: {message}")]
    LyricFetch { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SidekickError>;
