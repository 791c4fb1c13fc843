//! Lyric lookup by song title and artist.

#[cfg(feature = "lrclib")]
pub mod lrclib;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of raw timestamped lyric text.
///
/// `Ok(None)` means the source had nothing for this song, which is a normal
/// outcome rather than an error.
#[async_trait]
pub trait LyricSource: Send + Sync {
    async fn fetch(&self, title: &str, artist: &str) -> Result<Option<String>>;

    /// Name for logging/diagnostics.
    fn name(&self) -> &'static str;
}

/// In-memory lyrics keyed by (title, artist), matched case-insensitively.
///
/// Used by tests and by the offline `play` command.
#[derive(Debug, Clone, Default)]
pub struct StaticLyrics {
    songs: HashMap<(String, String), String>,
}

impl StaticLyrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_song(mut self, title: &str, artist: &str, raw: impl Into<String>) -> Self {
        self.songs.insert(key(title, artist), raw.into());
        self
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

fn key(title: &str, artist: &str) -> (String, String) {
    (
        title.trim().to_lowercase(),
        artist.trim().to_lowercase(),
    )
}

#[async_trait]
impl LyricSource for StaticLyrics {
    async fn fetch(&self, title: &str, artist: &str) -> Result<Option<String>> {
        Ok(self.songs.get(&key(title, artist)).cloned())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
