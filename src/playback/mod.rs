//! Playback state: what is playing and how far along it is.

#[cfg(feature = "spotify")]
pub mod spotify;

use crate::error::{Result, SidekickError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

/// Identity of a track, as reported by the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackInfo {
    /// Player-specific stable identifier.
    pub id: String,
    pub title: String,
    pub artist: String,
}

impl TrackInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

/// One reading of the player state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackSnapshot {
    /// `None` when nothing is loaded.
    pub track: Option<TrackInfo>,
    /// `None` when the player does not report a position.
    pub progress_ms: Option<u64>,
    pub is_playing: bool,
}

impl PlaybackSnapshot {
    /// A track playing at `progress_ms`.
    pub fn playing(track: TrackInfo, progress_ms: u64) -> Self {
        Self {
            track: Some(track),
            progress_ms: Some(progress_ms),
            is_playing: true,
        }
    }

    /// A track loaded but paused at `progress_ms`.
    pub fn paused(track: TrackInfo, progress_ms: u64) -> Self {
        Self {
            track: Some(track),
            progress_ms: Some(progress_ms),
            is_playing: false,
        }
    }

    /// Nothing loaded in the player.
    pub fn nothing() -> Self {
        Self::default()
    }
}

/// Source of playback snapshots.
///
/// Implementations handle their own authentication; retries are left to the
/// caller's polling cadence.
#[async_trait]
pub trait PlaybackProvider: Send {
    async fn current_playback(&mut self) -> Result<PlaybackSnapshot>;

    /// Name for logging/diagnostics.
    fn name(&self) -> &'static str;
}

/// Scripted provider for tests and demos.
///
/// Returns queued snapshots in order, then keeps repeating the last one.
#[derive(Debug, Clone, Default)]
pub struct MockPlayback {
    script: VecDeque<std::result::Result<PlaybackSnapshot, String>>,
    last: PlaybackSnapshot,
    polls: usize,
}

impl MockPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot.
    pub fn then(mut self, snapshot: PlaybackSnapshot) -> Self {
        self.script.push_back(Ok(snapshot));
        self
    }

    /// Queue a provider failure.
    pub fn then_fail(mut self, message: &str) -> Self {
        self.script.push_back(Err(message.to_string()));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

#[async_trait]
impl PlaybackProvider for MockPlayback {
    async fn current_playback(&mut self) -> Result<PlaybackSnapshot> {
        self.polls += 1;
        match self.script.pop_front() {
            Some(Ok(snapshot)) => {
                self.last = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(message)) => Err(SidekickError::PlaybackUnavailable { message }),
            None => Ok(self.last.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Plays one track against the local clock.
///
/// The clock starts on the first poll. Once progress passes `duration_ms`
/// the provider reports that nothing is playing.
#[derive(Debug, Clone)]
pub struct ClockPlayback {
    track: TrackInfo,
    duration_ms: u64,
    start_ms: u64,
    speed: f64,
    started: Option<Instant>,
}

impl ClockPlayback {
    pub fn new(track: TrackInfo, duration_ms: u64) -> Self {
        Self {
            track,
            duration_ms,
            start_ms: 0,
            speed: 1.0,
            started: None,
        }
    }

    /// Begin playback at `start_ms` instead of zero.
    pub fn with_start(mut self, start_ms: u64) -> Self {
        self.start_ms = start_ms;
        self
    }

    /// Playback rate; 2.0 plays twice as fast. Non-positive values are
    /// treated as 1.0.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed > 0.0 && speed.is_finite() {
            speed
        } else {
            1.0
        };
        self
    }

    /// Progress after `elapsed_ms` of wall-clock time. Saturates at `u64::MAX`.
    pub fn progress_at(&self, elapsed_ms: u64) -> u64 {
        // Float-to-int `as` saturates, so only the add can overflow.
        self.start_ms
            .saturating_add((elapsed_ms as f64 * self.speed) as u64)
    }
}

#[async_trait]
impl PlaybackProvider for ClockPlayback {
    async fn current_playback(&mut self) -> Result<PlaybackSnapshot> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let progress_ms = self.progress_at(elapsed_ms);
        if progress_ms > self.duration_ms {
            return Ok(PlaybackSnapshot::nothing());
        }
        Ok(PlaybackSnapshot::playing(self.track.clone(), progress_ms))
    }

    fn name(&self) -> &'static str {
        "clock"
    }
}
