//! Track-change detection and timeline (re)construction.
//!
//! The controller owns the reveal engine and decides, per playback tick,
//! whether to go idle, hold, load a new track, or simply advance.

use crate::config::KaraokeConfig;
use crate::karaoke::reveal::{RevealEngine, RevealedWord};
use crate::lyrics::lrc::{LrcOptions, LrcParser};
use crate::lyrics::timeline::{Timeline, TimestampMode};
use crate::playback::{PlaybackSnapshot, TrackInfo};
use tracing::{info, warn};

/// What a playback snapshot means for the karaoke session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Nothing is loaded in the player.
    NoTrack,
    /// A track is loaded but paused, or progress is unknown.
    Hold,
    /// A different track than last time is playing.
    NewTrack { progress_ms: u64 },
    /// The current track keeps playing.
    SameTrack { progress_ms: u64 },
}

/// Whether usable lyrics came with a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsStatus {
    Found,
    /// The lyric source had nothing for this track.
    NotFound,
    /// Lyrics were found but could not be turned into a timeline.
    Unusable,
}

/// Summary of a track switch, handed to sinks for their header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLoad {
    pub track: TrackInfo,
    pub status: LyricsStatus,
    pub entries: usize,
    pub mode: TimestampMode,
    /// Entries skipped because they were already due at switch time.
    pub skipped: usize,
}

/// Result of one synchronous [`SongChangeController::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No track. `entered` is true on the first idle tick after activity.
    Idle { entered: bool },
    Held,
    Switched {
        load: TrackLoad,
        words: Vec<RevealedWord>,
    },
    Advanced(Vec<RevealedWord>),
}

/// Detects track changes and keeps the reveal engine in step with them.
#[derive(Debug)]
pub struct SongChangeController {
    parser: LrcParser,
    engine: RevealEngine,
    current: Option<TrackInfo>,
    idle: bool,
}

impl SongChangeController {
    pub fn new(config: &KaraokeConfig) -> Self {
        Self {
            parser: LrcParser::new(LrcOptions::from(config)),
            engine: RevealEngine::new(config.resume),
            current: None,
            idle: true,
        }
    }

    /// Interpret a snapshot without changing any state.
    pub fn classify(&self, snapshot: &PlaybackSnapshot) -> Observation {
        let Some(track) = &snapshot.track else {
            return Observation::NoTrack;
        };
        let progress_ms = match snapshot.progress_ms {
            Some(progress_ms) if snapshot.is_playing => progress_ms,
            _ => return Observation::Hold,
        };
        match &self.current {
            Some(current) if current.id == track.id => Observation::SameTrack { progress_ms },
            _ => Observation::NewTrack { progress_ms },
        }
    }

    /// Build the timeline for `track` and restart the reveal engine.
    ///
    /// `raw` is the fetched lyric text, or `None` when the source had
    /// nothing. Either way the track becomes current; without lyrics the
    /// engine simply stays silent until the next switch.
    pub fn switch_track(
        &mut self,
        track: &TrackInfo,
        raw: Option<&str>,
        progress_ms: u64,
    ) -> TrackLoad {
        let (timeline, status) = match raw {
            None => (Timeline::empty(), LyricsStatus::NotFound),
            Some(raw) => match self.parser.parse(raw) {
                Ok(timeline) if timeline.is_empty() => (timeline, LyricsStatus::Unusable),
                Ok(timeline) => (timeline, LyricsStatus::Found),
                Err(e) => {
                    warn!(track = %track, "discarding lyrics: {e}");
                    (Timeline::empty(), LyricsStatus::Unusable)
                }
            },
        };

        let entries = timeline.len();
        let mode = timeline.mode();
        self.engine.reset(track.id.clone(), timeline, progress_ms);
        let skipped = self
            .engine
            .state()
            .map_or(0, |state| state.revealed_count());

        info!(track = %track, entries, %mode, skipped, "track switched");
        self.current = Some(track.clone());
        self.idle = false;

        TrackLoad {
            track: track.clone(),
            status,
            entries,
            mode,
            skipped,
        }
    }

    /// Forget the current track and silence the engine.
    ///
    /// Returns true if this call moved the controller into idle.
    pub fn go_idle(&mut self) -> bool {
        self.engine.go_idle();
        self.current = None;
        !std::mem::replace(&mut self.idle, true)
    }

    pub fn advance(&mut self, progress_ms: u64) -> Vec<RevealedWord> {
        self.engine.advance(progress_ms)
    }

    /// Run one full tick with a synchronous lyric lookup.
    ///
    /// `fetch` is only called when the track changed.
    pub fn tick(
        &mut self,
        snapshot: &PlaybackSnapshot,
        fetch: impl FnOnce(&TrackInfo) -> Option<String>,
    ) -> TickOutcome {
        match self.classify(snapshot) {
            Observation::NoTrack => TickOutcome::Idle {
                entered: self.go_idle(),
            },
            Observation::Hold => TickOutcome::Held,
            Observation::SameTrack { progress_ms } => {
                TickOutcome::Advanced(self.advance(progress_ms))
            }
            Observation::NewTrack { progress_ms } => {
                let Some(track) = &snapshot.track else {
                    return TickOutcome::Held;
                };
                let raw = fetch(track);
                let load = self.switch_track(track, raw.as_deref(), progress_ms);
                let words = self.advance(progress_ms);
                TickOutcome::Switched { load, words }
            }
        }
    }

    pub fn current_track(&self) -> Option<&TrackInfo> {
        self.current.as_ref()
    }

    pub fn engine(&self) -> &RevealEngine {
        &self.engine
    }
}
