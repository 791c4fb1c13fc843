//! Karaoke host loop.
//!
//! Polls a playback provider, fetches lyrics on track change, advances the
//! reveal engine and hands transliterated words to a sink:
//! provider → controller → transliterate → sink

use crate::config::{Config, PlaybackConfig};
use crate::error::{Result, SidekickError};
use crate::fetch::{LyricSource, StaticLyrics};
use crate::karaoke::controller::{Observation, SongChangeController};
use crate::karaoke::reveal::RevealedWord;
use crate::karaoke::sink::{KaraokeSink, TerminalSink, render_words};
use crate::lyrics::lrc::{LrcOptions, LrcParser};
use crate::playback::{ClockPlayback, PlaybackProvider, TrackInfo};
use crate::transliterate::{self, Transliterator};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extra time the offline clock keeps playing after the last word.
const PLAY_TAIL_MS: u64 = 2000;

/// How long to wait before the next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// A track is playing.
    Poll,
    /// Paused, progress unknown, or the provider failed.
    Hold,
    /// Nothing is playing.
    Idle,
}

impl Pace {
    pub fn interval(self, config: &PlaybackConfig) -> Duration {
        let ms = match self {
            Pace::Poll => config.poll_interval_ms,
            Pace::Hold => config.hold_interval_ms,
            Pace::Idle => config.idle_interval_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Loop limits. The defaults run until Ctrl+C.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after this many polls.
    pub max_ticks: Option<usize>,
    /// Stop once playback goes idle after at least one track was shown.
    pub exit_when_idle: bool,
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub tracks: usize,
    pub words: usize,
}

/// Controller plus transliteration, driven one poll at a time.
pub struct KaraokeSession {
    controller: SongChangeController,
    transliterator: Box<dyn Transliterator>,
    /// Idle notice already sent for the current idle period.
    idle_notified: bool,
    summary: RunSummary,
}

impl KaraokeSession {
    pub fn new(config: &Config) -> Self {
        Self {
            controller: SongChangeController::new(&config.karaoke),
            transliterator: transliterate::from_config(&config.display),
            idle_notified: false,
            summary: RunSummary::default(),
        }
    }

    /// Poll once and forward whatever became due to `sink`.
    ///
    /// Provider and lyric-source failures are logged and absorbed; only sink
    /// failures are returned.
    pub async fn tick(
        &mut self,
        provider: &mut dyn PlaybackProvider,
        source: &dyn LyricSource,
        sink: &mut dyn KaraokeSink,
    ) -> Result<Pace> {
        self.summary.ticks += 1;

        let snapshot = match provider.current_playback().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(provider = provider.name(), "playback unavailable: {e}");
                return Ok(Pace::Hold);
            }
        };

        match self.controller.classify(&snapshot) {
            Observation::NoTrack => {
                self.controller.go_idle();
                if !self.idle_notified {
                    self.idle_notified = true;
                    sink.idle().await?;
                }
                Ok(Pace::Idle)
            }
            Observation::Hold => Ok(Pace::Hold),
            Observation::SameTrack { progress_ms } => {
                let words = self.controller.advance(progress_ms);
                self.render(sink, &words).await?;
                Ok(Pace::Poll)
            }
            Observation::NewTrack { progress_ms } => {
                let Some(track) = &snapshot.track else {
                    return Ok(Pace::Hold);
                };
                let raw = fetch_lyrics(source, track).await;
                let load = self
                    .controller
                    .switch_track(track, raw.as_deref(), progress_ms);
                self.idle_notified = false;
                self.summary.tracks += 1;
                sink.track_started(track, &load).await?;

                let words = self.controller.advance(progress_ms);
                self.render(sink, &words).await?;
                Ok(Pace::Poll)
            }
        }
    }

    async fn render(&mut self, sink: &mut dyn KaraokeSink, words: &[RevealedWord]) -> Result<()> {
        if words.is_empty() {
            return Ok(());
        }
        let rendered = render_words(words, self.transliterator.as_ref());
        self.summary.words += rendered.len();
        sink.render(&rendered).await
    }

    pub fn controller(&self) -> &SongChangeController {
        &self.controller
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

/// Lyric lookup failures count as "no lyrics" so the track still switches.
async fn fetch_lyrics(source: &dyn LyricSource, track: &TrackInfo) -> Option<String> {
    match source.fetch(&track.title, &track.artist).await {
        Ok(Some(raw)) => Some(raw),
        Ok(None) => {
            debug!(source = source.name(), track = %track, "no lyrics");
            None
        }
        Err(e) => {
            warn!(source = source.name(), track = %track, "lyric lookup failed: {e}");
            None
        }
    }
}

/// Run the karaoke loop until Ctrl+C or an [`RunOptions`] limit.
pub async fn run_karaoke(
    config: &Config,
    provider: &mut dyn PlaybackProvider,
    source: &dyn LyricSource,
    sink: &mut dyn KaraokeSink,
    options: RunOptions,
) -> Result<RunSummary> {
    run_karaoke_until(config, provider, source, sink, options, ctrl_c()).await
}

/// Resolves on the first Ctrl+C. Never resolves if the handler can't be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Run the karaoke loop until `shutdown` resolves or an [`RunOptions`] limit
/// is hit.
///
/// `shutdown` is watched during every poll as well as between polls, so a
/// stalled provider or lyric source cannot keep the loop alive.
pub async fn run_karaoke_until(
    config: &Config,
    provider: &mut dyn PlaybackProvider,
    source: &dyn LyricSource,
    sink: &mut dyn KaraokeSink,
    options: RunOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<RunSummary> {
    info!(
        provider = provider.name(),
        source = source.name(),
        sink = sink.name(),
        "karaoke loop started"
    );
    let mut session = KaraokeSession::new(config);
    tokio::pin!(shutdown);

    loop {
        let pace = tokio::select! {
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
            pace = session.tick(provider, source, sink) => pace?,
        };

        if options
            .max_ticks
            .is_some_and(|max| session.summary().ticks >= max)
        {
            break;
        }
        if options.exit_when_idle && pace == Pace::Idle && session.summary().tracks > 0 {
            break;
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
            _ = tokio::time::sleep(pace.interval(&config.playback)) => {}
        }
    }

    let summary = session.summary();
    info!(
        ticks = summary.ticks,
        tracks = summary.tracks,
        words = summary.words,
        "karaoke loop stopped"
    );
    Ok(summary)
}

/// Live karaoke: Spotify playback, LRCLIB lyrics, terminal output.
#[cfg(all(feature = "spotify", feature = "lrclib"))]
pub async fn run_live(config: Config) -> Result<RunSummary> {
    use crate::fetch::lrclib::LrclibSource;
    use crate::playback::spotify::SpotifyPlayback;

    let mut provider = SpotifyPlayback::new(config.spotify.clone())?;
    let source = LrclibSource::new(&config.lyrics.lrclib_url);
    let mut sink = TerminalSink::stdout(&config.display);
    run_karaoke(
        &config,
        &mut provider,
        &source,
        &mut sink,
        RunOptions::default(),
    )
    .await
}

/// Offline karaoke over a local LRC file, timed by the local clock.
pub async fn run_play(config: Config, path: &Path, speed: f64, start: Duration) -> Result<RunSummary> {
    if !(speed > 0.0 && speed.is_finite()) {
        return Err(SidekickError::ConfigInvalidValue {
            key: "speed".to_string(),
            message: format!("must be a positive number, got {speed}"),
        });
    }

    let raw = std::fs::read_to_string(path)?;
    let timeline = LrcParser::new(LrcOptions::from(&config.karaoke)).parse(&raw)?;
    let duration_ms = timeline.end_ms().unwrap_or(0) + PLAY_TAIL_MS;

    let track = local_track(path);
    let source = StaticLyrics::new().with_song(&track.title, &track.artist, raw);
    let start_ms = u64::try_from(start.as_millis()).unwrap_or(u64::MAX);
    let mut provider = ClockPlayback::new(track, duration_ms)
        .with_start(start_ms)
        .with_speed(speed);
    let mut sink = TerminalSink::stdout(&config.display);

    run_karaoke(
        &config,
        &mut provider,
        &source,
        &mut sink,
        RunOptions {
            exit_when_idle: true,
            ..RunOptions::default()
        },
    )
    .await
}

/// Track identity for a local lyric file: the file stem as title.
fn local_track(path: &Path) -> TrackInfo {
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lyrics".to_string());
    TrackInfo::new(path.display().to_string(), title, "local file")
}
