//! Full karaoke sessions: scripted playback, static lyrics, collected output.

use lyrics_sidekick::app::{KaraokeSession, Pace, RunOptions, run_karaoke};
use lyrics_sidekick::config::{Config, ResumePolicy};
use lyrics_sidekick::fetch::StaticLyrics;
use lyrics_sidekick::karaoke::{CollectorSink, LyricsStatus, TerminalSink};
use lyrics_sidekick::playback::{MockPlayback, PlaybackSnapshot, TrackInfo};
use lyrics_sidekick::transliterate;
use std::time::Duration;

const ENHANCED_SONG: &str = include_str!("fixtures/enhanced_song.lrc");
const PLAIN_SONG: &str = include_str!("fixtures/plain_song.lrc");

fn geet() -> TrackInfo {
    TrackInfo::new("spotify:track:geet", "Mera Geet", "Test Artist")
}

fn kal() -> TrackInfo {
    TrackInfo::new("spotify:track:kal", "Kal Ho Naa Ho", "Sonu Nigam")
}

fn lyrics() -> StaticLyrics {
    StaticLyrics::new()
        .with_song("Mera Geet", "Test Artist", ENHANCED_SONG)
        .with_song("Kal Ho Naa Ho", "Sonu Nigam", PLAIN_SONG)
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.playback.poll_interval_ms = 1;
    config.playback.hold_interval_ms = 1;
    config.playback.idle_interval_ms = 1;
    config
}

#[tokio::test]
async fn song_change_mid_song_and_back_to_idle() {
    let mut config = fast_config();
    config.display.transliterate = false;

    let mut provider = MockPlayback::new()
        .then(PlaybackSnapshot::nothing())
        .then(PlaybackSnapshot::playing(geet(), 0))
        .then(PlaybackSnapshot::playing(geet(), 1500))
        .then_fail("rate limited")
        .then(PlaybackSnapshot::paused(geet(), 2000))
        .then(PlaybackSnapshot::playing(geet(), 4300))
        // Skip to the next song, already 3.3s in.
        .then(PlaybackSnapshot::playing(kal(), 3300))
        .then(PlaybackSnapshot::playing(kal(), 7000))
        .then(PlaybackSnapshot::nothing());
    let mut sink = CollectorSink::new();

    let summary = run_karaoke(
        &config,
        &mut provider,
        &lyrics(),
        &mut sink,
        RunOptions {
            max_ticks: Some(50),
            exit_when_idle: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.ticks, 9);
    assert_eq!(summary.tracks, 2);
    assert_eq!(sink.idles, 2);

    assert_eq!(sink.tracks[0].track, geet());
    assert_eq!(sink.tracks[0].status, LyricsStatus::Found);
    assert_eq!(sink.tracks[0].entries, 7);
    assert_eq!(sink.tracks[1].track, kal());
    // "Kal ho naa ho" plus "har" were due at 3.3s.
    assert_eq!(sink.tracks[1].skipped, 5);

    assert_eq!(
        sink.texts(),
        vec!["मेरा", "गीत", "सुनो", "phir", "se", "pal", "yahan", "jee", "bhar", "jiyo"]
    );
    assert_eq!(
        sink.lines(),
        vec![
            "मेरा गीत सुनो".to_string(),
            "phir se".to_string(),
            "pal yahan".to_string(),
            "jee bhar jiyo".to_string(),
        ]
    );
}

#[tokio::test]
async fn catch_up_policy_prints_what_was_missed() {
    let mut config = fast_config();
    config.karaoke.resume = ResumePolicy::CatchUp;
    config.display.transliterate = false;

    let mut provider = MockPlayback::new().then(PlaybackSnapshot::playing(kal(), 1000));
    let mut sink = CollectorSink::new();

    run_karaoke(
        &config,
        &mut provider,
        &lyrics(),
        &mut sink,
        RunOptions {
            max_ticks: Some(1),
            ..RunOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(sink.tracks[0].skipped, 0);
    assert_eq!(sink.texts(), vec!["Kal", "ho", "naa"]);
}

#[tokio::test]
async fn unknown_song_is_announced_and_stays_silent() {
    let unknown = TrackInfo::new("x", "Instrumental", "Nobody");
    let mut provider = MockPlayback::new()
        .then(PlaybackSnapshot::playing(unknown.clone(), 0))
        .then(PlaybackSnapshot::playing(unknown, 60_000));
    let mut sink = CollectorSink::new();
    let mut session = KaraokeSession::new(&fast_config());

    for _ in 0..2 {
        let pace = session
            .tick(&mut provider, &lyrics(), &mut sink)
            .await
            .unwrap();
        assert_eq!(pace, Pace::Poll);
    }

    assert_eq!(sink.tracks.len(), 1);
    assert_eq!(sink.tracks[0].status, LyricsStatus::NotFound);
    assert!(sink.words.is_empty());
}

#[tokio::test]
async fn words_reach_the_sink_transliterated() {
    let mut provider = MockPlayback::new()
        .then(PlaybackSnapshot::playing(geet(), 0))
        .then(PlaybackSnapshot::playing(geet(), 2000));
    let mut sink = CollectorSink::new();
    let mut session = KaraokeSession::new(&fast_config());

    session.tick(&mut provider, &lyrics(), &mut sink).await.unwrap();
    session.tick(&mut provider, &lyrics(), &mut sink).await.unwrap();

    let expected: Vec<String> = ["मेरा", "गीत", "सुनो"]
        .iter()
        .map(|w| transliterate::transliterate(w))
        .collect();
    let got: Vec<String> = sink.words.iter().map(|w| w.text.clone()).collect();
    assert_eq!(got, expected);
    assert!(sink.words[2].is_line_end);
    assert_eq!(sink.words[2].time_ms, 1900);
}

#[tokio::test]
async fn terminal_output_for_a_short_song() {
    let mut config = fast_config();
    config.display.transliterate = false;
    config.display.char_delay_ms = 0;

    let mut provider = MockPlayback::new()
        .then(PlaybackSnapshot::playing(kal(), 0))
        .then(PlaybackSnapshot::playing(kal(), 1100))
        .then(PlaybackSnapshot::nothing());
    let mut sink =
        TerminalSink::new(Vec::new(), &config.display).with_char_delay(Duration::ZERO);

    run_karaoke(
        &config,
        &mut provider,
        &lyrics(),
        &mut sink,
        RunOptions {
            max_ticks: Some(10),
            exit_when_idle: true,
        },
    )
    .await
    .unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert!(out.contains("Now Playing: Kal Ho Naa Ho - Sonu Nigam"));
    assert!(out.contains("Kal ho naa ho  ✧\n"));
    assert!(out.ends_with("No song currently playing. Waiting...\n"));
}
