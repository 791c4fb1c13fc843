//! Progress-driven reveal state machine.
//!
//! Given a timeline and successive playback positions, emits each token once,
//! in timestamp order, as soon as playback reaches it.
//!
//! Entries are revealed strictly in sorted order and the revealed set only
//! grows within a track session, so it is always a prefix of the timeline.
//! It is tracked as a prefix length rather than a set of timestamps, which
//! also keeps tokens sharing a timestamp from shadowing each other.

use crate::config::ResumePolicy;
use crate::lyrics::timeline::{Timeline, TimelineEntry};
use tracing::debug;

/// A token that became due, with its line-end flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedWord {
    pub entry: TimelineEntry,
    /// Next timeline entry belongs to a different line, or there is none.
    pub is_line_end: bool,
}

/// Reveal progress for the active track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealState {
    track_id: String,
    timeline: Timeline,
    /// Entries `[0, revealed)` have been emitted or skipped.
    revealed: usize,
}

impl RevealState {
    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Timestamps of every entry already revealed, ascending.
    pub fn revealed_times(&self) -> impl Iterator<Item = u64> + '_ {
        self.timeline.entries()[..self.revealed]
            .iter()
            .map(|e| e.time_ms)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn remaining(&self) -> usize {
        self.timeline.len() - self.revealed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum EngineState {
    #[default]
    Idle,
    Active(RevealState),
}

/// Emits newly-due timeline entries exactly once.
#[derive(Debug, Clone, Default)]
pub struct RevealEngine {
    state: EngineState,
    resume: ResumePolicy,
}

impl RevealEngine {
    pub fn new(resume: ResumePolicy) -> Self {
        Self {
            state: EngineState::Idle,
            resume,
        }
    }

    /// Start a track session, replacing any previous one.
    ///
    /// Under [`ResumePolicy::SkipElapsed`] every entry at or before
    /// `progress_ms` counts as already revealed, so picking up a song
    /// mid-way does not replay what has been sung.
    pub fn reset(&mut self, track_id: impl Into<String>, timeline: Timeline, progress_ms: u64) {
        let revealed = match self.resume {
            ResumePolicy::SkipElapsed => timeline.due_count(progress_ms),
            ResumePolicy::CatchUp => 0,
        };
        let track_id = track_id.into();
        debug!(
            track = %track_id,
            entries = timeline.len(),
            skipped = revealed,
            progress_ms,
            "reveal engine reset"
        );
        self.state = EngineState::Active(RevealState {
            track_id,
            timeline,
            revealed,
        });
    }

    /// Drop the current track session.
    pub fn go_idle(&mut self) {
        if self.is_active() {
            debug!("reveal engine idle");
        }
        self.state = EngineState::Idle;
    }

    /// Return entries due at `progress_ms` that have not been returned before.
    ///
    /// Empty when idle or when the timeline is empty. Moving backwards never
    /// un-reveals anything.
    pub fn advance(&mut self, progress_ms: u64) -> Vec<RevealedWord> {
        let EngineState::Active(state) = &mut self.state else {
            return Vec::new();
        };

        let due = state.timeline.due_count(progress_ms);
        if due <= state.revealed {
            return Vec::new();
        }

        let words = (state.revealed..due)
            .map(|index| RevealedWord {
                entry: state.timeline.entries()[index].clone(),
                is_line_end: state.timeline.is_line_end(index),
            })
            .collect();
        state.revealed = due;
        words
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EngineState::Active(_))
    }

    pub fn state(&self) -> Option<&RevealState> {
        match &self.state {
            EngineState::Active(state) => Some(state),
            EngineState::Idle => None,
        }
    }

    pub fn track_id(&self) -> Option<&str> {
        self.state().map(RevealState::track_id)
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.state().map(RevealState::timeline)
    }

    /// Revealed timestamps of the active track; empty when idle.
    pub fn revealed_times(&self) -> impl Iterator<Item = u64> + '_ {
        self.state().into_iter().flat_map(RevealState::revealed_times)
    }

    /// Entries still to be revealed; zero when idle.
    pub fn remaining(&self) -> usize {
        self.state().map_or(0, RevealState::remaining)
    }

    pub fn resume_policy(&self) -> ResumePolicy {
        self.resume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::lrc::parse_lrc;
    use crate::lyrics::timeline::TimestampMode;

    fn timeline(times: &[(u64, u32)]) -> Timeline {
        Timeline::new(
            times
                .iter()
                .map(|&(t, line)| TimelineEntry::new(t, format!("w{t}"), line))
                .collect(),
            TimestampMode::WordLevel,
        )
    }

    fn texts(words: &[RevealedWord]) -> Vec<(&str, bool)> {
        words
            .iter()
            .map(|w| (w.entry.text.as_str(), w.is_line_end))
            .collect()
    }

    #[test]
    fn idle_engine_is_silent() {
        let mut engine = RevealEngine::default();
        assert!(!engine.is_active());
        assert!(engine.advance(10_000).is_empty());
        assert_eq!(engine.track_id(), None);
    }

    #[test]
    fn empty_timeline_is_silent() {
        let mut engine = RevealEngine::default();
        engine.reset("t", Timeline::empty(), 0);
        assert!(engine.is_active());
        assert!(engine.advance(u64::MAX).is_empty());
    }

    #[test]
    fn word_level_scenario() {
        let mut engine = RevealEngine::default();
        engine.reset("t", parse_lrc("[00:01.00]<00:01.00>Hello<00:01.50>world"), 0);

        assert_eq!(texts(&engine.advance(1000)), vec![("Hello", false)]);
        assert_eq!(texts(&engine.advance(1500)), vec![("world", true)]);
        assert!(engine.advance(2000).is_empty());
    }

    #[test]
    fn fallback_spacing_scenario() {
        let mut engine = RevealEngine::default();
        engine.reset("t", parse_lrc("[00:02.00]Hi there"), 0);

        assert_eq!(texts(&engine.advance(2000)), vec![("Hi", false)]);
        assert_eq!(texts(&engine.advance(2200)), vec![("there", true)]);
    }

    #[test]
    fn mid_song_resume_scenario() {
        let mut engine = RevealEngine::default();
        engine.reset("t", timeline(&[(1000, 0), (2000, 1), (3000, 2)]), 2500);

        let state = engine.state().unwrap();
        assert_eq!(state.revealed_times().collect::<Vec<_>>(), vec![1000, 2000]);

        let words = engine.advance(3000);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].entry.time_ms, 3000);
    }

    #[test]
    fn reset_at_exact_timestamp_counts_as_revealed() {
        let mut engine = RevealEngine::default();
        engine.reset("t", timeline(&[(1000, 0), (2000, 0)]), 1000);
        assert_eq!(engine.state().unwrap().revealed_count(), 1);
        assert_eq!(texts(&engine.advance(2000)), vec![("w2000", true)]);
    }

    #[test]
    fn catch_up_policy_replays_elapsed_words() {
        let mut engine = RevealEngine::new(ResumePolicy::CatchUp);
        engine.reset("t", timeline(&[(1000, 0), (2000, 0), (3000, 1)]), 2500);

        assert_eq!(engine.state().unwrap().revealed_count(), 0);
        let words = engine.advance(2500);
        assert_eq!(texts(&words), vec![("w1000", false), ("w2000", true)]);
    }

    #[test]
    fn big_jump_returns_everything_in_order() {
        let mut engine = RevealEngine::default();
        engine.reset("t", timeline(&[(100, 0), (200, 0), (300, 1), (400, 1)]), 0);

        let words = engine.advance(1000);
        assert_eq!(
            texts(&words),
            vec![
                ("w100", false),
                ("w200", true),
                ("w300", false),
                ("w400", true),
            ]
        );
    }

    #[test]
    fn seeking_backward_does_not_unreveal() {
        let mut engine = RevealEngine::default();
        engine.reset("t", timeline(&[(1000, 0), (2000, 0), (3000, 0)]), 0);

        assert_eq!(engine.advance(2000).len(), 2);
        assert!(engine.advance(500).is_empty());
        assert!(engine.advance(2000).is_empty());
        assert_eq!(engine.advance(3000).len(), 1);
    }

    #[test]
    fn tied_timestamps_are_each_returned_once() {
        let mut engine = RevealEngine::default();
        engine.reset("t", parse_lrc("[00:01.00]a b c\n[00:01.20]d"), 0);

        // Overlapping line-timed lines interleave, so line ends follow
        // timeline order rather than source lines.
        let first = engine.advance(1200);
        assert_eq!(texts(&first), vec![("a", false), ("b", true), ("d", true)]);
        let second = engine.advance(1400);
        assert_eq!(texts(&second), vec![("c", true)]);
    }

    #[test]
    fn reset_replaces_previous_session() {
        let mut engine = RevealEngine::default();
        engine.reset("first", timeline(&[(1000, 0)]), 0);
        engine.advance(1000);

        engine.reset("second", timeline(&[(1000, 0), (2000, 0)]), 0);
        assert_eq!(engine.track_id(), Some("second"));
        assert_eq!(engine.advance(2000).len(), 2);
    }

    #[test]
    fn go_idle_discards_timeline() {
        let mut engine = RevealEngine::default();
        engine.reset("t", timeline(&[(1000, 0)]), 0);
        engine.go_idle();
        assert!(!engine.is_active());
        assert!(engine.state().is_none());
        assert!(engine.advance(5000).is_empty());
    }

    #[test]
    fn every_entry_returned_exactly_once() {
        let source = "[00:01.00]one two three\n[00:02.00]four\n[00:01.50]five six\n[00:05.00]seven";
        let progressions: [&[u64]; 4] = [
            &[0, 1000, 1100, 1200, 1400, 1500, 1700, 2000, 5000],
            &[5000],
            &[999, 999, 1500, 1500, 4999, 6000],
            &[0, 0, 0, 10_000],
        ];

        for progress in progressions {
            let expected = parse_lrc(source);
            let mut engine = RevealEngine::default();
            engine.reset("t", expected.clone(), 0);

            let emitted: Vec<TimelineEntry> = progress
                .iter()
                .flat_map(|p| engine.advance(*p))
                .map(|w| w.entry)
                .collect();
            assert_eq!(emitted, expected.entries(), "progress {progress:?}");
        }
    }

    #[test]
    fn nothing_at_or_before_reset_progress_is_emitted() {
        let source = "[00:01.00]a b c d e\n[00:03.00]f g\n[00:04.00]h";
        for reset_at in [0, 1000, 1300, 3000, 3200, 4000, 9000] {
            let timeline = parse_lrc(source);
            let mut engine = RevealEngine::default();
            engine.reset("t", timeline.clone(), reset_at);

            let emitted: Vec<u64> = [reset_at, 2000, 3500, 10_000]
                .iter()
                .flat_map(|p| engine.advance(*p))
                .map(|w| w.entry.time_ms)
                .collect();
            let expected: Vec<u64> = timeline
                .entries()
                .iter()
                .map(|e| e.time_ms)
                .filter(|t| *t > reset_at)
                .collect();
            assert_eq!(emitted, expected, "reset at {reset_at}");
        }
    }

    #[test]
    fn engine_queries_follow_state() {
        let mut engine = RevealEngine::default();
        assert!(engine.timeline().is_none());
        assert_eq!(engine.remaining(), 0);
        assert_eq!(engine.revealed_times().count(), 0);

        engine.reset("q", parse_lrc("[00:01.00]a\n[00:02.00]b\n[00:03.00]c"), 1500);
        assert_eq!(engine.timeline().map(Timeline::len), Some(3));
        assert_eq!(engine.revealed_times().collect::<Vec<_>>(), vec![1000]);
        assert_eq!(engine.remaining(), 2);
        assert_eq!(engine.track_id(), Some("q"));
    }
}
