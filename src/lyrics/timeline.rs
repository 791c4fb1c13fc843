//! Time-ordered lyric tokens for a single track.

use serde::Serialize;

/// One displayable token due at a fixed offset into the song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    /// Offset from the start of the track.
    pub time_ms: u64,
    /// Token text, already trimmed.
    pub text: String,
    /// Index of the source lyric line (counting timestamped lines only).
    pub line_id: u32,
}

impl TimelineEntry {
    pub fn new(time_ms: u64, text: impl Into<String>, line_id: u32) -> Self {
        Self {
            time_ms,
            text: text.into(),
            line_id,
        }
    }
}

/// Where the timestamps of a timeline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampMode {
    /// Every token carries its own inline `<MM:SS.fff>` tag.
    WordLevel,
    /// Tokens are spaced evenly from their line's `[MM:SS.fff]` tag.
    #[default]
    LineLevel,
}

impl std::fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WordLevel => write!(f, "word-level"),
            Self::LineLevel => write!(f, "line-level"),
        }
    }
}

/// Ordered tokens for exactly one track instance. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    mode: TimestampMode,
}

impl Timeline {
    /// Build a timeline, stable-sorting entries by `time_ms`.
    ///
    /// Entries sharing a timestamp keep the order they were given in.
    pub fn new(mut entries: Vec<TimelineEntry>, mode: TimestampMode) -> Self {
        entries.sort_by_key(|e| e.time_ms);
        Self { entries, mode }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn mode(&self) -> TimestampMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    /// Whether the entry at `index` is the last one of its line.
    ///
    /// True when the next entry belongs to another line or there is none.
    pub fn is_line_end(&self, index: usize) -> bool {
        match (self.entries.get(index), self.entries.get(index + 1)) {
            (Some(current), Some(next)) => next.line_id != current.line_id,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Number of entries with `time_ms <= progress_ms`.
    pub fn due_count(&self, progress_ms: u64) -> usize {
        self.entries.partition_point(|e| e.time_ms <= progress_ms)
    }

    /// Number of distinct lyric lines represented.
    pub fn line_count(&self) -> usize {
        let mut ids: Vec<u32> = self.entries.iter().map(|e| e.line_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Timestamp of the last token, if any.
    pub fn end_ms(&self) -> Option<u64> {
        self.entries.last().map(|e| e.time_ms)
    }
}
