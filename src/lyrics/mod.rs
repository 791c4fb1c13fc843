//! Lyric text → timed tokens.

pub mod lrc;
pub mod timeline;

pub use lrc::{LrcOptions, LrcParser, format_timestamp, parse_lrc, parse_timestamp};
pub use timeline::{Timeline, TimelineEntry, TimestampMode};
