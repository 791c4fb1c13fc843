//! Terminal formatting for the karaoke display and the inspection commands.
//!
//! Everything here returns strings; writing them out is the caller's job.

use crate::error::{Result, SidekickError};
use crate::karaoke::controller::{LyricsStatus, TrackLoad};
use crate::karaoke::sink::RenderedWord;
use crate::lyrics::lrc::format_timestamp;
use crate::lyrics::timeline::Timeline;
use crate::playback::TrackInfo;
use owo_colors::OwoColorize;

/// Clear the screen and home the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const SEPARATOR_WIDTH: usize = 60;

/// One revealed word: the word and a space, or the word, the marker and a
/// newline when it closes its line.
pub fn format_word(word: &RenderedWord, marker: &str, color: bool) -> String {
    let text = if color {
        word.text.bright_cyan().bold().to_string()
    } else {
        word.text.clone()
    };
    if !word.is_line_end {
        return format!("{text} ");
    }
    if marker.is_empty() {
        return format!("{text}\n");
    }
    if color {
        format!("{text}  {}\n", marker.dimmed())
    } else {
        format!("{text}  {marker}\n")
    }
}

/// "Now Playing" banner printed when a track starts.
pub fn format_header(track: &TrackInfo, load: &TrackLoad, color: bool) -> String {
    let title = format!("Now Playing: {} - {}", track.title, track.artist);
    let separator = "─".repeat(SEPARATOR_WIDTH);
    let status = match load.status {
        LyricsStatus::Found if load.skipped > 0 => format!(
            "Starting karaoke ({} of {} words already sung)",
            load.skipped, load.entries
        ),
        LyricsStatus::Found => "Starting karaoke".to_string(),
        LyricsStatus::NotFound => "No synced lyrics found for this song.".to_string(),
        LyricsStatus::Unusable => "Lyrics found, but no timestamps could be read.".to_string(),
    };

    if !color {
        return format!("\n{title}\n{separator}\n{status}\n\n");
    }
    let status = match load.status {
        LyricsStatus::Found => status.green().bold().to_string(),
        _ => status.yellow().to_string(),
    };
    format!(
        "\n{}\n{}\n{status}\n\n",
        title.magenta().bold(),
        separator.cyan()
    )
}

/// Notice shown once when playback stops.
pub fn format_idle_notice(color: bool) -> String {
    let notice = "No song currently playing. Waiting...";
    if color {
        format!("{}\n", notice.dimmed())
    } else {
        format!("{notice}\n")
    }
}

/// Listing for `sidekick parse`: one `MM:SS.cc line text` row per entry and
/// a trailing summary.
pub fn format_timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    for entry in timeline.entries() {
        out.push_str(&format!(
            "{} {:>4} {}\n",
            format_timestamp(entry.time_ms),
            entry.line_id,
            entry.text
        ));
    }
    out.push_str(&format!(
        "{} entries, {} lines, {}\n",
        timeline.len(),
        timeline.line_count(),
        timeline.mode()
    ));
    out
}

/// The timeline as pretty-printed JSON, for scripts.
pub fn timeline_json(timeline: &Timeline) -> Result<String> {
    serde_json::to_string_pretty(timeline)
        .map_err(|e| SidekickError::Other(format!("failed to encode timeline: {e}")))
}
