//! LRC and enhanced (word-timed) LRC parsing.
//!
//! Recognized grammar:
//! - line tag `[MM:SS]` or `[MM:SS.fff]` at the very start of a line
//! - inline word tag `<MM:SS>` or `<MM:SS.fff>` followed by the token text,
//!   which runs to the next `<` or the end of the line
//!
//! Lines without a leading line tag (blank lines, `[ar:...]` metadata, plain
//! text) are skipped and do not count as lyric lines.

use crate::config::{KaraokeConfig, MixedModePolicy};
use crate::defaults;
use crate::error::{Result, SidekickError};
use crate::lyrics::timeline::{Timeline, TimelineEntry, TimestampMode};
use tracing::{debug, warn};

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LrcOptions {
    /// Gap between synthesized word timestamps on line-timed lines.
    pub word_spacing_ms: u64,
    pub mixed_mode: MixedModePolicy,
}

impl Default for LrcOptions {
    fn default() -> Self {
        Self {
            word_spacing_ms: defaults::WORD_SPACING_MS,
            mixed_mode: MixedModePolicy::default(),
        }
    }
}

impl From<&KaraokeConfig> for LrcOptions {
    fn from(config: &KaraokeConfig) -> Self {
        Self {
            word_spacing_ms: config.word_spacing_ms,
            mixed_mode: config.mixed_mode,
        }
    }
}

/// A line that carried a well-formed leading line tag.
#[derive(Debug)]
struct TaggedLine<'a> {
    line_ms: u64,
    /// Text before the first inline word tag.
    lead: &'a str,
    spans: Vec<WordSpan<'a>>,
}

#[derive(Debug)]
struct WordSpan<'a> {
    time_ms: u64,
    text: &'a str,
}

impl TaggedLine<'_> {
    fn is_word_timed(&self) -> bool {
        !self.spans.is_empty()
    }

    fn has_text(&self) -> bool {
        !self.lead.trim().is_empty()
    }
}

/// Converts raw lyric text into a [`Timeline`].
#[derive(Debug, Clone, Default)]
pub struct LrcParser {
    options: LrcOptions,
}

impl LrcParser {
    pub fn new(options: LrcOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LrcOptions {
        &self.options
    }

    /// Parse raw LRC text.
    ///
    /// Only fails under [`MixedModePolicy::Reject`] when the document mixes
    /// word-timed and line-timed lines.
    pub fn parse(&self, raw: &str) -> Result<Timeline> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut skipped = 0usize;
        let lines: Vec<TaggedLine<'_>> = raw
            .lines()
            .filter_map(|line| {
                let tagged = tag_line(line);
                if tagged.is_none() {
                    skipped += 1;
                }
                tagged
            })
            .collect();

        let word_lines = lines.iter().filter(|l| l.is_word_timed()).count();
        let line_lines = lines
            .iter()
            .filter(|l| !l.is_word_timed() && l.has_text())
            .count();

        let mode = match (word_lines, line_lines) {
            (0, _) => TimestampMode::LineLevel,
            (_, 0) => TimestampMode::WordLevel,
            _ => match self.options.mixed_mode {
                MixedModePolicy::Reject => {
                    return Err(SidekickError::MixedTimestampModes {
                        word_lines,
                        line_lines,
                    });
                }
                MixedModePolicy::Downgrade => {
                    warn!(
                        word_lines,
                        line_lines, "lyrics mix word and line timestamps, using line timing"
                    );
                    TimestampMode::LineLevel
                }
            },
        };

        let mut entries = Vec::new();
        for (line_id, line) in lines.iter().enumerate() {
            let line_id = line_id as u32;
            match mode {
                TimestampMode::WordLevel => {
                    entries.extend(
                        line.spans
                            .iter()
                            .filter(|span| !span.text.is_empty())
                            .map(|span| TimelineEntry::new(span.time_ms, span.text, line_id)),
                    );
                }
                TimestampMode::LineLevel => {
                    let words = line
                        .lead
                        .split_whitespace()
                        .chain(line.spans.iter().flat_map(|s| s.text.split_whitespace()));
                    entries.extend(words.enumerate().map(|(i, word)| {
                        let offset = (i as u64).saturating_mul(self.options.word_spacing_ms);
                        TimelineEntry::new(line.line_ms.saturating_add(offset), word, line_id)
                    }));
                }
            }
        }

        debug!(
            lines = lines.len(),
            skipped,
            entries = entries.len(),
            %mode,
            "parsed lyrics"
        );

        Ok(Timeline::new(entries, mode))
    }
}

/// Parse with default options.
///
/// The default mixed-mode policy never rejects, so this cannot fail.
pub fn parse_lrc(raw: &str) -> Timeline {
    LrcParser::default().parse(raw).unwrap_or_default()
}

/// Parse `MM:SS` or `MM:SS.fff` into milliseconds.
///
/// Seconds are rounded to the nearest millisecond. Returns `None` for
/// anything else, including metadata tags like `ar:Artist`.
pub fn parse_timestamp(tag: &str) -> Option<u64> {
    let (minutes, seconds) = tag.split_once(':')?;
    if !is_digits(minutes) {
        return None;
    }
    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds, None),
    };
    if !is_digits(whole) || fraction.is_some_and(|f| !is_digits(f)) {
        return None;
    }

    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    let seconds_ms = (seconds * 1000.0).round();
    if !seconds_ms.is_finite() {
        return None;
    }
    minutes
        .checked_mul(60_000)?
        .checked_add(seconds_ms as u64)
}

/// Format milliseconds as `MM:SS.cc`, the usual LRC display precision.
pub fn format_timestamp(ms: u64) -> String {
    let total_cs = ms / 10;
    let cs = total_cs % 100;
    let total_s = total_cs / 100;
    format!("{:02}:{:02}.{:02}", total_s / 60, total_s % 60, cs)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split off the leading `[MM:SS(.fff)]` tag and scan the body for word tags.
fn tag_line(line: &str) -> Option<TaggedLine<'_>> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let line_ms = parse_timestamp(&rest[..close])?;
    let body = &rest[close + 1..];

    let (lead, spans) = scan_word_tags(body);
    Some(TaggedLine {
        line_ms,
        lead,
        spans,
    })
}

/// Find every `<MM:SS(.fff)>token` span in a line body.
///
/// Returns the text before the first well-formed tag along with the spans.
/// Malformed `<...>` sequences are treated as ordinary text.
fn scan_word_tags(body: &str) -> (&str, Vec<WordSpan<'_>>) {
    let mut spans = Vec::new();
    let mut lead_end = body.len();
    let mut cursor = 0;

    while let Some(open) = body[cursor..].find('<').map(|i| cursor + i) {
        let Some(close) = body[open + 1..].find('>').map(|i| open + 1 + i) else {
            break;
        };
        let Some(time_ms) = parse_timestamp(&body[open + 1..close]) else {
            cursor = open + 1;
            continue;
        };

        if spans.is_empty() {
            lead_end = open;
        }
        let text_start = close + 1;
        let text_end = body[text_start..]
            .find('<')
            .map_or(body.len(), |i| text_start + i);
        spans.push(WordSpan {
            time_ms,
            text: body[text_start..text_end].trim(),
        });
        cursor = text_end;
    }

    (&body[..lead_end], spans)
}
