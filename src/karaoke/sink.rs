//! Karaoke output sinks.
//!
//! The host loop hands every revealed word to a sink, already transliterated.
//! Sinks must render words in the order given, without dropping any.

use crate::config::DisplayConfig;
use crate::error::Result;
use crate::karaoke::controller::TrackLoad;
use crate::karaoke::reveal::RevealedWord;
use crate::output;
use crate::playback::TrackInfo;
use crate::transliterate::Transliterator;
use async_trait::async_trait;
use std::io::{IsTerminal, Write};
use std::time::Duration;

/// A revealed word ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWord {
    pub text: String,
    pub is_line_end: bool,
    /// Timeline position the word was scheduled at.
    pub time_ms: u64,
}

impl RenderedWord {
    pub fn from_revealed(word: &RevealedWord, transliterator: &dyn Transliterator) -> Self {
        Self {
            text: transliterator.apply(&word.entry.text),
            is_line_end: word.is_line_end,
            time_ms: word.entry.time_ms,
        }
    }
}

/// Transliterate a batch of revealed words, keeping their order.
pub fn render_words(
    words: &[RevealedWord],
    transliterator: &dyn Transliterator,
) -> Vec<RenderedWord> {
    words
        .iter()
        .map(|w| RenderedWord::from_revealed(w, transliterator))
        .collect()
}

/// Receives karaoke events from the host loop.
#[async_trait]
pub trait KaraokeSink: Send {
    /// A new track became current. Called before any of its words.
    async fn track_started(&mut self, track: &TrackInfo, load: &TrackLoad) -> Result<()>;

    /// Words that became due this tick, in timeline order.
    async fn render(&mut self, words: &[RenderedWord]) -> Result<()>;

    /// Playback stopped. Called once per idle period.
    async fn idle(&mut self) -> Result<()> {
        Ok(())
    }

    /// Name for logging/diagnostics.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Writes the karaoke display to a terminal.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    color: bool,
    char_delay: Duration,
    marker: String,
    clear_on_switch: bool,
}

impl TerminalSink<std::io::Stdout> {
    /// Sink on stdout. Color and screen clearing only when stdout is a tty.
    pub fn stdout(config: &DisplayConfig) -> Self {
        let tty = std::io::stdout().is_terminal();
        Self::new(std::io::stdout(), config)
            .with_color(tty)
            .with_clear_on_switch(tty)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    /// Plain (uncolored) sink on `out`.
    pub fn new(out: W, config: &DisplayConfig) -> Self {
        Self {
            out,
            color: false,
            char_delay: Duration::from_millis(config.char_delay_ms),
            marker: config.line_end_marker.clone(),
            clear_on_switch: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_clear_on_switch(mut self, clear: bool) -> Self {
        self.clear_on_switch = clear;
        self
    }

    pub fn with_char_delay(mut self, delay: Duration) -> Self {
        self.char_delay = delay;
        self
    }

    /// Typewriter pause after a mid-line word.
    fn typing_delay(&self, word: &RenderedWord) -> Duration {
        if word.is_line_end {
            return Duration::ZERO;
        }
        let chars = u32::try_from(word.text.chars().count()).unwrap_or(u32::MAX);
        self.char_delay.saturating_mul(chars)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> KaraokeSink for TerminalSink<W> {
    async fn track_started(&mut self, track: &TrackInfo, load: &TrackLoad) -> Result<()> {
        if self.clear_on_switch {
            self.out.write_all(output::CLEAR_SCREEN.as_bytes())?;
        }
        let header = output::format_header(track, load, self.color);
        self.out.write_all(header.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    async fn render(&mut self, words: &[RenderedWord]) -> Result<()> {
        for word in words {
            let text = output::format_word(word, &self.marker, self.color);
            self.out.write_all(text.as_bytes())?;
            self.out.flush()?;

            let delay = self.typing_delay(word);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn idle(&mut self) -> Result<()> {
        if self.clear_on_switch {
            self.out.write_all(output::CLEAR_SCREEN.as_bytes())?;
        }
        self.out
            .write_all(output::format_idle_notice(self.color).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}

/// Records everything it receives. For tests.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    pub tracks: Vec<TrackLoad>,
    pub words: Vec<RenderedWord>,
    pub idles: usize,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected word texts, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }

    /// Collected words joined into lines. An unterminated trailing line is
    /// included.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for word in &self.words {
            current.push(&word.text);
            if word.is_line_end {
                lines.push(current.join(" "));
                current.clear();
            }
        }
        if !current.is_empty() {
            lines.push(current.join(" "));
        }
        lines
    }
}

#[async_trait]
impl KaraokeSink for CollectorSink {
    async fn track_started(&mut self, _track: &TrackInfo, load: &TrackLoad) -> Result<()> {
        self.tracks.push(load.clone());
        Ok(())
    }

    async fn render(&mut self, words: &[RenderedWord]) -> Result<()> {
        self.words.extend_from_slice(words);
        Ok(())
    }

    async fn idle(&mut self) -> Result<()> {
        self.idles += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
