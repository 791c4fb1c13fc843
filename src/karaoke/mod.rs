//! Word-by-word karaoke: reveal state, track switching, and output sinks.

pub mod controller;
pub mod reveal;
pub mod sink;

pub use controller::{LyricsStatus, Observation, SongChangeController, TickOutcome, TrackLoad};
pub use reveal::{RevealEngine, RevealState, RevealedWord};
pub use sink::{CollectorSink, KaraokeSink, RenderedWord, TerminalSink};
