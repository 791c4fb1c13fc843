//! Default configuration constants for lyrics-sidekick.
//!
//! Shared between the config types, the parser, and the host loop so the
//! same numbers are not repeated in several places.

/// Spacing between synthesized word timestamps on line-timed lyrics.
///
/// Plain LRC only carries one timestamp per line. Words of such a line are
/// revealed this many milliseconds apart, starting at the line timestamp.
pub const WORD_SPACING_MS: u64 = 200;

/// How often playback progress is polled while a track is playing.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Back-off while the player is paused or progress is unknown.
pub const HOLD_INTERVAL_MS: u64 = 200;

/// Back-off while nothing is playing at all.
pub const IDLE_INTERVAL_MS: u64 = 1000;

/// Typewriter delay per rendered character.
pub const CHAR_DELAY_MS: u64 = 10;

/// Marker printed after the last word of a lyric line.
pub const LINE_END_MARKER: &str = "✧";

/// Public LRCLIB instance.
pub const LRCLIB_URL: &str = "https://lrclib.net";

/// Spotify accounts service (token endpoint lives under it).
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Spotify Web API root.
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Upper bound on any single HTTP request to Spotify or LRCLIB.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Access tokens are refreshed this long before Spotify says they expire.
pub const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

/// Directory name under the XDG config dir.
pub const APP_DIR: &str = "lyrics-sidekick";
