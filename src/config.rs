use crate::defaults;
use crate::error::{Result, SidekickError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub karaoke: KaraokeConfig,
    pub playback: PlaybackConfig,
    pub display: DisplayConfig,
    pub spotify: SpotifyConfig,
    pub lyrics: LyricsConfig,
}

/// Timeline construction and reveal behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KaraokeConfig {
    /// Gap between synthesized word timestamps on line-timed lyrics.
    pub word_spacing_ms: u64,
    pub resume: ResumePolicy,
    pub mixed_mode: MixedModePolicy,
}

/// What to do with lyrics already due when a track is picked up mid-song.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResumePolicy {
    /// Mark everything at or before the current progress as already shown.
    #[default]
    SkipElapsed,
    /// Show nothing as revealed; the first tick prints everything already due.
    CatchUp,
}

/// How the parser treats a document mixing word-timed and line-timed lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MixedModePolicy {
    /// Treat the whole document as line-timed, ignoring inline word tags.
    #[default]
    Downgrade,
    /// Refuse to build a timeline.
    Reject,
}

/// Host loop pacing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub poll_interval_ms: u64,
    pub hold_interval_ms: u64,
    pub idle_interval_ms: u64,
}

/// Terminal output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub transliterate: bool,
    pub char_delay_ms: u64,
    pub line_end_marker: String,
}

/// Spotify Web API credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Lyric lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LyricsConfig {
    pub lrclib_url: String,
}

impl Default for KaraokeConfig {
    fn default() -> Self {
        Self {
            word_spacing_ms: defaults::WORD_SPACING_MS,
            resume: ResumePolicy::default(),
            mixed_mode: MixedModePolicy::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            hold_interval_ms: defaults::HOLD_INTERVAL_MS,
            idle_interval_ms: defaults::IDLE_INTERVAL_MS,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            transliterate: true,
            char_delay_ms: defaults::CHAR_DELAY_MS,
            line_end_marker: defaults::LINE_END_MARKER.to_string(),
        }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            lrclib_url: defaults::LRCLIB_URL.to_string(),
        }
    }
}

impl SpotifyConfig {
    /// True when all three credentials are present.
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SidekickError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SidekickError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist.
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(SidekickError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SIDEKICK_CLIENT_ID → spotify.client_id
    /// - SIDEKICK_CLIENT_SECRET → spotify.client_secret
    /// - SIDEKICK_REFRESH_TOKEN → spotify.refresh_token
    /// - SIDEKICK_LRCLIB_URL → lyrics.lrclib_url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(id) = std::env::var("SIDEKICK_CLIENT_ID")
            && !id.is_empty()
        {
            self.spotify.client_id = id;
        }

        if let Ok(secret) = std::env::var("SIDEKICK_CLIENT_SECRET")
            && !secret.is_empty()
        {
            self.spotify.client_secret = secret;
        }

        if let Ok(token) = std::env::var("SIDEKICK_REFRESH_TOKEN")
            && !token.is_empty()
        {
            self.spotify.refresh_token = token;
        }

        if let Ok(url) = std::env::var("SIDEKICK_LRCLIB_URL")
            && !url.is_empty()
        {
            self.lyrics.lrclib_url = url;
        }

        self
    }

    /// Reject values the host loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("playback.poll_interval_ms", self.playback.poll_interval_ms),
            ("playback.hold_interval_ms", self.playback.hold_interval_ms),
            ("playback.idle_interval_ms", self.playback.idle_interval_ms),
        ];
        for (key, value) in intervals {
            if value == 0 {
                return Err(SidekickError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.lyrics.lrclib_url.trim().is_empty() {
            return Err(SidekickError::ConfigInvalidValue {
                key: "lyrics.lrclib_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize the effective configuration, credentials masked.
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        for secret in [
            &mut shown.spotify.client_secret,
            &mut shown.spotify.refresh_token,
        ] {
            if !secret.is_empty() {
                *secret = "********".to_string();
            }
        }
        toml::to_string_pretty(&shown).map_err(|e| SidekickError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/lyrics-sidekick/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(defaults::APP_DIR).join("config.toml"))
            .ok_or_else(|| SidekickError::Other("Could not determine config directory".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_sidekick_env() {
        remove_env("SIDEKICK_CLIENT_ID");
        remove_env("SIDEKICK_CLIENT_SECRET");
        remove_env("SIDEKICK_REFRESH_TOKEN");
        remove_env("SIDEKICK_LRCLIB_URL");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.karaoke.word_spacing_ms, 200);
        assert_eq!(config.karaoke.resume, ResumePolicy::SkipElapsed);
        assert_eq!(config.karaoke.mixed_mode, MixedModePolicy::Downgrade);

        assert_eq!(config.playback.poll_interval_ms, 100);
        assert_eq!(config.playback.hold_interval_ms, 200);
        assert_eq!(config.playback.idle_interval_ms, 1000);

        assert!(config.display.transliterate);
        assert_eq!(config.display.char_delay_ms, 10);
        assert_eq!(config.display.line_end_marker, "✧");

        assert!(!config.spotify.is_complete());
        assert_eq!(config.lyrics.lrclib_url, "https://lrclib.net");
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [karaoke]
            word_spacing_ms = 250
            resume = "catch-up"
            mixed_mode = "reject"

            [playback]
            poll_interval_ms = 50

            [display]
            transliterate = false
            char_delay_ms = 0

            [spotify]
            client_id = "id"
            client_secret = "secret"
            refresh_token = "token"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.karaoke.word_spacing_ms, 250);
        assert_eq!(config.karaoke.resume, ResumePolicy::CatchUp);
        assert_eq!(config.karaoke.mixed_mode, MixedModePolicy::Reject);
        assert_eq!(config.playback.poll_interval_ms, 50);
        assert_eq!(config.playback.hold_interval_ms, 200);
        assert!(!config.display.transliterate);
        assert_eq!(config.display.char_delay_ms, 0);
        assert!(config.spotify.is_complete());
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [display]
            line_end_marker = "*"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.display.line_end_marker, "*");
        assert!(config.display.transliterate);
        assert_eq!(config.karaoke, KaraokeConfig::default());
        assert_eq!(config.playback, PlaybackConfig::default());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let toml_content = r#"
            [karaoke]
            resume = "rewind"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        assert!(matches!(
            Config::load(temp_file.path()),
            Err(SidekickError::Config(_))
        ));
    }

    #[test]
    fn test_env_override_credentials() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_sidekick_env();

        set_env("SIDEKICK_CLIENT_ID", "abc");
        set_env("SIDEKICK_CLIENT_SECRET", "def");
        set_env("SIDEKICK_REFRESH_TOKEN", "ghi");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.spotify.client_id, "abc");
        assert_eq!(config.spotify.client_secret, "def");
        assert_eq!(config.spotify.refresh_token, "ghi");
        assert!(config.spotify.is_complete());

        clear_sidekick_env();
    }

    #[test]
    fn test_env_override_lrclib_url() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_sidekick_env();

        set_env("SIDEKICK_LRCLIB_URL", "http://localhost:3000");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.lyrics.lrclib_url, "http://localhost:3000");

        clear_sidekick_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_sidekick_env();

        set_env("SIDEKICK_LRCLIB_URL", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.lyrics.lrclib_url, "https://lrclib.net");

        clear_sidekick_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [karaoke
            word_spacing_ms = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_sidekick_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let missing_path = Path::new("/tmp/nonexistent_sidekick_config_12345.toml");
        let err = Config::load(missing_path).unwrap_err();

        assert!(err.to_string().contains("nonexistent_sidekick_config_12345"));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.playback.poll_interval_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("playback.poll_interval_ms"));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_display_toml_masks_secrets() {
        let mut config = Config::default();
        config.spotify.client_id = "visible-id".to_string();
        config.spotify.client_secret = "hidden-secret".to_string();
        config.spotify.refresh_token = "hidden-token".to_string();

        let shown = config.to_display_toml().unwrap();

        assert!(shown.contains("visible-id"));
        assert!(!shown.contains("hidden-secret"));
        assert!(!shown.contains("hidden-token"));
        assert!(shown.contains("********"));
    }

    #[test]
    fn test_display_toml_round_trips_policies() {
        let mut config = Config::default();
        config.karaoke.resume = ResumePolicy::CatchUp;

        let shown = config.to_display_toml().unwrap();
        let parsed: Config = toml::from_str(&shown).unwrap();

        assert_eq!(parsed.karaoke.resume, ResumePolicy::CatchUp);
        assert!(shown.contains("catch-up"));
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        if let Ok(path) = Config::default_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("lyrics-sidekick"));
            assert!(path_str.ends_with("config.toml"));
        }
    }
}
