//! Spotify Web API playback provider.
//!
//! Uses the refresh-token grant: the user authorizes the app once (scopes
//! `user-read-playback-state user-read-currently-playing`) and stores the
//! refresh token in the config. Access tokens are fetched on demand and
//! cached until shortly before they expire.

use crate::config::SpotifyConfig;
use crate::defaults;
use crate::error::{Result, SidekickError};
use crate::playback::{PlaybackProvider, PlaybackSnapshot, TrackInfo};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<PlayerItem>,
}

#[derive(Debug, Deserialize)]
struct PlayerItem {
    id: Option<String>,
    uri: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Polls `GET /me/player` for the current playback state.
pub struct SpotifyPlayback {
    client: reqwest::Client,
    credentials: SpotifyConfig,
    accounts_url: String,
    api_url: String,
    token: Option<AccessToken>,
}

impl SpotifyPlayback {
    /// Create a provider. Fails if any credential is missing.
    pub fn new(credentials: SpotifyConfig) -> Result<Self> {
        if !credentials.is_complete() {
            return Err(SidekickError::ConfigInvalidValue {
                key: "spotify".to_string(),
                message: "client_id, client_secret and refresh_token are required \
                          (or set SIDEKICK_CLIENT_ID, SIDEKICK_CLIENT_SECRET, SIDEKICK_REFRESH_TOKEN)"
                    .to_string(),
            });
        }
        Ok(Self {
            client: http_client(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))?,
            credentials,
            accounts_url: defaults::SPOTIFY_ACCOUNTS_URL.to_string(),
            api_url: defaults::SPOTIFY_API_URL.to_string(),
            token: None,
        })
    }

    /// Give up on a request after `timeout` instead of the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Point the provider at different endpoints (for local test servers).
    pub fn with_endpoints(mut self, accounts_url: &str, api_url: &str) -> Self {
        self.accounts_url = accounts_url.trim_end_matches('/').to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token
            && token.expires_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        let body = form_body(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
        ])?;
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| SidekickError::Auth {
                message: format!("token request failed: {e}"),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| SidekickError::Auth {
            message: format!("failed to read token response: {e}"),
        })?;
        if !status.is_success() {
            return Err(SidekickError::Auth {
                message: format!("token endpoint returned {status}: {text}"),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&text).map_err(|e| SidekickError::Auth {
                message: format!("unexpected token response: {e}"),
            })?;
        let lifetime = Duration::from_secs(
            parsed
                .expires_in
                .saturating_sub(defaults::TOKEN_EXPIRY_MARGIN_SECS),
        );
        debug!(expires_in = parsed.expires_in, "spotify access token refreshed");

        self.token = Some(AccessToken {
            value: parsed.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(parsed.access_token)
    }
}

#[async_trait]
impl PlaybackProvider for SpotifyPlayback {
    async fn current_playback(&mut self) -> Result<PlaybackSnapshot> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{}/me/player", self.api_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SidekickError::PlaybackUnavailable {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(PlaybackSnapshot::nothing());
        }
        if status == StatusCode::UNAUTHORIZED {
            self.token = None;
            return Err(SidekickError::Auth {
                message: "access token rejected".to_string(),
            });
        }
        if !status.is_success() {
            return Err(SidekickError::PlaybackUnavailable {
                message: format!("Spotify API returned status {status}"),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SidekickError::PlaybackUnavailable {
                message: format!("failed to read response: {e}"),
            })?;
        snapshot_from_json(&text)
    }

    fn name(&self) -> &'static str {
        "spotify"
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SidekickError::Other(format!("failed to build HTTP client: {e}")))
}

/// Convert a `/me/player` response body into a snapshot.
fn snapshot_from_json(text: &str) -> Result<PlaybackSnapshot> {
    if text.trim().is_empty() {
        return Ok(PlaybackSnapshot::nothing());
    }
    let player: PlayerResponse =
        serde_json::from_str(text).map_err(|e| SidekickError::PlaybackUnavailable {
            message: format!("unexpected player response: {e}"),
        })?;

    let track = player.item.map(|item| {
        let artist = item
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        // Local files have no id; fall back to uri, then title + artist.
        let id = item
            .id
            .or(item.uri)
            .unwrap_or_else(|| format!("{}\u{1f}{}", item.name, artist));
        TrackInfo::new(id, item.name, artist)
    });

    Ok(PlaybackSnapshot {
        track,
        progress_ms: player.progress_ms,
        is_playing: player.is_playing,
    })
}

/// `application/x-www-form-urlencoded` encoding of `pairs`.
fn form_body(pairs: &[(&str, &str)]) -> Result<String> {
    let url = reqwest::Url::parse_with_params("http://form.invalid/", pairs)
        .map_err(|e| SidekickError::Other(format!("failed to encode form: {e}")))?;
    Ok(url.query().unwrap_or_default().to_string())
}
