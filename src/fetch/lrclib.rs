//! LRCLIB lyric lookup.
//!
//! Tries the exact-match endpoint first and falls back to search. Only
//! synced (timestamped) lyrics are returned; plain lyrics cannot drive the
//! karaoke display.

use crate::defaults;
use crate::error::{Result, SidekickError};
use crate::fetch::LyricSource;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One LRCLIB record. Only the fields used here are decoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrclibRecord {
    #[serde(default)]
    instrumental: bool,
    synced_lyrics: Option<String>,
}

impl LrclibRecord {
    fn into_synced(self) -> Option<String> {
        if self.instrumental {
            return None;
        }
        self.synced_lyrics.filter(|s| !s.trim().is_empty())
    }
}

/// Client for an LRCLIB instance.
#[derive(Debug, Clone)]
pub struct LrclibSource {
    client: reqwest::Client,
    base_url: String,
}

impl Default for LrclibSource {
    fn default() -> Self {
        Self::new(defaults::LRCLIB_URL)
    }
}

impl LrclibSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS)),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Give up on a request after `timeout` instead of the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(&format!("{}{}", self.base_url, path), params).map_err(
            |e| SidekickError::LyricFetch {
                message: format!("invalid LRCLIB url {}: {e}", self.base_url),
            },
        )
    }

    /// GET `url` and return the body, or `None` on 404.
    async fn get(&self, url: reqwest::Url) -> Result<Option<String>> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| SidekickError::LyricFetch {
                    message: format!("request failed: {e}"),
                })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SidekickError::LyricFetch {
                message: format!("LRCLIB returned status {status}"),
            });
        }
        let text = response
            .text()
            .await
            .map_err(|e| SidekickError::LyricFetch {
                message: format!("failed to read response: {e}"),
            })?;
        Ok(Some(text))
    }
}

#[async_trait]
impl LyricSource for LrclibSource {
    async fn fetch(&self, title: &str, artist: &str) -> Result<Option<String>> {
        let params = [("track_name", title), ("artist_name", artist)];

        if let Some(body) = self.get(self.url("/api/get", &params)?).await?
            && let Some(lyrics) = synced_from_record(&body)?
        {
            debug!(title, artist, "LRCLIB exact match");
            return Ok(Some(lyrics));
        }

        let query = format!("{title} {artist}");
        let search = self.url("/api/search", &[("q", query.trim())])?;
        let Some(body) = self.get(search).await? else {
            return Ok(None);
        };
        let found = synced_from_search(&body)?;
        debug!(title, artist, found = found.is_some(), "LRCLIB search");
        Ok(found)
    }

    fn name(&self) -> &'static str {
        "lrclib"
    }
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("lyrics-sidekick/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn synced_from_record(body: &str) -> Result<Option<String>> {
    let record: LrclibRecord =
        serde_json::from_str(body).map_err(|e| SidekickError::LyricFetch {
            message: format!("unexpected LRCLIB record: {e}"),
        })?;
    Ok(record.into_synced())
}

fn synced_from_search(body: &str) -> Result<Option<String>> {
    let records: Vec<LrclibRecord> =
        serde_json::from_str(body).map_err(|e| SidekickError::LyricFetch {
            message: format!("unexpected LRCLIB search response: {e}"),
        })?;
    Ok(records.into_iter().find_map(LrclibRecord::into_synced))
}
