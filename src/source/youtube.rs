//! Thin Data API v3 client for playlist listings and video metadata
//!
//! Only the three calls the archiver needs. Credential refresh is someone
//! else's job; this client reads a ready-to-use bearer token from the
//! account's token file and maps HTTP auth failures onto [`VidvaultError::Auth`]
//! so the coordinator can retire the account for the rest of the run.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::source::{PlaylistEntry, PlaylistSource, VideoMeta};
use crate::utils::error::VidvaultError;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Playlist source backed by the public Data API
pub struct DataApiSource {
    http: reqwest::Client,
    bearer: String,
}

#[derive(Deserialize)]
struct TokenFile {
    token: Option<String>,
}

impl DataApiSource {
    /// Build a client from an account token file (`{"token": "..."}`).
    pub fn from_token_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: TokenFile = serde_json::from_str(&raw)?;
        let bearer = parsed.token.ok_or_else(|| {
            VidvaultError::Auth(format!("token file {} has no 'token' field", path.display()))
        })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, bearer })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(VidvaultError::Auth(format!("{} returned {}", url, status)).into());
        }
        if !status.is_success() {
            return Err(VidvaultError::SourceFetch(format!("{} returned {}", url, status)).into());
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PlaylistSource for DataApiSource {
    async fn list_items(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>> {
        let url = format!("{}/playlistItems", API_BASE);
        let page_size = PAGE_SIZE.to_string();
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "snippet,contentDetails"),
                ("playlistId", playlist_id),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.as_str()));
            }

            let page: PlaylistItemsResponse = self.get_json(&url, &query).await?;
            for item in page.items {
                let Some(video_id) = item.content_details.and_then(|d| d.video_id) else {
                    continue;
                };
                entries.push(PlaylistEntry {
                    video_id,
                    playlist_item_id: item.id,
                });
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Playlist {} has {} entries", playlist_id, entries.len());
        Ok(entries)
    }

    async fn video_metadata(&self, video_id: &str) -> Result<Option<VideoMeta>> {
        let url = format!("{}/videos", API_BASE);
        let query = [("part", "snippet,contentDetails"), ("id", video_id)];
        let response: VideosResponse = self.get_json(&url, &query).await?;

        let Some(snippet) = response.items.into_iter().next().and_then(|i| i.snippet) else {
            return Ok(None);
        };

        Ok(Some(snippet.into_meta(video_id)))
    }

    async fn remove_item(&self, playlist_item_id: &str) -> Result<()> {
        let url = format!("{}/playlistItems", API_BASE);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.bearer)
            .query(&[("id", playlist_item_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                VidvaultError::SourceFetch(format!("delete returned {}", status)).into(),
            );
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    id: Option<String>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ItemContentDetails>,
}

#[derive(Deserialize)]
struct ItemContentDetails {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    snippet: Option<Snippet>,
}

#[derive(Deserialize, Default)]
struct Snippet {
    title: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    standard: Option<Thumbnail>,
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

impl Snippet {
    fn into_meta(self, video_id: &str) -> VideoMeta {
        // "2023-01-15T00:00:00Z" -> "20230115"
        let upload_date = self
            .published_at
            .as_deref()
            .map(|p| p.chars().take(10).filter(|c| *c != '-').collect())
            .unwrap_or_default();

        VideoMeta {
            title: self.title.unwrap_or_default(),
            channel: self.channel_title.unwrap_or_default(),
            upload_date,
            description: self.description.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            url: format!("https://www.youtube.com/watch?v={}", video_id),
            thumbnail_url: self.thumbnails.and_then(best_thumbnail),
        }
    }
}

/// Pick the highest-resolution thumbnail the source offered.
fn best_thumbnail(thumbs: Thumbnails) -> Option<String> {
    [
        thumbs.maxres,
        thumbs.standard,
        thumbs.high,
        thumbs.medium,
        thumbs.fallback,
    ]
    .into_iter()
    .flatten()
    .find_map(|t| t.url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumb(url: &str) -> Option<Thumbnail> {
        Some(Thumbnail {
            url: Some(url.to_string()),
        })
    }

    #[test]
    fn best_thumbnail_prefers_maxres() {
        let thumbs = Thumbnails {
            maxres: thumb("maxres"),
            standard: thumb("standard"),
            high: thumb("high"),
            medium: None,
            fallback: thumb("default"),
        };
        assert_eq!(best_thumbnail(thumbs).as_deref(), Some("maxres"));
    }

    #[test]
    fn best_thumbnail_falls_through_missing_sizes() {
        let thumbs = Thumbnails {
            maxres: None,
            standard: None,
            high: None,
            medium: thumb("medium"),
            fallback: thumb("default"),
        };
        assert_eq!(best_thumbnail(thumbs).as_deref(), Some("medium"));
    }

    #[test]
    fn snippet_maps_published_at_to_compact_date() {
        let snippet = Snippet {
            title: Some("Title".to_string()),
            channel_title: Some("Channel".to_string()),
            published_at: Some("2023-01-15T08:30:00Z".to_string()),
            description: Some("desc".to_string()),
            tags: Some(vec!["a".to_string(), "b".to_string()]),
            thumbnails: None,
        };
        let meta = snippet.into_meta("vid123");

        assert_eq!(meta.upload_date, "20230115");
        assert_eq!(meta.url, "https://www.youtube.com/watch?v=vid123");
        assert_eq!(meta.date_tag().as_deref(), Some("2023-01-15"));
    }

    #[test]
    fn snippet_without_published_at_yields_empty_date() {
        let meta = Snippet::default().into_meta("vid123");
        assert_eq!(meta.upload_date, "");
        assert_eq!(meta.date_tag(), None);
    }
}
