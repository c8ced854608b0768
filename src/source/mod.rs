//! Playlist source collaborator
//!
//! The archiver does not decide what to download; a playlist source hands it
//! item identifiers and descriptive metadata. The trait keeps the engine
//! testable and the credential machinery out of the core.

pub mod youtube;

pub use youtube::DataApiSource;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::utils::RunConfig;

/// One entry of a playlist listing
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    pub video_id: String,
    /// Source-side handle needed to remove the entry after archiving.
    pub playlist_item_id: Option<String>,
}

/// Descriptive metadata for a single video, immutable once fetched
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub title: String,
    pub channel: String,
    /// Compact `YYYYMMDD` stamp, or empty when the source had none.
    pub upload_date: String,
    pub description: String,
    pub tags: Vec<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

impl VideoMeta {
    /// Hyphenated date tag (`YYYY-MM-DD`) for embedding, only when the
    /// upload date is exactly eight digits.
    pub fn date_tag(&self) -> Option<String> {
        let d = &self.upload_date;
        if d.len() == 8 && d.bytes().all(|b| b.is_ascii_digit()) {
            Some(format!("{}-{}-{}", &d[0..4], &d[4..6], &d[6..8]))
        } else {
            None
        }
    }
}

/// Contract the archiver consumes from any playlist source
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// List the entries of a playlist in source order.
    async fn list_items(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>>;

    /// Fetch descriptive metadata for one video; `None` when the source
    /// no longer knows the id.
    async fn video_metadata(&self, video_id: &str) -> Result<Option<VideoMeta>>;

    /// Ask the source to remove a playlist entry.
    async fn remove_item(&self, playlist_item_id: &str) -> Result<()>;
}

/// Build one source client per configured account for this run.
///
/// An account whose token cannot be loaded is skipped (logged) so a single
/// bad credential never aborts the whole run.
pub fn build_sources(config: &RunConfig) -> HashMap<String, Arc<dyn PlaylistSource>> {
    let mut sources: HashMap<String, Arc<dyn PlaylistSource>> = HashMap::new();
    for (name, account) in &config.accounts {
        match DataApiSource::from_token_file(&account.token) {
            Ok(source) => {
                sources.insert(name.clone(), Arc::new(source));
            }
            Err(e) => {
                error!("Failed to initialize source client for account {}: {:#}", name, e);
            }
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_with_date(upload_date: &str) -> VideoMeta {
        VideoMeta {
            title: "t".to_string(),
            channel: "c".to_string(),
            upload_date: upload_date.to_string(),
            description: String::new(),
            tags: Vec::new(),
            url: String::new(),
            thumbnail_url: None,
        }
    }

    #[test]
    fn date_tag_reformats_valid_dates() {
        assert_eq!(meta_with_date("20230115").date_tag().as_deref(), Some("2023-01-15"));
    }

    #[test]
    fn date_tag_rejects_wrong_lengths_and_nondigits() {
        assert_eq!(meta_with_date("").date_tag(), None);
        assert_eq!(meta_with_date("2023115").date_tag(), None);
        assert_eq!(meta_with_date("202301150").date_tag(), None);
        assert_eq!(meta_with_date("2023-1-15").date_tag(), None);
        assert_eq!(meta_with_date("2023011x").date_tag(), None);
    }
}
