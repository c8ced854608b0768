//! In-place metadata embedding
//!
//! Rewrites a finished media file with its descriptive tags and, when the
//! source offers one, the thumbnail as cover art. Streams are copied, never
//! re-encoded, and the container is preserved. The tagged copy is written
//! next to the original so the final replace stays on one filesystem.

use crate::postprocess::ffmpeg::Ffmpeg;
use crate::source::VideoMeta;
use crate::utils::error::VidvaultError;
use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(15);

/// Tags a finished media file in place
pub struct MetadataEmbedder {
    ffmpeg: Ffmpeg,
    http: reqwest::Client,
    thumbs_dir: PathBuf,
}

impl MetadataEmbedder {
    pub fn new(ffmpeg: Ffmpeg, thumbs_dir: PathBuf) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(THUMBNAIL_TIMEOUT)
            .build()?;
        Ok(Self {
            ffmpeg,
            http,
            thumbs_dir,
        })
    }

    /// Embed tags and cover art into `local_file`, atomically replacing it on
    /// success. Failure leaves the original byte-for-byte untouched.
    pub async fn embed(&self, local_file: &Path, meta: &VideoMeta, video_id: &str) -> Result<()> {
        let thumb_path = match &meta.thumbnail_url {
            Some(url) => self.fetch_thumbnail(url, video_id).await,
            None => None,
        };

        let ext = local_file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("webm");
        let tagged_path = local_file
            .with_file_name(format!(".{}.tagged.{}", video_id, ext));

        let args = build_tag_args(local_file, &tagged_path, meta, video_id, thumb_path.as_deref());
        let result = self.ffmpeg.run(&args).await;

        if let Some(thumb) = &thumb_path {
            let _ = std::fs::remove_file(thumb);
        }

        match result {
            Ok(()) => {
                if let Err(e) = std::fs::rename(&tagged_path, local_file) {
                    let _ = std::fs::remove_file(&tagged_path);
                    return Err(VidvaultError::Embedding(e.to_string()).into());
                }
                info!("[{}] Metadata embedded successfully", video_id);
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tagged_path);
                Err(VidvaultError::Embedding(format!("{:#}", e)).into())
            }
        }
    }

    /// Best-effort thumbnail download; absence of a cover is not an error.
    async fn fetch_thumbnail(&self, url: &str, video_id: &str) -> Option<PathBuf> {
        let path = self.thumbs_dir.join(format!("{}.jpg", video_id));

        let bytes = match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.bytes().await {
                Ok(bytes) if !bytes.is_empty() => bytes,
                _ => return None,
            },
            Ok(response) => {
                warn!(
                    "[{}] Thumbnail fetch returned {}",
                    video_id,
                    response.status()
                );
                return None;
            }
            Err(e) => {
                warn!("[{}] Thumbnail download failed: {}", video_id, e);
                return None;
            }
        };

        match std::fs::write(&path, &bytes) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("[{}] Could not store thumbnail: {}", video_id, e);
                None
            }
        }
    }
}

/// Assemble the single stream-copy tagging invocation.
fn build_tag_args(
    input: &Path,
    output: &Path,
    meta: &VideoMeta,
    video_id: &str,
    thumb: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];

    if let Some(thumb) = thumb {
        args.push("-attach".into());
        args.push(thumb.into());
        args.push("-metadata:s:t".into());
        args.push("mimetype=image/jpeg".into());
        args.push("-metadata:s:t".into());
        args.push("filename=cover.jpg".into());
    }

    let mut tag = |key: &str, value: &str| {
        if !value.is_empty() {
            args.push("-metadata".into());
            args.push(format!("{}={}", key, value).into());
        }
    };

    let title = if meta.title.is_empty() {
        video_id
    } else {
        &meta.title
    };
    tag("title", title);
    tag("artist", &meta.channel);
    if let Some(date) = meta.date_tag() {
        tag("date", &date);
    }
    tag("description", &meta.description);
    tag("keywords", &meta.tags.join(", "));
    tag("comment", &format!("YouTubeID={} URL={}", video_id, meta.url));

    args.push("-c".into());
    args.push("copy".into());
    args.push(output.into());
    args
}
