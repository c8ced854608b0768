//! Error handling for Vidvault

use thiserror::Error;

/// Main error type for Vidvault
#[derive(Debug, Error)]
pub enum VidvaultError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("ffmpeg not found. Please install ffmpeg")]
    FfmpegNotFound,

    #[error("another archiver run holds the lock")]
    LockHeld,

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("source fetch failed: {0}")]
    SourceFetch(String),

    #[error("extraction attempt failed: {0}")]
    Extraction(String),

    #[error("all extraction attempts exhausted for {0}")]
    ExtractionExhausted(String),

    #[error("metadata embedding failed: {0}")]
    Embedding(String),

    #[error("copy failed: {0}")]
    Copy(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
