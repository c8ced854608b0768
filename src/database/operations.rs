//! Ledger operations
//!
//! One row per archived video. A row is written exactly once, after the copy
//! to the destination has settled; its presence is the only dedup signal the
//! run consults. Copy completions run concurrently, so inserts go through a
//! fresh connection per completion rather than the shared pool.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Pool, Row, Sqlite};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One archived video
#[derive(Debug, Clone)]
pub struct DownloadRecord {
    pub video_id: String,
    pub playlist_id: String,
    pub downloaded_at: DateTime<Utc>,
    pub filepath: PathBuf,
}

/// Dedup ledger over the downloads table
pub struct Ledger {
    pool: Pool<Sqlite>,
    db_path: PathBuf,
}

impl Ledger {
    /// Create a ledger over an initialized pool.
    pub fn new(pool: Pool<Sqlite>, db_path: PathBuf) -> Self {
        Self { pool, db_path }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Dedup gate: has this video already been archived?
    pub async fn contains(&self, video_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT video_id FROM downloads WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Fetch one record, mainly for inspection and tests.
    pub async fn get(&self, video_id: &str) -> Result<Option<DownloadRecord>> {
        let row = sqlx::query("SELECT * FROM downloads WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| DownloadRecord {
            video_id: row.get("video_id"),
            playlist_id: row.get("playlist_id"),
            downloaded_at: row.get("downloaded_at"),
            filepath: PathBuf::from(row.get::<String, _>("filepath")),
        }))
    }

    /// Number of ledger rows.
    pub async fn len(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM downloads")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    /// Insert a record through a fresh, independent connection.
    ///
    /// Called from concurrent copy completions; each opens its own connection
    /// and targets a distinct primary key, so the storage engine's atomic
    /// single-row insert is the only synchronization needed.
    pub async fn record_download(db_path: &Path, record: &DownloadRecord) -> Result<()> {
        let mut conn = SqliteConnectOptions::new()
            .filename(db_path)
            .connect()
            .await?;

        sqlx::query(
            r#"
            INSERT INTO downloads (video_id, playlist_id, downloaded_at, filepath)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.video_id)
        .bind(&record.playlist_id)
        .bind(record.downloaded_at)
        .bind(record.filepath.to_string_lossy().into_owned())
        .execute(&mut conn)
        .await?;

        debug!("Recorded download {}", record.video_id);
        Ok(())
    }
}
