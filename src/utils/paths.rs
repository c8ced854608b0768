//! On-disk layout for the archiver's working state
//!
//! Everything the archiver writes outside the destination folders lives under
//! a single data directory: the dedup ledger, per-item scratch directories,
//! the yt-dlp temp area, thumbnail scratch, and the run lock.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory location.
pub const DATA_DIR_ENV: &str = "VIDVAULT_DATA_DIR";

/// Resolved paths for one archiver installation
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub temp_downloads_dir: PathBuf,
    pub lock_file: PathBuf,
    pub ytdlp_temp_dir: PathBuf,
    pub thumbs_dir: PathBuf,
}

impl EnginePaths {
    /// Resolve the layout from the environment, falling back to the
    /// platform's local data directory.
    pub fn resolve() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("./data"))
                    .join("vidvault")
            });
        Self::under(&data_dir)
    }

    /// Build the layout rooted at an explicit data directory.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            db_path: data_dir.join("database").join("db.sqlite"),
            temp_downloads_dir: data_dir.join("temp_downloads"),
            lock_file: data_dir.join("tmp").join("vidvault.lock"),
            ytdlp_temp_dir: data_dir.join("tmp").join("yt-dlp"),
            thumbs_dir: data_dir.join("tmp").join("yt-dlp").join("thumbs"),
        }
    }

    /// Create every directory the run expects to exist.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.db_path.parent().unwrap_or(&self.data_dir),
            &self.temp_downloads_dir,
            self.lock_file.parent().unwrap_or(&self.data_dir),
            &self.ytdlp_temp_dir,
            &self.thumbs_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Scratch directory for a single item, destroyed after its copy settles.
    pub fn scratch_dir(&self, video_id: &str) -> PathBuf {
        self.temp_downloads_dir.join(video_id)
    }
}
