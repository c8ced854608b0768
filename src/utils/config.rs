//! Run configuration
//!
//! Every recognized option is listed here with its default and validated
//! once at startup; nothing downstream reaches into loosely-typed maps.

use crate::extractor::Strictness;
use crate::utils::error::VidvaultError;
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Container extensions the final-format option accepts.
pub const KNOWN_CONTAINERS: &[&str] = &["webm", "mp4", "mkv"];

/// Top-level run configuration, loaded from a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Named accounts, each pointing at a token file for the playlist source.
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,

    /// Playlists to archive, in order.
    pub playlists: Vec<PlaylistConfig>,

    /// Desired final container extension; `None` keeps whatever yt-dlp produced.
    #[serde(default)]
    pub final_format: Option<String>,

    /// Destination filename template with `{title}`, `{uploader}`,
    /// `{upload_date}`, and `{ext}` placeholders.
    #[serde(default)]
    pub filename_template: Option<String>,

    /// Format selection strictness for the extraction attempt plan.
    #[serde(default)]
    pub format_strictness: Strictness,

    /// Extra arguments passed through to every yt-dlp invocation.
    #[serde(default)]
    pub ytdlp_args: Vec<String>,

    /// JavaScript runtime hint for the extraction layer (`name:path`).
    #[serde(default)]
    pub js_runtime: Option<String>,

    /// Optional Telegram summary notification.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// One playlist-source account
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Path to the token file holding this account's API credential.
    pub token: PathBuf,
}

/// One subscribed playlist
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistConfig {
    pub playlist_id: String,

    /// Destination directory for finished files.
    pub folder: PathBuf,

    /// Name of the account used to talk to the playlist source.
    pub account: String,

    /// Remove the playlist entry at the source once its copy has settled.
    #[serde(default)]
    pub remove_after_download: bool,
}

/// Telegram notification settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl RunConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the run misbehave later.
    pub fn validate(&self) -> Result<()> {
        if self.playlists.is_empty() {
            return Err(VidvaultError::Config("no playlists configured".into()).into());
        }

        for playlist in &self.playlists {
            if playlist.playlist_id.is_empty() {
                return Err(VidvaultError::Config("playlist with empty id".into()).into());
            }
            if playlist.folder.as_os_str().is_empty() {
                return Err(VidvaultError::Config(format!(
                    "playlist {} has no destination folder",
                    playlist.playlist_id
                ))
                .into());
            }
            if !self.accounts.contains_key(&playlist.account) {
                return Err(VidvaultError::Config(format!(
                    "playlist {} references unknown account '{}'",
                    playlist.playlist_id, playlist.account
                ))
                .into());
            }
        }

        if let Some(ext) = &self.final_format {
            if !KNOWN_CONTAINERS.contains(&ext.as_str()) {
                return Err(VidvaultError::Config(format!(
                    "unknown final_format '{}' (expected one of {:?})",
                    ext, KNOWN_CONTAINERS
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "accounts": { "main": { "token": "/tokens/main.json" } },
            "playlists": [
                { "playlist_id": "PL123", "folder": "/media/archive", "account": "main" }
            ]
        }"#
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config: RunConfig = serde_json::from_str(minimal_json()).unwrap();
        config.validate().unwrap();

        assert!(config.final_format.is_none());
        assert!(config.filename_template.is_none());
        assert!(config.ytdlp_args.is_empty());
        assert_eq!(config.format_strictness, Strictness::Strict);
        assert!(!config.playlists[0].remove_after_download);
    }

    #[test]
    fn unknown_account_is_rejected() {
        let json = r#"{
            "playlists": [
                { "playlist_id": "PL123", "folder": "/media", "account": "ghost" }
            ]
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unknown account"));
    }

    #[test]
    fn unknown_final_format_is_rejected() {
        let mut config: RunConfig = serde_json::from_str(minimal_json()).unwrap();
        config.final_format = Some("avi".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_playlists_are_rejected() {
        let json = r#"{ "playlists": [] }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn strictness_parses_from_lowercase() {
        let json = r#"{
            "accounts": { "main": { "token": "/t" } },
            "playlists": [
                { "playlist_id": "PL1", "folder": "/m", "account": "main" }
            ],
            "format_strictness": "relaxed"
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.format_strictness, Strictness::Relaxed);
    }
}
