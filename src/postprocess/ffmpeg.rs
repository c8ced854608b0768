//! ffmpeg collaborator
//!
//! All tagging and remuxing goes through one external ffmpeg process per
//! operation. Success is judged by exit status alone — never assumed.

use crate::utils::error::VidvaultError;
use anyhow::Result;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// Handle to a located ffmpeg binary
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    path: PathBuf,
}

impl Ffmpeg {
    /// Locate ffmpeg on the PATH.
    pub fn locate() -> Result<Self> {
        let path = which::which("ffmpeg").map_err(|_| VidvaultError::FfmpegNotFound)?;
        debug!("Found ffmpeg at: {}", path.display());
        Ok(Self { path })
    }

    /// Use an explicit binary path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Run one ffmpeg invocation to completion, failing on non-zero exit.
    pub async fn run(&self, args: &[OsString]) -> Result<()> {
        let output = AsyncCommand::new(&self.path)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" | ");
            anyhow::bail!("ffmpeg exited with {}: {}", output.status, tail);
        }

        Ok(())
    }
}
