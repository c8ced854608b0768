//! Optional container repackaging
//!
//! Stream-copy remux into the requested container after tagging. The one
//! refused direction is mp4 -> webm: a stream copy across those containers
//! routinely yields an invalid or silently broken file, so the original is
//! kept instead. Conversion failure is never fatal — the item proceeds to
//! the copy stage in whatever container it already has.

use crate::postprocess::ffmpeg::Ffmpeg;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Repackages finished files via stream copy
pub struct ContainerConverter {
    ffmpeg: Ffmpeg,
}

impl ContainerConverter {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }

    /// Convert `input` to the desired extension, returning the canonical
    /// path afterwards — the new file on success, the untouched original on
    /// a no-op, refusal, or failure.
    pub async fn convert(&self, input: &Path, desired_ext: &str) -> PathBuf {
        let current_ext = input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let desired_ext = desired_ext.to_ascii_lowercase();

        if current_ext == desired_ext {
            return input.to_path_buf();
        }

        if current_ext == "mp4" && desired_ext == "webm" {
            warn!(
                "Refusing mp4 -> webm container copy for {}; consider final_format=mp4",
                input.display()
            );
            return input.to_path_buf();
        }

        let output = input.with_extension(&desired_ext);
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            input.into(),
            "-c".into(),
            "copy".into(),
            output.as_os_str().into(),
        ];

        match self.ffmpeg.run(&args).await {
            Ok(()) => {
                if let Err(e) = std::fs::remove_file(input) {
                    warn!("Could not remove {} after remux: {}", input.display(), e);
                }
                info!("Remuxed {} -> {}", input.display(), output.display());
                output
            }
            Err(e) => {
                warn!("Container conversion failed for {}: {:#}", input.display(), e);
                let _ = std::fs::remove_file(&output);
                input.to_path_buf()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn converter() -> ContainerConverter {
        // Never reached by the refusal/no-op paths under test.
        ContainerConverter::new(Ffmpeg::new(PathBuf::from("/nonexistent/ffmpeg")))
    }

    #[tokio::test]
    async fn matching_extension_is_a_noop() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("vid.webm");
        std::fs::write(&file, b"media").unwrap();

        let result = converter().convert(&file, "webm").await;
        assert_eq!(result, file);
        assert_eq!(std::fs::read(&file).unwrap(), b"media");
    }

    #[tokio::test]
    async fn mp4_to_webm_is_refused() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("vid.mp4");
        std::fs::write(&file, b"media").unwrap();

        let result = converter().convert(&file, "webm").await;

        assert_eq!(result, file, "original stays canonical");
        assert_eq!(std::fs::read(&file).unwrap(), b"media");
        assert!(
            !temp.path().join("vid.webm").exists(),
            "no webm output may be produced"
        );
    }

    #[tokio::test]
    async fn failed_remux_retains_original() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("vid.webm");
        std::fs::write(&file, b"media").unwrap();

        // ffmpeg binary does not exist, so the remux attempt fails.
        let result = converter().convert(&file, "mkv").await;

        assert_eq!(result, file);
        assert_eq!(std::fs::read(&file).unwrap(), b"media");
        assert!(!temp.path().join("vid.mkv").exists());
    }

    #[tokio::test]
    async fn extension_comparison_ignores_case() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("vid.WEBM");
        std::fs::write(&file, b"media").unwrap();

        let result = converter().convert(&file, "webm").await;
        assert_eq!(result, file);
    }
}
