//! Multi-profile retry/fallback engine
//!
//! Drives the extraction layer through a fixed plan: up to [`MAX_PASSES`]
//! full passes over the profile chain, [`PROFILE_RETRIES`] tries per
//! profile. Every attempt starts from a wiped scratch directory — a frozen
//! or undersized partial means an active block, never something worth
//! resuming. The first attempt that leaves a usable output file wins.

use crate::extractor::partial::is_partial_stalled;
use crate::extractor::profiles::{profile_chain, AttemptPlan};
use crate::extractor::traits::{ExtractionLayer, FetchRequest};
use crate::utils::error::VidvaultError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Hard cap on full passes over the profile chain per item.
pub const MAX_PASSES: u32 = 4;

/// Tries per profile before moving to the next one.
pub const PROFILE_RETRIES: u32 = 2;

/// Container we scan for first.
pub const PREFERRED_EXTENSION: &str = "webm";

/// Container accepted when no preferred output exists.
pub const FALLBACK_EXTENSION: &str = "mp4";

/// Sequencer over the extraction layer
pub struct FallbackEngine {
    layer: Arc<dyn ExtractionLayer>,
}

impl FallbackEngine {
    pub fn new(layer: Arc<dyn ExtractionLayer>) -> Self {
        Self { layer }
    }

    /// Produce a finished local media file for one item, or fail permanently
    /// for this run.
    pub async fn download(
        &self,
        video_id: &str,
        url: &str,
        scratch_dir: &Path,
        plan: &AttemptPlan,
    ) -> Result<PathBuf> {
        let format_selector = plan.format_selector();

        for pass in 1..=MAX_PASSES {
            info!("[{}] Download attempt {}/{}", video_id, pass, MAX_PASSES);

            for profile in profile_chain() {
                info!("[{}] Trying extractor client: {}", video_id, profile.client);

                for _ in 0..PROFILE_RETRIES {
                    if scratch_dir.exists() && is_partial_stalled(scratch_dir, video_id) {
                        warn!("[{}] Stuck partial detected, wiping scratch dir", video_id);
                    }

                    // Never resume a suspect partial: every attempt starts clean.
                    let _ = std::fs::remove_dir_all(scratch_dir);
                    std::fs::create_dir_all(scratch_dir)?;

                    let request = FetchRequest {
                        url,
                        scratch_dir,
                        format_selector: &format_selector,
                        profile,
                    };

                    if let Err(e) = self.layer.extract(&request).await {
                        warn!("[{}] {} failed: {:#}", video_id, profile.client, e);
                        continue;
                    }

                    if let Some(found) = find_output(scratch_dir, video_id) {
                        info!(
                            "[{}] SUCCESS via {} -> {}",
                            video_id,
                            profile.client,
                            found.display()
                        );
                        return Ok(found);
                    }

                    warn!(
                        "[{}] Extractor {} produced no usable output",
                        video_id, profile.client
                    );
                }
            }

            warn!("[{}] All extractor clients failed this pass", video_id);
        }

        error!("[{}] PERMANENT FAILURE after {} passes", video_id, MAX_PASSES);
        Err(VidvaultError::ExtractionExhausted(video_id.to_string()).into())
    }
}

/// Scan the scratch directory for a finished output named after the item,
/// preferring the higher-fidelity container. First match wins.
fn find_output(scratch_dir: &Path, video_id: &str) -> Option<PathBuf> {
    for ext in [PREFERRED_EXTENSION, FALLBACK_EXTENSION] {
        let suffix = format!(".{}", ext);
        let entries = std::fs::read_dir(scratch_dir).ok()?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(video_id) && name.ends_with(&suffix) {
                return Some(entry.path());
            }
        }
    }
    None
}
