use crate::extractor::profiles::ExtractionProfile;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// One extraction attempt handed to the layer
#[derive(Debug)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    /// Per-item scratch directory the layer writes into.
    pub scratch_dir: &'a Path,
    /// Combined format selector with left-to-right fallback alternatives.
    pub format_selector: &'a str,
    /// Client identity driving this attempt.
    pub profile: &'a ExtractionProfile,
}

/// Seam over the unreliable extraction layer
///
/// The production implementation shells out to yt-dlp; tests substitute a
/// fake that drops files into the scratch directory. An `Ok` return means
/// only that the layer finished without raising — whether a usable file
/// actually landed is the fallback engine's judgement.
#[async_trait]
pub trait ExtractionLayer: Send + Sync {
    async fn extract(&self, request: &FetchRequest<'_>) -> Result<()>;
}
