//! Extraction profiles and the per-item attempt plan
//!
//! The source throttles and blocks client identities unevenly, so attempts
//! rotate through a fixed chain of simulated clients, each with a header set
//! matching what that client would really send. Order matters: the chain
//! starts with the identity that historically survives blocks longest and
//! ends with the plain web client, which is the first to get cut off.

use serde::{Deserialize, Serialize};

/// One simulated client identity with its matching request headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionProfile {
    /// Player client hint passed to the extraction layer.
    pub client: &'static str,
    /// Request headers sent alongside, plausible for this client.
    pub headers: &'static [(&'static str, &'static str)],
}

const ANDROID_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "com.google.android.youtube/19.42.37 (Linux; Android 14)",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
];

const TV_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (SmartTV; Linux; Tizen 6.5) AppleWebKit/537.36",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
];

const WEB_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Safari/605.1.15",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
];

/// Fixed preference order: most resilient first, most easily blocked last.
const PROFILE_CHAIN: &[ExtractionProfile] = &[
    ExtractionProfile {
        client: "android",
        headers: ANDROID_HEADERS,
    },
    ExtractionProfile {
        client: "tv_embedded",
        headers: TV_HEADERS,
    },
    ExtractionProfile {
        client: "web",
        headers: WEB_HEADERS,
    },
];

/// The profile chain in its fixed, deterministic order.
pub fn profile_chain() -> &'static [ExtractionProfile] {
    PROFILE_CHAIN
}

/// How aggressively the attempt plan constrains formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Prefer matching-container streams with resolution caps.
    #[default]
    Strict,
    /// Accept whatever pairing is available, capped at 1080p.
    Relaxed,
}

/// One step of the attempt plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptStep {
    /// Extractor-specific client override; `None` defers to the profile
    /// driving the attempt.
    pub player_client: Option<String>,
    /// Format selector for this step.
    pub format: String,
}

/// Ordered extraction attempts, built once per item
///
/// Whatever the strictness, the plan always carries a step with no extractor
/// override and a final generic `best` step, so exhausting the constrained
/// selectors can never leave an item with nothing to try.
#[derive(Debug, Clone)]
pub struct AttemptPlan {
    steps: Vec<AttemptStep>,
}

impl AttemptPlan {
    pub fn build(strictness: Strictness) -> Self {
        let mut steps = Vec::new();

        match strictness {
            Strictness::Strict => {
                for format in [
                    // Preferred: WebM (VP9/Opus)
                    "bestvideo[ext=webm][height<=1080]+bestaudio[ext=webm]",
                    "bestvideo[ext=webm][height<=720]+bestaudio[ext=webm]",
                    // Fallback: MP4 (H.264/AAC)
                    "bestvideo[ext=mp4][height<=1080]+bestaudio[ext=m4a]",
                    "bestvideo[ext=mp4][height<=720]+bestaudio[ext=m4a]",
                ] {
                    steps.push(AttemptStep {
                        player_client: None,
                        format: format.to_string(),
                    });
                }
            }
            Strictness::Relaxed => {
                steps.push(AttemptStep {
                    player_client: None,
                    format: "bestvideo[height<=1080]+bestaudio".to_string(),
                });
            }
        }

        // Last resort regardless of mode
        steps.push(AttemptStep {
            player_client: None,
            format: "best".to_string(),
        });

        Self { steps }
    }

    pub fn steps(&self) -> &[AttemptStep] {
        &self.steps
    }

    /// Combined selector handed to the extraction layer; alternatives are
    /// tried left to right within a single attempt.
    pub fn format_selector(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.format.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}
