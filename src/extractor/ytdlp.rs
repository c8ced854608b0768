//! yt-dlp invocation
//!
//! Builds and runs one yt-dlp process per extraction attempt. The binary is
//! located once at startup; each invocation gets the attempt's profile
//! headers, player-client hint, and format selector, plus any passthrough
//! arguments from the run configuration.

use crate::extractor::traits::{ExtractionLayer, FetchRequest};
use crate::utils::error::VidvaultError;
use crate::utils::{EnginePaths, RunConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

/// Environment variable overriding the JavaScript runtime hint.
pub const JS_RUNTIME_ENV: &str = "VIDVAULT_JS_RUNTIME";

/// Per-attempt socket timeout handed to yt-dlp, in seconds.
const SOCKET_TIMEOUT_SECS: u32 = 120;

/// Extraction layer that shells out to the yt-dlp binary
pub struct YtDlpRunner {
    ytdlp_path: PathBuf,
    temp_dir: PathBuf,
    js_runtime: Option<String>,
    extra_args: Vec<String>,
}

impl YtDlpRunner {
    /// Locate yt-dlp and capture the invocation options for this run.
    pub fn new(paths: &EnginePaths, config: &RunConfig) -> Result<Self> {
        let ytdlp_path = find_ytdlp().ok_or(VidvaultError::YtDlpNotFound)?;
        info!("Found yt-dlp at: {}", ytdlp_path.display());

        Ok(Self {
            ytdlp_path,
            temp_dir: paths.ytdlp_temp_dir.clone(),
            js_runtime: resolve_js_runtime(config.js_runtime.as_deref()),
            extra_args: config.ytdlp_args.clone(),
        })
    }

    fn build_args(&self, request: &FetchRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        let mut outtmpl = OsString::from(request.scratch_dir.as_os_str());
        outtmpl.push("/%(id)s.%(ext)s");
        args.push("-o".into());
        args.push(outtmpl);

        let mut temp_path = OsString::from("temp:");
        temp_path.push(self.temp_dir.as_os_str());
        args.push("--paths".into());
        args.push(temp_path);

        args.push("-f".into());
        args.push(request.format_selector.into());

        args.push("--quiet".into());
        args.push("--no-warnings".into());
        args.push("--continue".into());
        args.push("--socket-timeout".into());
        args.push(SOCKET_TIMEOUT_SECS.to_string().into());
        args.push("--retries".into());
        args.push("5".into());
        args.push("--force-ipv4".into());

        for (key, value) in request.profile.headers {
            args.push("--add-headers".into());
            args.push(format!("{}:{}", key, value).into());
        }

        args.push("--extractor-args".into());
        args.push(format!("youtube:player_client={}", request.profile.client).into());

        args.push("--remote-components".into());
        args.push("ejs:github".into());

        if let Some(runtime) = &self.js_runtime {
            args.push("--js-runtime".into());
            args.push(runtime.into());
        }

        for extra in &self.extra_args {
            args.push(extra.into());
        }

        args.push(request.url.into());
        args
    }
}

#[async_trait]
impl ExtractionLayer for YtDlpRunner {
    async fn extract(&self, request: &FetchRequest<'_>) -> Result<()> {
        let args = self.build_args(request);
        debug!(
            "Invoking yt-dlp via {} client for {}",
            request.profile.client, request.url
        );

        let output = AsyncCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidvaultError::Extraction(stderr.trim().to_string()).into());
        }

        Ok(())
    }
}

/// Find the yt-dlp binary: PATH first, then common installation locations.
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        return Some(path);
    }

    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];
    for candidate in common_paths {
        let path = PathBuf::from(candidate);
        if path.is_file() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".local").join("bin").join("yt-dlp");
        if path.is_file() {
            return Some(path);
        }
    }

    warn!("yt-dlp not found in PATH or common locations");
    None
}

/// Resolve the JavaScript runtime hint: explicit config wins, then the
/// environment, then whichever of deno/node is installed.
pub fn resolve_js_runtime(configured: Option<&str>) -> Option<String> {
    if let Some(runtime) = configured {
        return Some(runtime.to_string());
    }
    if let Ok(runtime) = std::env::var(JS_RUNTIME_ENV) {
        if !runtime.is_empty() {
            return Some(runtime);
        }
    }

    if let Ok(deno) = which::which("deno") {
        return Some(format!("deno:{}", deno.display()));
    }
    if let Ok(node) = which::which("node") {
        return Some(format!("node:{}", node.display()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::profiles::profile_chain;
    use std::path::Path;

    fn runner() -> YtDlpRunner {
        YtDlpRunner {
            ytdlp_path: PathBuf::from("/usr/bin/yt-dlp"),
            temp_dir: PathBuf::from("/data/tmp/yt-dlp"),
            js_runtime: Some("deno:/usr/bin/deno".to_string()),
            extra_args: vec!["--no-playlist".to_string()],
        }
    }

    fn args_for(profile_index: usize) -> Vec<String> {
        let profile = &profile_chain()[profile_index];
        let request = FetchRequest {
            url: "https://www.youtube.com/watch?v=abc",
            scratch_dir: Path::new("/data/temp_downloads/abc"),
            format_selector: "best",
            profile,
        };
        runner()
            .build_args(&request)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn args_carry_format_selector_and_output_template() {
        let args = args_for(0);
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "best");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "/data/temp_downloads/abc/%(id)s.%(ext)s");
    }

    #[test]
    fn args_carry_profile_headers_and_client_hint() {
        let args = args_for(0);
        assert!(args
            .iter()
            .any(|a| a.starts_with("User-Agent:com.google.android.youtube")));
        assert!(args.contains(&"youtube:player_client=android".to_string()));
    }

    #[test]
    fn args_end_with_url_after_passthrough() {
        let args = args_for(2);
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
        assert!(args.contains(&"youtube:player_client=web".to_string()));
    }

    #[test]
    fn js_runtime_config_wins_over_discovery() {
        assert_eq!(
            resolve_js_runtime(Some("node:/opt/node")).as_deref(),
            Some("node:/opt/node")
        );
    }
}
