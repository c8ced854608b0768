//! Vidvault - Automated Playlist Video Archiver
//!
//! Walks every configured playlist, downloads what the ledger doesn't
//! already know, tags and repackages the results, and copies them into the
//! destination library while the next download is already running.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vidvault::archive::RunCoordinator;
use vidvault::extractor::YtDlpRunner;
use vidvault::notify::{Notifier, TelegramNotifier};
use vidvault::postprocess::{ContainerConverter, Ffmpeg, MetadataEmbedder};
use vidvault::source::build_sources;
use vidvault::utils::{EnginePaths, RunConfig};

#[derive(Parser)]
#[command(about = "Archive subscribed playlists into a local library")]
struct Args {
    /// Path to the run configuration file
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = RunConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    let paths = EnginePaths::resolve();
    paths.ensure()?;

    let runner = YtDlpRunner::new(&paths, &config)
        .context("install yt-dlp (pip install yt-dlp, or brew install yt-dlp)")?;
    let ffmpeg = Ffmpeg::locate().context("install ffmpeg")?;

    let embedder = MetadataEmbedder::new(ffmpeg.clone(), paths.thumbs_dir.clone())?;
    let converter = ContainerConverter::new(ffmpeg);
    let sources = build_sources(&config);

    let notifier: Option<Box<dyn Notifier>> = match &config.telegram {
        Some(telegram) => Some(Box::new(TelegramNotifier::new(
            telegram.bot_token.clone(),
            telegram.chat_id.clone(),
        )?)),
        None => None,
    };

    let coordinator = RunCoordinator::new(
        config,
        paths,
        Arc::new(runner),
        sources,
        embedder,
        converter,
        notifier,
    );

    let summary = coordinator.run().await?;
    info!(
        "{} archived, {} failed",
        summary.successes.len(),
        summary.failures.len()
    );

    Ok(())
}
