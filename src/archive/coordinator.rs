//! Top-level run sequencer
//!
//! One run: acquire the lock, walk every configured playlist, push each
//! pending item through extract -> embed -> convert, hand the finished file
//! to a background copy worker, and join all workers before summarizing.
//! Extraction stays strictly sequential — one in flight, ever — because a
//! bulk-download signature is what triggers source-side throttling.

use crate::archive::context::{RunContext, RunSummary};
use crate::archive::copier::{spawn_copy, CopyJob, RemovalRequest};
use crate::database::{initialize_database, Ledger};
use crate::extractor::{AttemptPlan, ExtractionLayer, FallbackEngine};
use crate::notify::{format_summary, Notifier};
use crate::postprocess::{ContainerConverter, MetadataEmbedder};
use crate::source::PlaylistSource;
use crate::utils::error::VidvaultError;
use crate::utils::filename::destination_filename;
use crate::utils::{EnginePaths, RunConfig, RunLock};
use anyhow::Result;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Drives one archiver run end to end
pub struct RunCoordinator {
    config: RunConfig,
    paths: EnginePaths,
    engine: FallbackEngine,
    sources: HashMap<String, Arc<dyn PlaylistSource>>,
    embedder: MetadataEmbedder,
    converter: ContainerConverter,
    notifier: Option<Box<dyn Notifier>>,
}

impl RunCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RunConfig,
        paths: EnginePaths,
        layer: Arc<dyn ExtractionLayer>,
        sources: HashMap<String, Arc<dyn PlaylistSource>>,
        embedder: MetadataEmbedder,
        converter: ContainerConverter,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            config,
            paths,
            engine: FallbackEngine::new(layer),
            sources,
            embedder,
            converter,
            notifier,
        }
    }

    /// Execute one run. A lock already held by another run skips the whole
    /// run; no other failure class aborts it.
    pub async fn run(&self) -> Result<RunSummary> {
        let _lock = match RunLock::acquire(&self.paths.lock_file) {
            Ok(lock) => lock,
            Err(_) => {
                warn!("Run lock present — skipping run");
                return Ok(RunSummary::default());
            }
        };

        let pool = initialize_database(&self.paths.db_path).await?;
        let ledger = Ledger::new(pool, self.paths.db_path.clone());
        let ctx = RunContext::new();
        let plan = AttemptPlan::build(self.config.format_strictness);

        let mut copies: Vec<JoinHandle<()>> = Vec::new();
        let mut dead_accounts: HashSet<String> = HashSet::new();

        for playlist in &self.config.playlists {
            if dead_accounts.contains(&playlist.account) {
                ctx.record_failure(format!("{} (auth)", playlist.playlist_id))
                    .await;
                continue;
            }

            let Some(source) = self.sources.get(&playlist.account) else {
                error!(
                    "No usable source client for account '{}'; skipping playlist {}",
                    playlist.account, playlist.playlist_id
                );
                ctx.record_failure(format!("{} (auth)", playlist.playlist_id))
                    .await;
                continue;
            };

            let entries = match source.list_items(&playlist.playlist_id).await {
                Ok(entries) => entries,
                Err(e) if is_auth_error(&e) => {
                    error!(
                        "Authorization failed for account '{}' on playlist {}: {:#}",
                        playlist.account, playlist.playlist_id, e
                    );
                    dead_accounts.insert(playlist.account.clone());
                    ctx.record_failure(format!("{} (auth)", playlist.playlist_id))
                        .await;
                    continue;
                }
                Err(e) => {
                    error!("Playlist fetch failed for {}: {:#}", playlist.playlist_id, e);
                    ctx.record_failure(playlist.playlist_id.clone()).await;
                    continue;
                }
            };

            for entry in entries {
                let video_id = entry.video_id.clone();

                if ledger.contains(&video_id).await? {
                    continue;
                }

                let meta = match source.video_metadata(&video_id).await {
                    Ok(Some(meta)) => meta,
                    Ok(None) => {
                        warn!("Skipping {}: no metadata", video_id);
                        continue;
                    }
                    Err(e) if is_auth_error(&e) => {
                        error!(
                            "Authorization failed for account '{}' on video {}: {:#}",
                            playlist.account, video_id, e
                        );
                        dead_accounts.insert(playlist.account.clone());
                        ctx.record_failure(format!("{} (auth)", video_id)).await;
                        break;
                    }
                    Err(e) => {
                        error!("Metadata fetch failed for {}: {:#}", video_id, e);
                        continue;
                    }
                };

                info!("START download: {} ({})", video_id, meta.title);
                let scratch_dir = self.paths.scratch_dir(&video_id);

                let mut local_file = match self
                    .engine
                    .download(&video_id, &meta.url, &scratch_dir, &plan)
                    .await
                {
                    Ok(path) => path,
                    Err(e) => {
                        warn!("Download FAILED: {} ({:#})", video_id, e);
                        ctx.record_failure(meta.title.clone()).await;
                        let _ = std::fs::remove_dir_all(&scratch_dir);
                        continue;
                    }
                };

                if let Err(e) = self.embedder.embed(&local_file, &meta, &video_id).await {
                    warn!("Metadata embedding failed for {}: {:#}", video_id, e);
                }

                if let Some(desired_ext) = &self.config.final_format {
                    local_file = self.converter.convert(&local_file, desired_ext).await;
                }

                let ext = local_file
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("webm")
                    .to_string();
                let file_name = destination_filename(
                    self.config.filename_template.as_deref(),
                    &meta,
                    &video_id,
                    &ext,
                );
                let destination = playlist.folder.join(&file_name);

                let removal = if playlist.remove_after_download {
                    entry
                        .playlist_item_id
                        .clone()
                        .map(|playlist_item_id| RemovalRequest {
                            playlist_item_id,
                            source: Arc::clone(source),
                        })
                } else {
                    None
                };

                copies.push(spawn_copy(
                    CopyJob {
                        video_id,
                        playlist_id: playlist.playlist_id.clone(),
                        display_name: file_name,
                        source_file: local_file,
                        destination,
                        scratch_dir,
                        removal,
                    },
                    ctx.clone(),
                    ledger.db_path().to_path_buf(),
                ));
                info!("Copy started in background — next download begins");
            }
        }

        // The run is not complete until every outstanding copy has settled.
        join_all(copies).await;

        let summary = ctx.into_summary().await;
        info!(
            "Run complete: {} succeeded, {} failed",
            summary.successes.len(),
            summary.failures.len()
        );

        if let Some(notifier) = &self.notifier {
            if let Some(text) = format_summary(&summary) {
                if let Err(e) = notifier.notify(&text).await {
                    error!("Summary notification failed: {:#}", e);
                }
            }
        }

        Ok(summary)
    }
}

fn is_auth_error(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<VidvaultError>(),
        Some(VidvaultError::Auth(_))
    )
}
