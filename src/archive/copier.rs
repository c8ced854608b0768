//! Background copy worker
//!
//! The relocation of a finished file runs on its own task so the next item's
//! extraction can start immediately. The completion step owns everything
//! that must happen exactly once per item: result recording, the ledger
//! insert over a fresh connection, optional source-side removal, and scratch
//! cleanup. A copy that fails leaves no ledger row, so the item is retried
//! in full on the next run.

use crate::archive::context::RunContext;
use crate::database::{DownloadRecord, Ledger};
use crate::source::PlaylistSource;
use anyhow::Result;
use chrono::Utc;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Source-side removal to perform after a successful copy
pub struct RemovalRequest {
    pub playlist_item_id: String,
    pub source: Arc<dyn PlaylistSource>,
}

/// Everything one copy worker needs
pub struct CopyJob {
    pub video_id: String,
    pub playlist_id: String,
    /// Name recorded in the run summary.
    pub display_name: String,
    pub source_file: PathBuf,
    pub destination: PathBuf,
    pub scratch_dir: PathBuf,
    pub removal: Option<RemovalRequest>,
}

/// Start the relocation in the background and return its handle for the
/// coordinator's end-of-run join.
pub fn spawn_copy(job: CopyJob, ctx: RunContext, db_path: PathBuf) -> JoinHandle<()> {
    tokio::spawn(async move {
        match copy_with_metadata(&job.source_file, &job.destination).await {
            Ok(()) => {
                info!("Copy OK -> {}", job.destination.display());
                ctx.record_success(job.display_name.clone()).await;

                let record = DownloadRecord {
                    video_id: job.video_id.clone(),
                    playlist_id: job.playlist_id.clone(),
                    downloaded_at: Utc::now(),
                    filepath: job.destination.clone(),
                };
                if let Err(e) = Ledger::record_download(&db_path, &record).await {
                    // Copy landed but the dedup row didn't; worst case is a
                    // duplicate download on a future run.
                    error!("Ledger insert failed for {}: {:#}", job.video_id, e);
                }

                if let Some(removal) = &job.removal {
                    if let Err(e) = removal.source.remove_item(&removal.playlist_item_id).await {
                        error!(
                            "Failed removing {} from source playlist: {:#}",
                            job.video_id, e
                        );
                    }
                }
            }
            Err(e) => {
                error!("Copy FAILED for {}: {:#}", job.video_id, e);
                ctx.record_failure(job.display_name.clone()).await;
            }
        }

        let _ = tokio::fs::remove_dir_all(&job.scratch_dir).await;
    })
}

/// Copy bytes and carry the source mtime over to the destination.
async fn copy_with_metadata(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(src, dst).await?;

    let src_meta = tokio::fs::metadata(src).await?;
    filetime::set_file_mtime(dst, FileTime::from_last_modification_time(&src_meta))?;

    Ok(())
}
