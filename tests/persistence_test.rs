//! Ledger persistence behavior across connections and runs.

use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tempfile::TempDir;
use vidvault::database::{initialize_database, DownloadRecord, Ledger};

fn record(video_id: &str) -> DownloadRecord {
    DownloadRecord {
        video_id: video_id.to_string(),
        playlist_id: "PL1".to_string(),
        downloaded_at: Utc.with_ymd_and_hms(2023, 1, 15, 12, 0, 0).unwrap(),
        filepath: PathBuf::from("/library/Video.webm"),
    }
}

#[tokio::test]
async fn initialization_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("db.sqlite");

    initialize_database(&db_path).await.unwrap();
    let pool = initialize_database(&db_path).await.unwrap();
    let ledger = Ledger::new(pool, db_path);

    assert_eq!(ledger.len().await.unwrap(), 0);
}

#[tokio::test]
async fn fresh_connection_inserts_are_visible_to_the_pool() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("db.sqlite");
    let pool = initialize_database(&db_path).await.unwrap();
    let ledger = Ledger::new(pool, db_path.clone());

    assert!(!ledger.contains("vid123").await.unwrap());

    // Insert path used by copy completions: its own connection, not the pool
    Ledger::record_download(&db_path, &record("vid123"))
        .await
        .unwrap();

    assert!(ledger.contains("vid123").await.unwrap());

    let fetched = ledger.get("vid123").await.unwrap().unwrap();
    assert_eq!(fetched.playlist_id, "PL1");
    assert_eq!(fetched.filepath, PathBuf::from("/library/Video.webm"));
    assert_eq!(
        fetched.downloaded_at,
        Utc.with_ymd_and_hms(2023, 1, 15, 12, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn duplicate_insert_is_rejected_by_the_primary_key() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("db.sqlite");
    initialize_database(&db_path).await.unwrap();

    Ledger::record_download(&db_path, &record("vid123"))
        .await
        .unwrap();
    let second = Ledger::record_download(&db_path, &record("vid123")).await;

    assert!(second.is_err(), "video_id is the unique key");
}

#[tokio::test]
async fn concurrent_completions_each_land_their_row() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("db.sqlite");
    let pool = initialize_database(&db_path).await.unwrap();
    let ledger = Ledger::new(pool, db_path.clone());

    let mut handles = Vec::new();
    for i in 0..8 {
        let db_path = db_path.clone();
        handles.push(tokio::spawn(async move {
            Ledger::record_download(&db_path, &record(&format!("vid{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.len().await.unwrap(), 8);
}
