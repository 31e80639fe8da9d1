//! Persisted batch progress.
//!
//! The checkpoint is the only record of how far the job has got: the URL
//! list itself carries no processed marker. It lives under
//! [`NEXT_BATCH_KEY`] until the final batch finishes, at which point a
//! [`CompletionRecord`] is written under [`COMPLETION_KEY`] and the
//! checkpoint is removed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;
use crate::store::KeyValueStore;

/// Key holding the pending [`BatchCheckpoint`].
pub const NEXT_BATCH_KEY: &str = "nextBatch";

/// Key holding the [`CompletionRecord`] once every batch has run.
pub const COMPLETION_KEY: &str = "processingComplete";

/// Progress marker read at the start of every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchCheckpoint {
    /// Next batch to run (0-based).
    pub current_batch: u64,
    pub total_batches: u64,
    /// URLs covered by all batches before `current_batch`.
    #[serde(default)]
    pub processed_count: u64,
    /// `"processed/total"`.
    pub progress: String,
    pub progress_percent: u8,
    /// Earliest time the next run is expected.
    #[serde(default)]
    pub next_run_at: Option<String>,
    pub remaining_urls: u64,
    /// Window size in force when this checkpoint was written; 0 if the
    /// writer did not record it.
    #[serde(default)]
    pub urls_per_batch: usize,
    #[serde(default)]
    pub url_list_digest: Option<String>,
}

impl BatchCheckpoint {
    /// Checkpoint used when nothing has been persisted yet.
    pub fn initial(current_batch: u64, urls_per_batch: usize) -> Self {
        Self {
            current_batch,
            total_batches: 0,
            processed_count: 0,
            progress: String::new(),
            progress_percent: 0,
            next_run_at: None,
            remaining_urls: 0,
            urls_per_batch,
            url_list_digest: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    Completed,
}

/// Terminal marker written after the last batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub total_processed: u64,
    pub total_batches: u64,
    pub completed_at: String,
    pub status: CompletionStatus,
}

/// SHA-256 over the URL list, one URL per line.
pub fn digest_url_list(urls: &[String]) -> String {
    let mut hasher = Sha256::new();
    for url in urls {
        hasher.update(url.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

pub async fn load_checkpoint<S>(store: &S) -> Result<Option<BatchCheckpoint>, Error>
where
    S: KeyValueStore + ?Sized,
{
    match store.get_value(NEXT_BATCH_KEY).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save_checkpoint<S>(store: &S, checkpoint: &BatchCheckpoint) -> Result<(), Error>
where
    S: KeyValueStore + ?Sized,
{
    store.set_value(NEXT_BATCH_KEY, &serde_json::to_value(checkpoint)?).await
}

pub async fn load_completion<S>(store: &S) -> Result<Option<CompletionRecord>, Error>
where
    S: KeyValueStore + ?Sized,
{
    match store.get_value(COMPLETION_KEY).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Write the completion record and retire the checkpoint.
pub async fn save_completion<S>(store: &S, record: &CompletionRecord) -> Result<(), Error>
where
    S: KeyValueStore + ?Sized,
{
    store.set_value(COMPLETION_KEY, &serde_json::to_value(record)?).await?;
    store.delete_value(NEXT_BATCH_KEY).await?;
    Ok(())
}

/// Forget all progress. Returns true if anything was removed.
pub async fn clear_progress<S>(store: &S) -> Result<bool, Error>
where
    S: KeyValueStore + ?Sized,
{
    let had_checkpoint = store.delete_value(NEXT_BATCH_KEY).await?;
    let had_completion = store.delete_value(COMPLETION_KEY).await?;
    Ok(had_checkpoint || had_completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StateDb;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://example.com/{i}")).collect()
    }

    #[test]
    fn test_checkpoint_wire_format() {
        let cp = BatchCheckpoint {
            current_batch: 1,
            total_batches: 2,
            processed_count: 5,
            progress: "5/7".into(),
            progress_percent: 71,
            next_run_at: Some("2025-01-20T00:01:00.000Z".into()),
            remaining_urls: 2,
            urls_per_batch: 5,
            url_list_digest: None,
        };
        let value = serde_json::to_value(&cp).unwrap();
        assert_eq!(value["currentBatch"], 1);
        assert_eq!(value["progressPercent"], 71);
        assert_eq!(value["nextRunAt"], "2025-01-20T00:01:00.000Z");
        assert_eq!(value["remainingUrls"], 2);
    }

    #[test]
    fn test_checkpoint_without_window_size_parses() {
        let value = serde_json::json!({
            "currentBatch": 3,
            "totalBatches": 200,
            "progress": "15/1000",
            "progressPercent": 2,
            "nextRunAt": "2025-01-20T00:01:00.000Z",
            "remainingUrls": 985
        });
        let cp: BatchCheckpoint = serde_json::from_value(value).unwrap();
        assert_eq!(cp.current_batch, 3);
        assert_eq!(cp.urls_per_batch, 0);
        assert_eq!(cp.processed_count, 0);
        assert!(cp.url_list_digest.is_none());
    }

    #[test]
    fn test_completion_status_wire_format() {
        let json = serde_json::to_string(&CompletionStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }

    #[test]
    fn test_digest_stable_and_order_sensitive() {
        let a = urls(3);
        let mut b = a.clone();
        b.reverse();
        assert_eq!(digest_url_list(&a), digest_url_list(&a));
        assert_ne!(digest_url_list(&a), digest_url_list(&b));
        assert_eq!(digest_url_list(&a).len(), 64);
    }

    #[tokio::test]
    async fn test_absent_checkpoint_reads_none() {
        let db = StateDb::open_in_memory().await.unwrap();
        assert!(load_checkpoint(&db).await.unwrap().is_none());
        assert!(load_completion(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkpoint_roundtrip_and_completion_replaces_it() {
        let db = StateDb::open_in_memory().await.unwrap();
        let cp = BatchCheckpoint::initial(2, 5);
        save_checkpoint(&db, &cp).await.unwrap();
        assert_eq!(load_checkpoint(&db).await.unwrap(), Some(cp));

        let done = CompletionRecord {
            total_processed: 7,
            total_batches: 2,
            completed_at: "2025-01-20T00:00:00.000Z".into(),
            status: CompletionStatus::Completed,
        };
        save_completion(&db, &done).await.unwrap();
        assert!(load_checkpoint(&db).await.unwrap().is_none());
        assert_eq!(load_completion(&db).await.unwrap(), Some(done));

        assert!(clear_progress(&db).await.unwrap());
        assert!(load_completion(&db).await.unwrap().is_none());
        assert!(!clear_progress(&db).await.unwrap());
    }
}
