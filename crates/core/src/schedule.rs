//! Batch window arithmetic.
//!
//! `start = current_batch * window`, `end = min(start + window, len)`.
//! A run processes `urls[start..end]`; the batch is final when
//! `end >= len`. A checkpoint pointing past the end of the list yields an
//! empty, final slice so a job whose list shrank completes instead of failing.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::checkpoint::{BatchCheckpoint, CompletionRecord, CompletionStatus, digest_url_list};
use crate::config::ConfigError;
use crate::record::timestamp;

/// What to persist once the current batch has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextState {
    Advance(BatchCheckpoint),
    Complete(CompletionRecord),
}

/// The slice assigned to this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan<'a> {
    /// 0-based index of the batch being run.
    pub batch_index: u64,
    pub start: usize,
    pub end: usize,
    pub urls: &'a [String],
    pub total: usize,
    pub is_final: bool,
    pub next: NextState,
}

impl BatchPlan<'_> {
    /// 1-based batch number used in dataset rows and logs.
    pub fn batch_number(&self) -> u64 {
        self.batch_index + 1
    }
}

/// Splits a URL list into fixed-size windows.
#[derive(Debug, Clone)]
pub struct Scheduler {
    window_size: usize,
    reschedule_delay: Duration,
}

impl Scheduler {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when `window_size` is 0.
    pub fn new(window_size: usize, reschedule_delay: Duration) -> Result<Self, ConfigError> {
        if window_size == 0 {
            return Err(ConfigError::Invalid {
                field: "urls_per_batch".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(Self { window_size, reschedule_delay })
    }

    /// Number of windows needed to cover `len` URLs.
    pub fn total_batches(&self, len: usize) -> u64 {
        len.div_ceil(self.window_size) as u64
    }

    /// Compute this run's slice and the state to persist after it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when `all_urls` is empty.
    pub fn next_slice<'a>(
        &self, all_urls: &'a [String], checkpoint: &BatchCheckpoint, now: DateTime<Utc>,
    ) -> Result<BatchPlan<'a>, ConfigError> {
        let total = all_urls.len();
        if total == 0 {
            return Err(ConfigError::Invalid { field: "urls".into(), reason: "URL list is empty".into() });
        }

        let batch_index = checkpoint.current_batch;
        let start = usize::try_from(batch_index)
            .ok()
            .and_then(|b| b.checked_mul(self.window_size))
            .unwrap_or(usize::MAX)
            .min(total);
        let end = start.saturating_add(self.window_size).min(total);
        let is_final = end >= total;
        let total_batches = self.total_batches(total);

        let next = if is_final {
            NextState::Complete(CompletionRecord {
                total_processed: total as u64,
                total_batches,
                completed_at: timestamp(&now),
                status: CompletionStatus::Completed,
            })
        } else {
            let resume_at = chrono::Duration::from_std(self.reschedule_delay)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(now);
            NextState::Advance(BatchCheckpoint {
                current_batch: batch_index + 1,
                total_batches,
                processed_count: end as u64,
                progress: format!("{end}/{total}"),
                progress_percent: percent(end, total),
                next_run_at: Some(timestamp(&resume_at)),
                remaining_urls: (total - end) as u64,
                urls_per_batch: self.window_size,
                url_list_digest: Some(digest_url_list(all_urls)),
            })
        };

        Ok(BatchPlan { batch_index, start, end, urls: &all_urls[start..end], total, is_final, next })
    }
}

/// `round(100 * part / whole)` with halves rounded up.
fn percent(part: usize, whole: usize) -> u8 {
    let rounded = (200 * part as u128 + whole as u128) / (2 * whole as u128);
    rounded.min(100) as u8
}
