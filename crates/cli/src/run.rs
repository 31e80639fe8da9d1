//! One batch, start to finish.
//!
//! A run reads the checkpoint, asks the scheduler for its slice, then walks
//! the slice strictly in order:
//!
//! ```text
//! PENDING -> FETCHING -> EXTRACTING -> RECORDED
//!                  \          \
//!                   `----------`--> FAILED -> RECORDED
//! ```
//!
//! Any fault for a URL becomes a failure record for that URL; nothing short
//! of a configuration or store error stops the batch. After the slice the
//! next checkpoint (or the completion record) is persisted and the run
//! ends. Later batches are later invocations.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use dossier_client::{FetchOptions, PageFetcher, extract_profile};
use dossier_core::checkpoint::{digest_url_list, load_checkpoint, load_completion, save_checkpoint, save_completion};
use dossier_core::{
    AppConfig, BatchCheckpoint, CompletionRecord, DatasetItem, Error, ExtractionResult, FailureRecord, KeyValueStore,
    NextState, ProfileRecord, ResultSink, Scheduler,
};

/// Slack on top of navigation timeout and settle wait for the work a fetcher
/// does outside its own navigation budget (opening a tab, reading content).
pub const FETCH_GRACE: Duration = Duration::from_secs(10);

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub urls_per_batch: usize,
    /// Starting batch when no checkpoint exists yet.
    pub current_batch: u64,
    pub fetch: FetchOptions,
    /// Added to timeout + settle for the per-URL ceiling.
    pub fetch_grace: Duration,
    /// Pause after every URL, success or failure.
    pub request_delay: Duration,
    /// Offset for the checkpoint's `nextRunAt`.
    pub reschedule_delay: Duration,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            urls_per_batch: config.urls_per_batch,
            current_batch: config.current_batch,
            fetch: FetchOptions {
                timeout: config.timeout(),
                wait_until_network_idle: config.wait_until_network_idle,
                settle: config.settle(),
            },
            fetch_grace: FETCH_GRACE,
            request_delay: config.request_delay(),
            reschedule_delay: config.reschedule_delay(),
        }
    }
}

/// Lifecycle of one URL within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlState {
    Pending,
    Fetching,
    Extracting,
    Recorded,
    Failed,
}

impl UrlState {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlState::Pending => "pending",
            UrlState::Fetching => "fetching",
            UrlState::Extracting => "extracting",
            UrlState::Recorded => "recorded",
            UrlState::Failed => "failed",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// 1-based batch number.
    pub batch: u64,
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// Records the sink refused; they are lost, the run continues.
    pub sink_errors: u32,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A completion record already existed; nothing was done.
    AlreadyComplete(CompletionRecord),
    /// More batches remain.
    Advanced { summary: RunSummary, checkpoint: BatchCheckpoint },
    /// This was the last batch.
    Completed { summary: RunSummary, record: CompletionRecord },
}

/// Runs one batch against a fetcher and a store.
pub struct RunController<'a, F: ?Sized, S: ?Sized> {
    fetcher: &'a F,
    store: &'a S,
    settings: RunSettings,
}

impl<'a, F, S> RunController<'a, F, S>
where
    F: PageFetcher + ?Sized,
    S: KeyValueStore + ResultSink + ?Sized,
{
    pub fn new(fetcher: &'a F, store: &'a S, settings: RunSettings) -> Self {
        Self { fetcher, store, settings }
    }

    /// Process the next batch of `urls`.
    ///
    /// # Errors
    ///
    /// Configuration errors (empty list, zero window) and checkpoint store
    /// failures. Per-URL faults are never returned.
    pub async fn run(&self, urls: &[String]) -> Result<RunOutcome, Error> {
        if let Some(done) = load_completion(self.store).await? {
            tracing::info!(
                total_processed = done.total_processed,
                completed_at = %done.completed_at,
                "all batches already processed; reset to start over"
            );
            return Ok(RunOutcome::AlreadyComplete(done));
        }

        let checkpoint = self.resume_point(urls).await?;
        let window = match checkpoint.urls_per_batch {
            0 => self.settings.urls_per_batch,
            persisted => persisted,
        };
        let scheduler = Scheduler::new(window, self.settings.reschedule_delay)?;
        let plan = scheduler.next_slice(urls, &checkpoint, Utc::now())?;
        let batch = plan.batch_number();

        if plan.urls.is_empty() {
            tracing::warn!(
                current_batch = plan.batch_index,
                total = plan.total,
                "checkpoint points past the end of the URL list; treating the job as complete"
            );
        } else {
            tracing::info!(
                batch,
                total_batches = scheduler.total_batches(plan.total),
                "processing URLs {}-{} of {}",
                plan.start + 1,
                plan.end,
                plan.total
            );
        }

        let mut summary = RunSummary { batch, ..RunSummary::default() };
        for url in plan.urls {
            self.process_url(url, batch, &mut summary).await;
        }

        let outcome = match plan.next {
            NextState::Advance(next) => {
                save_checkpoint(self.store, &next).await?;
                tracing::info!(
                    next_batch = next.current_batch + 1,
                    progress = %next.progress,
                    progress_percent = next.progress_percent,
                    next_run_at = next.next_run_at.as_deref().unwrap_or_default(),
                    "scheduled next batch"
                );
                RunOutcome::Advanced { summary, checkpoint: next }
            }
            NextState::Complete(record) => {
                save_completion(self.store, &record).await?;
                tracing::info!(
                    total_processed = record.total_processed,
                    total_batches = record.total_batches,
                    "all URLs processed"
                );
                RunOutcome::Completed { summary, record }
            }
        };

        tracing::info!(batch, "batch {batch} finished");
        Ok(outcome)
    }

    /// The persisted checkpoint, or a fresh one from the settings.
    async fn resume_point(&self, urls: &[String]) -> Result<BatchCheckpoint, Error> {
        let Some(checkpoint) = load_checkpoint(self.store).await? else {
            return Ok(BatchCheckpoint::initial(self.settings.current_batch, self.settings.urls_per_batch));
        };

        if checkpoint.urls_per_batch != 0 && checkpoint.urls_per_batch != self.settings.urls_per_batch {
            tracing::warn!(
                persisted = checkpoint.urls_per_batch,
                configured = self.settings.urls_per_batch,
                "keeping the window size the checkpoint was written with"
            );
        }

        if let Some(digest) = &checkpoint.url_list_digest
            && *digest != digest_url_list(urls)
        {
            tracing::warn!("URL list changed since the checkpoint was written; resuming by position");
        }

        Ok(checkpoint)
    }

    async fn process_url(&self, url: &str, batch: u64, summary: &mut RunSummary) {
        tracing::debug!(url, state = %UrlState::Pending);
        summary.processed += 1;

        let record = match self.fetch_and_extract(url).await {
            Ok(profile) => {
                summary.succeeded += 1;
                tracing::info!(url, "processed: {}", profile.summary());
                ExtractionResult::Profile(profile)
            }
            Err(e) => {
                summary.failed += 1;
                if e.is_navigation() {
                    tracing::warn!(url, state = %UrlState::Failed, error = %e, "page did not load");
                } else {
                    tracing::error!(url, state = %UrlState::Failed, error = %e, "failed to process page");
                }
                ExtractionResult::Failure(FailureRecord::new(url, e.to_string()))
            }
        };

        let item = DatasetItem::new(record, batch, Utc::now());
        match self.store.push(&item).await {
            Ok(()) => tracing::debug!(url, state = %UrlState::Recorded),
            Err(e) => {
                summary.sink_errors += 1;
                tracing::error!(url, error = %e, "failed to record result");
            }
        }

        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }
    }

    async fn fetch_and_extract(&self, url: &str) -> Result<ProfileRecord, Error> {
        tracing::debug!(url, state = %UrlState::Fetching);
        let opts = &self.settings.fetch;
        let ceiling = opts.timeout + opts.settle + self.settings.fetch_grace;

        let page = match tokio::time::timeout(ceiling, self.fetcher.fetch_page(url, opts)).await {
            Ok(page) => page?,
            Err(_) => {
                return Err(Error::FetchTimeout(format!("page load exceeded {}ms", ceiling.as_millis())));
            }
        };

        tracing::debug!(url, state = %UrlState::Extracting, final_url = %page.final_url, fetch_ms = page.fetch_ms);
        catch_unwind(AssertUnwindSafe(|| extract_profile(&page, Utc::now())))
            .map_err(|_| Error::ExtractFailed("extractor panicked".into()))?
    }
}
