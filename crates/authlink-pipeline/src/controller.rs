//! Checkpointed scan over the local authority ids
//!
//! The controller walks ids in ascending order starting after the
//! persisted checkpoint, processes each through an [`IdProcessor`] and
//! writes the checkpoint after every id.
//!
//! ## Failure handling
//!
//! Any error returned by the processor is system class. The attempt is
//! abandoned, the controller sleeps for `backoff` and the scan restarts
//! from the persisted checkpoint. With `skip_on_error` the failed id is
//! written as the checkpoint first, so it is not retried.
//!
//! The stop flag is polled between ids; an id in progress always
//! completes.

use crate::error::{PipelineError, Result};
use crate::estimate::{format_duration, percent_done, TimeEstimator};
use crate::pipeline::IdProcessor;
use authlink_core::{AllowAll, AllowListSource, CatalogIndex, CheckpointStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Stop after this many processed ids
    pub limit: Option<u64>,
    /// Advance the checkpoint past an id that failed
    pub skip_on_error: bool,
    /// Pause before restarting after a failure
    pub backoff: Duration,
    /// Give up after this many restarts; `None` retries forever
    pub max_restarts: Option<u32>,
    /// Ids fetched per index query
    pub page_size: usize,
    /// Allow-lists shorter than this are iterated directly
    pub direct_list_threshold: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            limit: None,
            skip_on_error: false,
            backoff: Duration::from_secs(2),
            max_restarts: None,
            page_size: 1000,
            direct_list_threshold: 1000,
        }
    }
}

/// Why a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No ids left after the checkpoint
    Exhausted,
    StopRequested,
    LimitReached,
    /// The highest allow-listed id was handled
    AllowListDone,
}

/// Result of a completed scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Ids processed across all attempts
    pub processed: u64,
    pub restarts: u32,
    /// Last id written as the checkpoint by this scan
    pub last_id: Option<u64>,
    pub stop_reason: StopReason,
}

#[derive(Debug, Default)]
struct Progress {
    processed: u64,
    last_id: Option<u64>,
}

/// A failed attempt and the id it failed on, if any
struct AttemptFailure {
    id: Option<u64>,
    error: PipelineError,
}

impl From<PipelineError> for AttemptFailure {
    fn from(error: PipelineError) -> Self {
        Self { id: None, error }
    }
}

impl From<authlink_core::StoreError> for AttemptFailure {
    fn from(error: authlink_core::StoreError) -> Self {
        Self::from(PipelineError::from(error))
    }
}

type Attempt<T> = std::result::Result<T, AttemptFailure>;

/// Drives the id scan with checkpointing and restart
pub struct ScanController {
    processor: Arc<dyn IdProcessor>,
    index: Arc<dyn CatalogIndex>,
    checkpoint: Arc<dyn CheckpointStore>,
    allow_list: Arc<dyn AllowListSource>,
    stop: Arc<AtomicBool>,
    config: ScanConfig,
}

impl ScanController {
    pub fn new(
        processor: Arc<dyn IdProcessor>,
        index: Arc<dyn CatalogIndex>,
        checkpoint: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            processor,
            index,
            checkpoint,
            allow_list: Arc::new(AllowAll),
            stop: Arc::new(AtomicBool::new(false)),
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_allow_list(mut self, allow_list: Arc<dyn AllowListSource>) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Share an externally owned stop flag
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that ends the scan before the next id when set
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Scan until the ids run out, a limit is hit or a stop is requested
    ///
    /// # Errors
    ///
    /// Returns the last failure once `max_restarts` is exhausted.
    pub async fn run(&self) -> Result<ScanSummary> {
        let mut progress = Progress::default();
        let mut estimator = TimeEstimator::new();
        let mut restarts = 0u32;

        loop {
            match self.attempt(&mut progress, &mut estimator).await {
                Ok(stop_reason) => {
                    info!(processed = progress.processed, restarts, reason = ?stop_reason, "Scan finished");
                    return Ok(ScanSummary {
                        processed: progress.processed,
                        restarts,
                        last_id: progress.last_id,
                        stop_reason,
                    });
                }
                Err(failure) => {
                    error!(class = %failure.error.class(), error = %failure.error, "Scan attempt failed");

                    if self.config.skip_on_error {
                        if let Some(id) = failure.id {
                            warn!(auth_id = id, "Skipping failed record");
                            match self.checkpoint.write(id).await {
                                Ok(()) => progress.last_id = Some(id),
                                Err(e) => error!(auth_id = id, error = %e, "Could not advance checkpoint"),
                            }
                        }
                    }

                    if self.config.max_restarts.is_some_and(|max| restarts >= max) {
                        error!(restarts, "Restart limit reached");
                        return Err(failure.error);
                    }

                    restarts += 1;
                    info!(backoff = ?self.config.backoff, restarts, "Restarting scan after backoff");
                    tokio::time::sleep(self.config.backoff).await;

                    if self.stop_requested() {
                        info!("Stopping as requested");
                        return Ok(ScanSummary {
                            processed: progress.processed,
                            restarts,
                            last_id: progress.last_id,
                            stop_reason: StopReason::StopRequested,
                        });
                    }
                }
            }
        }
    }

    async fn attempt(&self, progress: &mut Progress, estimator: &mut TimeEstimator) -> Attempt<StopReason> {
        if self.limit_reached(progress) {
            return Ok(StopReason::LimitReached);
        }

        let allow_list = self.allow_list.load().await?;
        let mut start_at = self.checkpoint.read().await?.unwrap_or(0);
        let last_id = self.index.last_authority_id().await?;

        let Some(list) = allow_list else {
            debug!(start_at, "No allow-list, checking all authority records");
            return self.scan_index(start_at, last_id, None, progress, estimator).await;
        };

        let (Some(&first), Some(&max_listed)) = (list.first(), list.last()) else {
            info!("Allow-list is empty");
            return Ok(StopReason::AllowListDone);
        };
        if start_at < first {
            start_at = first - 1;
            debug!(start_at, "Starting from first listed id");
        }
        if start_at >= max_listed {
            info!("List handled. Stopping.");
            return Ok(StopReason::AllowListDone);
        }

        if list.len() < self.config.direct_list_threshold {
            for id in list.iter().copied().filter(|id| *id > start_at) {
                if let Some(reason) = self.visit(id, true, last_id, Some(max_listed), progress, estimator).await? {
                    return Ok(reason);
                }
            }
            return Ok(StopReason::AllowListDone);
        }

        self.scan_index(start_at, last_id, Some(list.as_slice()), progress, estimator).await
    }

    async fn scan_index(
        &self,
        start_at: u64,
        last_id: u64,
        list: Option<&[u64]>,
        progress: &mut Progress,
        estimator: &mut TimeEstimator,
    ) -> Attempt<StopReason> {
        let max_listed = list.and_then(|l| l.last().copied());
        let mut cursor = start_at;

        loop {
            let page = self
                .index
                .authority_ids_after(cursor, self.config.page_size.max(1))
                .await?;
            if page.is_empty() {
                info!("Done.");
                return Ok(StopReason::Exhausted);
            }

            for id in page {
                let allowed = list.map_or(true, |l| l.binary_search(&id).is_ok());
                if let Some(reason) = self.visit(id, allowed, last_id, max_listed, progress, estimator).await? {
                    return Ok(reason);
                }
                cursor = id;
            }
        }
    }

    async fn visit(
        &self,
        id: u64,
        allowed: bool,
        last_id: u64,
        max_listed: Option<u64>,
        progress: &mut Progress,
        estimator: &mut TimeEstimator,
    ) -> Attempt<Option<StopReason>> {
        if self.stop_requested() {
            info!("Stopping as requested");
            return Ok(Some(StopReason::StopRequested));
        }

        info!(
            auth_id = id,
            last_id,
            percent = percent_done(id, last_id),
            "Handling authority record"
        );
        let started = Instant::now();

        if allowed {
            self.processor
                .process(id)
                .await
                .map_err(|error| AttemptFailure { id: Some(id), error })?;
            progress.processed += 1;
        } else {
            debug!(auth_id = id, "Not on list, skipping");
        }

        let elapsed = estimator.record(started.elapsed());
        match estimator.estimate(last_id.saturating_sub(id)) {
            Some(estimate) => debug!(
                auth_id = id,
                elapsed,
                remaining = %format_duration(estimate.remaining),
                ready_at = %estimate.ready_at,
                "Processing time"
            ),
            None => debug!(auth_id = id, elapsed, "Processing time"),
        }

        self.checkpoint.write(id).await.map_err(|e| AttemptFailure {
            id: Some(id),
            error: e.into(),
        })?;
        progress.last_id = Some(id);

        if self.limit_reached(progress) {
            info!(limit = ?self.config.limit, "Limit reached. Stopping.");
            return Ok(Some(StopReason::LimitReached));
        }
        if max_listed.is_some_and(|max| id >= max) {
            info!("List handled. Stopping.");
            return Ok(Some(StopReason::AllowListDone));
        }

        Ok(None)
    }

    fn limit_reached(&self, progress: &Progress) -> bool {
        self.config.limit.is_some_and(|limit| progress.processed >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchReport;
    use async_trait::async_trait;
    use authlink_core::memory::{InMemoryCatalogIndex, InMemoryCheckpointStore, StaticAllowList};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingProcessor {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl IdProcessor for CountingProcessor {
        async fn process(&self, auth_id: u64) -> Result<DispatchReport> {
            self.seen.lock().unwrap().push(auth_id);
            Ok(DispatchReport::default())
        }
    }

    async fn index_with(ids: &[u64]) -> Arc<InMemoryCatalogIndex> {
        let index = InMemoryCatalogIndex::new();
        for id in ids {
            index.add_authority(*id).await;
        }
        Arc::new(index)
    }

    #[tokio::test]
    async fn resumes_after_checkpoint() {
        let processor = Arc::new(CountingProcessor::default());
        let checkpoint = Arc::new(InMemoryCheckpointStore::starting_at(2));
        let controller = ScanController::new(processor.clone(), index_with(&[1, 2, 3, 4]).await, checkpoint.clone());

        let summary = controller.run().await.unwrap();

        assert_eq!(*processor.seen.lock().unwrap(), vec![3, 4]);
        assert_eq!(summary.stop_reason, StopReason::Exhausted);
        assert_eq!(checkpoint.history().await, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn small_allow_list_is_iterated_directly() {
        let processor = Arc::new(CountingProcessor::default());
        let controller = ScanController::new(
            processor.clone(),
            index_with(&[1, 2, 3, 4, 5]).await,
            Arc::new(InMemoryCheckpointStore::new()),
        )
        .with_allow_list(Arc::new(StaticAllowList::new(vec![4, 2])));

        let summary = controller.run().await.unwrap();

        assert_eq!(*processor.seen.lock().unwrap(), vec![2, 4]);
        assert_eq!(summary.stop_reason, StopReason::AllowListDone);
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test]
    async fn paged_allow_list_visits_unlisted_ids() {
        let processor = Arc::new(CountingProcessor::default());
        let checkpoint = Arc::new(InMemoryCheckpointStore::new());
        let controller = ScanController::new(processor.clone(), index_with(&[1, 2, 3, 4, 5]).await, checkpoint.clone())
            .with_allow_list(Arc::new(StaticAllowList::new(vec![2, 4])))
            .with_config(ScanConfig {
                direct_list_threshold: 0,
                page_size: 2,
                ..ScanConfig::default()
            });

        let summary = controller.run().await.unwrap();

        assert_eq!(*processor.seen.lock().unwrap(), vec![2, 4]);
        // 1 is below the first listed id; 3 is visited without processing
        assert_eq!(checkpoint.history().await, vec![2, 3, 4]);
        assert_eq!(summary.stop_reason, StopReason::AllowListDone);
    }

    #[tokio::test]
    async fn stop_flag_is_checked_before_each_id() {
        let processor = Arc::new(CountingProcessor::default());
        let controller = ScanController::new(
            processor.clone(),
            index_with(&[1, 2]).await,
            Arc::new(InMemoryCheckpointStore::new()),
        );
        controller.stop_handle().store(true, Ordering::SeqCst);

        let summary = controller.run().await.unwrap();

        assert!(processor.seen.lock().unwrap().is_empty());
        assert_eq!(summary.stop_reason, StopReason::StopRequested);
    }
}
