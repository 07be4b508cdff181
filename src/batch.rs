use crate::error::{BatchError, CodecError, Result};
use crate::item::{ItemId, SourceFile};
use crate::processing::{Codec, CompressionSettings};
use crate::store::{ItemStore, StatusPatch};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-item transformation driven by the scheduler.
pub trait Transform: Send + Sync {
    fn apply(&self, source: &SourceFile) -> std::result::Result<Vec<u8>, CodecError>;
}

/// Runs a [`Codec`] with fixed settings for every item of a pass.
#[derive(Debug, Clone)]
pub struct CompressTransform<C> {
    codec: C,
    settings: CompressionSettings,
}

impl<C: Codec> CompressTransform<C> {
    pub fn new(codec: C, settings: CompressionSettings) -> Self {
        Self { codec, settings }
    }
}

impl<C: Codec> Transform for CompressTransform<C> {
    fn apply(&self, source: &SourceFile) -> std::result::Result<Vec<u8>, CodecError> {
        self.codec.compress(&source.bytes, &self.settings)
    }
}

/// Cooperative stop signal, checked before each chunk starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Done { before: u64, after: u64 },
    Failed,
    /// Removed from the store while the transform was running.
    Orphaned,
    /// Missing or no longer pending when its chunk started.
    Skipped,
}

/// Totals for one scheduler pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    pub orphaned: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Overall size reduction in percent over the items that finished.
    pub fn compression_ratio(&self) -> f64 {
        crate::utils::calculate_compression_ratio(self.bytes_before, self.bytes_after)
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.done as f64 / secs
        } else {
            0.0
        }
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Done { before, after } => {
                self.done += 1;
                self.bytes_before += before;
                self.bytes_after += after;
            }
            ItemOutcome::Failed => self.failed += 1,
            ItemOutcome::Orphaned => self.orphaned += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Drives bounded-concurrency passes over items in an [`ItemStore`].
///
/// Items are split into consecutive chunks of `concurrency` items. All items
/// of a chunk run at once on a dedicated pool and the next chunk starts only
/// when every item of the current one is done or failed, so no more than
/// `concurrency` items are ever processing. Chunks run in store order.
#[derive(Clone)]
pub struct BatchScheduler {
    concurrency: usize,
    progress: ProgressBar,
    cancel: CancellationToken,
}

impl BatchScheduler {
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(BatchError::InvalidConcurrency(concurrency));
        }
        Ok(Self {
            concurrency,
            progress: ProgressBar::hidden(),
            cancel: CancellationToken::new(),
        })
    }

    /// Progress bar advanced once per item reaching a terminal state.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Processes `ids` chunk by chunk and returns once every started item is terminal.
    ///
    /// Per-item failures are recorded on the item and never abort the pass.
    pub fn run<T: Transform>(&self, store: &ItemStore, ids: &[ItemId], transform: &T) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let mut summary = BatchSummary {
            total: ids.len(),
            ..BatchSummary::default()
        };

        if ids.is_empty() {
            return Ok(summary);
        }

        info!(
            "Processing {} items in chunks of {}",
            ids.len(),
            self.concurrency
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|index| format!("batch-worker-{}", index))
            .build()?;

        self.progress.set_length(ids.len() as u64);

        for (chunk_index, chunk) in ids.chunks(self.concurrency).enumerate() {
            if self.cancel.is_cancelled() {
                let remaining = ids.len() - chunk_index * self.concurrency;
                info!("Batch cancelled, {} items not started", remaining);
                self.progress.inc(remaining as u64);
                summary.skipped += remaining;
                summary.cancelled = true;
                break;
            }

            debug!("Starting chunk {} with {} items", chunk_index, chunk.len());
            let outcomes: Vec<ItemOutcome> = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|id| self.process_item(store, *id, transform))
                    .collect()
            });

            for outcome in outcomes {
                summary.record(outcome);
            }
        }

        summary.elapsed = start_time.elapsed();
        info!(
            "Batch finished: {} done, {} failed, {} orphaned, {} skipped",
            summary.done, summary.failed, summary.orphaned, summary.skipped
        );
        Ok(summary)
    }

    /// Resets every item to pending, dropping previous results and errors, then runs them all again.
    pub fn rerun_all<T: Transform>(&self, store: &ItemStore, transform: &T) -> Result<BatchSummary> {
        let ids = store.reset_all();
        self.progress.reset();
        self.run(store, &ids, transform)
    }

    fn process_item<T: Transform>(&self, store: &ItemStore, id: ItemId, transform: &T) -> ItemOutcome {
        let Some(source) = store.claim(id) else {
            debug!("Item {} is gone or not pending, skipping", id);
            self.progress.inc(1);
            return ItemOutcome::Skipped;
        };

        let outcome = match transform.apply(&source) {
            Ok(output) => {
                let before = source.size();
                let after = output.len() as u64;
                if store.update_status(id, StatusPatch::Done(Arc::from(output))) {
                    debug!("Item {} ({}) done: {} -> {} bytes", id, source.name, before, after);
                    ItemOutcome::Done { before, after }
                } else {
                    debug!("Discarding result for removed item {} ({})", id, source.name);
                    ItemOutcome::Orphaned
                }
            }
            Err(e) => {
                warn!("Failed to process {}: {}", source.name, e);
                if store.update_status(id, StatusPatch::Failed(e.to_string())) {
                    ItemOutcome::Failed
                } else {
                    ItemOutcome::Orphaned
                }
            }
        };

        self.progress.inc(1);
        outcome
    }
}

impl std::fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("concurrency", &self.concurrency)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
