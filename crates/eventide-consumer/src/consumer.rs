//! Async batch consumer implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use eventide_core::pager::{codes, PagerHub};
use eventide_meters::Meters;
use eventide_pool::WorkerPool;
use eventide_transport::{Transport, TransportError};

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::config::ConsumerConfigBuilder;
use crate::timer::{FlushTimer, TimerShared};
use crate::{Consumer, RecordSupplier};

/// Hard byte cap per upload request. Kept below typical collector limits so
/// oversize responses stay the exception, not the steady state.
pub(crate) const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

const METER_INSERTED: &str = "async_batch.inserted";
const METER_UPLOADED: &str = "async_batch.uploaded";
const METER_DROPPED: &str = "async_batch.dropped";
const METER_FLUSH_TIMER: &str = "async_batch.flush";

struct QueueState {
    items: VecDeque<String>,
    /// Bytes accumulated since the last group boundary.
    acc_size: usize,
    /// Items accumulated since the last group boundary.
    since_boundary: usize,
    above_watermark: bool,
}

pub(crate) struct Inner {
    app_id: String,
    flush_len: usize,
    queue_size: usize,
    close_retry: u32,
    queue: Mutex<QueueState>,
    transport: Arc<dyn Transport>,
    pool: WorkerPool,
    pager: PagerHub,
    meters: Meters,
    closed: AtomicBool,
    timer_shared: Arc<TimerShared>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    fn lock_queue(&self) -> MutexGuard<'_, QueueState> {
        relock(&self.queue)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.lock_queue().items.is_empty()
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.lock_queue().items.len()
    }
}

/// Submits a flush job to the worker pool.
pub(crate) fn submit_flush(inner: &Arc<Inner>) {
    let task_inner = Arc::clone(inner);
    inner.pool.execute(move || async move {
        task_inner.perform_request().await;
    });
}

fn add_records(inner: &Arc<Inner>, records: Vec<String>) {
    if inner.closed.load(Ordering::Acquire) {
        tracing::debug!("add after close ignored");
        return;
    }
    let requested = records.len();
    if requested == 0 {
        return;
    }

    let watermark = inner.queue_size * 7 / 10;
    let mut inserted = 0usize;
    let mut boundaries = 0usize;
    let mut crossed_watermark = false;
    {
        let mut queue = inner.lock_queue();
        for record in records {
            if queue.items.len() >= inner.queue_size {
                break;
            }
            queue.acc_size += record.len();
            queue.items.push_back(record);
            queue.since_boundary += 1;
            if queue.acc_size >= MAX_REQUEST_BYTES || queue.since_boundary >= inner.flush_len {
                queue.acc_size = 0;
                queue.since_boundary = 0;
                boundaries += 1;
            }
            inserted += 1;
        }
        if inserted == requested {
            let len = queue.items.len();
            if len >= watermark {
                if !queue.above_watermark {
                    queue.above_watermark = true;
                    crossed_watermark = true;
                }
            } else {
                queue.above_watermark = false;
            }
        }
    }

    if inserted > 0 {
        inner.meters.add(METER_INSERTED, inserted as f64);
        #[cfg(feature = "metrics")]
        counter!("eventide_records_inserted_total").increment(inserted as u64);
    }
    if inserted < requested {
        let dropped = requested - inserted;
        inner.meters.add(METER_DROPPED, dropped as f64);
        #[cfg(feature = "metrics")]
        counter!("eventide_records_dropped_total").increment(dropped as u64);
        tracing::error!(dropped, "queue full, records dropped");
        inner.pager.emit(
            codes::ASYNC_BATCH_QUEUE_FULL,
            &format!("queue is full, {dropped} records dropped"),
        );
    } else if crossed_watermark {
        tracing::warn!(queue_len = inner.queue_len(), "queue usage crossed the warning watermark");
        inner.pager.emit(
            codes::ASYNC_BATCH_QUEUE_REACH_THRESHOLD,
            "queue usage crossed the warning watermark",
        );
    }

    // One flush job per group boundary closed in this call.
    for _ in 0..boundaries {
        submit_flush(inner);
    }
    if boundaries > 0 {
        inner.timer_shared.refresh();
    }
}

impl Inner {
    /// Drains one group and posts it. Runs on pool workers and directly
    /// from the shutdown drain; the queue lock guarantees each record is
    /// taken by exactly one flusher.
    pub(crate) async fn perform_request(&self) {
        let batch: Vec<String> = {
            let mut queue = self.lock_queue();
            let mut batch = Vec::new();
            let mut size = 0usize;
            while batch.len() < self.flush_len {
                let Some(next_len) = queue.items.front().map(String::len) else {
                    break;
                };
                // A first record above the byte cap is still attempted; the
                // collector gets to veto it with an oversize response.
                if !batch.is_empty() && size + next_len > MAX_REQUEST_BYTES {
                    break;
                }
                match queue.items.pop_front() {
                    Some(item) => {
                        size += item.len();
                        batch.push(item);
                    }
                    None => break,
                }
            }
            batch
        };
        if batch.is_empty() {
            return;
        }

        let count = batch.len();
        let body = format!("[{}]", batch.join(","));
        let mut timer = self.meters.start_timer(METER_FLUSH_TIMER);

        match self.transport.post_event(body, count).await {
            Ok(()) => {
                timer.stop(true);
                self.meters.add(METER_UPLOADED, count as f64);
                #[cfg(feature = "metrics")]
                counter!("eventide_records_uploaded_total").increment(count as u64);
                tracing::debug!(count, "batch uploaded");
            }
            Err(TransportError::Network { subcode }) => {
                timer.stop(false);
                tracing::warn!(subcode, count, "upload failed, batch requeued");
                self.pager.emit(
                    codes::NETWORK_ERROR + subcode,
                    &format!("upload failed with network subcode {subcode}"),
                );
                self.reinsert_head(batch);
            }
            Err(TransportError::IllegalData { message }) => {
                timer.stop(false);
                tracing::error!(%message, count, "collector rejected the batch, dropping");
                self.pager.emit(codes::DATA_ERROR, &message);
                self.meters.add(METER_DROPPED, count as f64);
                #[cfg(feature = "metrics")]
                counter!("eventide_records_dropped_total").increment(count as u64);
            }
            Err(TransportError::Oversize {
                received,
                compressed,
                limit,
            }) => {
                timer.stop(false);
                if count == 1 {
                    tracing::error!(
                        received,
                        compressed,
                        limit,
                        "single event exceeds the collector limit, dropping"
                    );
                    self.pager.emit(
                        codes::NETWORK_ERROR + codes::SUB_NETWORK_OVERSIZE,
                        &format!(
                            "single event of {compressed} compressed bytes exceeds collector limit {limit}"
                        ),
                    );
                    self.meters.add(METER_DROPPED, 1.0);
                    #[cfg(feature = "metrics")]
                    counter!("eventide_records_dropped_total").increment(1);
                } else {
                    tracing::warn!(received, compressed, limit, count, "batch oversize, requeued");
                    self.reinsert_head(batch);
                }
            }
        }
    }

    /// Puts a drained batch back at the queue head in original order.
    ///
    /// This never goes through `add_records`: the records were already
    /// counted as inserted, and a head re-insertion must not trigger a
    /// flush storm or watermark churn.
    fn reinsert_head(&self, batch: Vec<String>) {
        let mut queue = self.lock_queue();
        for record in batch.into_iter().rev() {
            queue.items.push_front(record);
        }
    }
}

/// Bounded, non-blocking batching consumer uploading through a worker pool.
///
/// See the crate docs for the queueing and failure model. Construction
/// spawns the flush timer task and therefore must happen inside a Tokio
/// runtime.
pub struct AsyncBatchConsumer {
    inner: Arc<Inner>,
    timer: FlushTimer,
}

impl AsyncBatchConsumer {
    /// Creates a new configuration builder.
    pub fn builder() -> ConsumerConfigBuilder {
        ConsumerConfigBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        app_id: String,
        flush_len: usize,
        queue_size: usize,
        close_retry: u32,
        interval: std::time::Duration,
        transport: Arc<dyn Transport>,
        pool: WorkerPool,
        pager: PagerHub,
        meters: Meters,
    ) -> Self {
        let timer_shared = Arc::new(TimerShared::new());
        let inner = Arc::new(Inner {
            app_id,
            flush_len,
            queue_size,
            close_retry,
            queue: Mutex::new(QueueState {
                items: VecDeque::new(),
                acc_size: 0,
                since_boundary: 0,
                above_watermark: false,
            }),
            transport,
            pool,
            pager,
            meters,
            closed: AtomicBool::new(false),
            timer_shared: Arc::clone(&timer_shared),
        });
        let timer = FlushTimer::spawn(Arc::clone(&inner), timer_shared, interval);
        Self { inner, timer }
    }

    pub fn app_id(&self) -> &str {
        &self.inner.app_id
    }

    /// The pager channel this consumer reports on.
    pub fn pager(&self) -> &PagerHub {
        &self.inner.pager
    }

    /// The meter table this consumer records statistics in.
    pub fn meters(&self) -> &Meters {
        &self.inner.meters
    }

    /// Number of records currently buffered.
    pub fn queue_len(&self) -> usize {
        self.inner.queue_len()
    }

    /// Enqueues the supplier's records. See [`Consumer::add`].
    pub fn add<F>(&self, supplier: F)
    where
        F: FnOnce() -> Vec<String>,
    {
        if self.inner.closed.load(Ordering::Acquire) {
            tracing::debug!("add after close ignored");
            return;
        }
        let records = supplier();
        add_records(&self.inner, records);
        self.inner.timer_shared.resume();
    }

    /// Triggers a best-effort upload and restarts the quiet-period timer.
    pub fn flush(&self) {
        submit_flush(&self.inner);
        self.inner.timer_shared.refresh();
    }

    /// Drains the queue and shuts down.
    ///
    /// Gives up once the queue size is observed unchanged `close_retry + 1`
    /// consecutive times, so a permanently failing collector cannot hang
    /// shutdown; whatever is left is logged as lost.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(app_id = %self.inner.app_id, "closing async batch consumer");
        submit_flush(&self.inner);
        self.timer.stop().await;
        // Run every queued flush job to completion before the synchronous
        // drain: a batch held by an in-flight job is not in the queue, and
        // the drain loop must not mistake that for "nothing left".
        self.inner.pool.terminate().await;

        let mut previous = usize::MAX;
        let mut retried = 0u32;
        loop {
            let current = self.inner.queue_len();
            if current == 0 {
                break;
            }
            if current == previous {
                if retried < self.inner.close_retry {
                    retried += 1;
                } else {
                    break;
                }
            } else {
                retried = 0;
            }
            tracing::debug!(pending = current, "draining before shutdown");
            previous = current;
            self.inner.perform_request().await;
        }

        let remaining = self.inner.queue_len();
        if remaining > 0 {
            tracing::error!(remaining, "closed with unsent records discarded");
        }
        tracing::debug!(
            inserted = self.inner.meters.get(METER_INSERTED),
            uploaded = self.inner.meters.get(METER_UPLOADED),
            dropped = self.inner.meters.get(METER_DROPPED),
            "delivery statistics at close"
        );
    }
}

#[async_trait]
impl Consumer for AsyncBatchConsumer {
    fn app_id(&self) -> &str {
        AsyncBatchConsumer::app_id(self)
    }

    fn add(&self, supplier: RecordSupplier) {
        AsyncBatchConsumer::add(self, supplier);
    }

    fn flush(&self) {
        AsyncBatchConsumer::flush(self);
    }

    async fn close(&self) {
        AsyncBatchConsumer::close(self).await;
    }

    fn pager(&self) -> &PagerHub {
        AsyncBatchConsumer::pager(self)
    }
}
