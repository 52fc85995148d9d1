//! Asynchronous batching consumer.
//!
//! The consumer owns a bounded FIFO queue of pre-encoded wire records.
//! Producers enqueue without blocking; a worker pool drains the queue in
//! groups bounded by item count (`flush_len`) and a fixed 16 MB request
//! byte cap, and posts each group to the collector. Flushes are triggered
//! by group boundaries, by an interval timer, and explicitly through
//! [`Consumer::flush`].
//!
//! Failure handling follows the wire contract: transport failures requeue
//! the batch at the queue head (order preserved), semantic rejections drop
//! it, and a single event too large for the collector is dropped rather
//! than retried forever. Every accepted record ends up
//! counted exactly once as uploaded, dropped or remaining at close.
//!
//! # Example
//!
//! ```no_run
//! use eventide_consumer::AsyncBatchConsumer;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let consumer = AsyncBatchConsumer::builder()
//!     .app_id("app-1")
//!     .token("secret")
//!     .build();
//!
//! consumer.add(|| vec![r##"{"#event_name":"purchase"}"##.to_string()]);
//! consumer.flush();
//! consumer.close().await;
//! # }
//! ```

mod config;
mod consumer;
mod timer;

pub use config::{ConsumerConfigBuilder, DEFAULT_SERVER_URL};
pub use consumer::AsyncBatchConsumer;

use async_trait::async_trait;
use eventide_core::PagerHub;

/// Boxed producer of encoded records, invoked by [`Consumer::add`].
///
/// Handing the consumer a supplier rather than a ready list keeps the
/// serialization cost out of callers that batch several events per call.
pub type RecordSupplier = Box<dyn FnOnce() -> Vec<String> + Send>;

/// The swappable consumer surface the tracking façade talks to.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// The application id events are attributed to.
    fn app_id(&self) -> &str;

    /// Enqueues the supplier's records. Never blocks; records that do not
    /// fit are dropped and reported through the pager channel.
    fn add(&self, supplier: RecordSupplier);

    /// Triggers a best-effort upload. Non-blocking.
    fn flush(&self);

    /// Drains the queue (bounded) and shuts the consumer down. Subsequent
    /// [`add`](Self::add) calls are silent no-ops.
    async fn close(&self);

    /// The pager channel failures are reported on.
    fn pager(&self) -> &PagerHub;
}
