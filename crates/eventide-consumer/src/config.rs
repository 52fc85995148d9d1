//! Configuration for the async batch consumer.

use std::sync::Arc;
use std::time::Duration;

use eventide_core::PagerHub;
use eventide_meters::Meters;
use eventide_pool::PoolConfig;
use eventide_transport::{Transport, TransportConfig};

use crate::consumer::AsyncBatchConsumer;

/// Default collector endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://s2s.roiquery.com/sync";

/// Builder for [`AsyncBatchConsumer`].
///
/// ```no_run
/// use eventide_consumer::AsyncBatchConsumer;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let consumer = AsyncBatchConsumer::builder()
///     .app_id("app-1")
///     .token("secret")
///     .interval(Duration::from_secs(3))
///     .flush_len(10_000)
///     .queue_size(100_000)
///     .build();
/// # }
/// ```
pub struct ConsumerConfigBuilder {
    app_id: String,
    token: String,
    server_url: String,
    interval: Duration,
    flush_len: usize,
    queue_size: usize,
    close_retry: u32,
    num_network_threads: usize,
    debug: bool,
    simulate: Option<i64>,
    meters: Option<Meters>,
    pager: Option<PagerHub>,
    transport: Option<Arc<dyn Transport>>,
}

impl ConsumerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            app_id: String::new(),
            token: String::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            interval: Duration::from_secs(3),
            flush_len: 10_000,
            queue_size: 100_000,
            close_retry: 1,
            num_network_threads: 1,
            debug: false,
            simulate: None,
            meters: None,
            pager: None,
            transport: None,
        }
    }

    /// Sets the application id.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Sets the collector access token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the collector endpoint.
    ///
    /// Default: [`DEFAULT_SERVER_URL`]
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Sets the maximum quiet time before a timer flush.
    ///
    /// Default: 3 seconds
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the maximum number of records per upload batch.
    ///
    /// Default: 10 000
    pub fn flush_len(mut self, flush_len: usize) -> Self {
        self.flush_len = flush_len.max(1);
        self
    }

    /// Sets the hard queue cap. Inserts beyond it are dropped.
    ///
    /// Default: 100 000
    pub fn queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size.max(1);
        self
    }

    /// Sets how many consecutive same-size observations the shutdown drain
    /// tolerates before giving up.
    ///
    /// Default: 1
    pub fn close_retry(mut self, close_retry: u32) -> Self {
        self.close_retry = close_retry;
        self
    }

    /// Sets the upload worker-pool size.
    ///
    /// Default: 1
    pub fn num_network_threads(mut self, n: usize) -> Self {
        self.num_network_threads = n.max(1);
        self
    }

    /// Enables debug mode. Required for the simulation hook to take effect.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Configures the debug simulation hook: uploads skip the network,
    /// sleep `|ms|` milliseconds and succeed iff `ms >= 0`. Only honored
    /// together with [`debug`](Self::debug).
    pub fn simulate(mut self, ms: i64) -> Self {
        self.simulate = Some(ms);
        self
    }

    /// Uses the given meter table instead of the process-wide one.
    pub fn meters(mut self, meters: Meters) -> Self {
        self.meters = Some(meters);
        self
    }

    /// Uses the given pager hub instead of a fresh one.
    pub fn pager(mut self, pager: PagerHub) -> Self {
        self.pager = Some(pager);
        self
    }

    /// Replaces the HTTP transport. Intended for tests and embedders that
    /// bring their own delivery path.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the consumer and spawns its flush timer.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> AsyncBatchConsumer {
        let meters = self.meters.unwrap_or_else(Meters::global);
        let pager = self.pager.unwrap_or_default();

        let transport = self.transport.unwrap_or_else(|| {
            let mut builder = TransportConfig::builder()
                .server_url(self.server_url.clone())
                .app_id(self.app_id.clone())
                .token(self.token.clone())
                .meters(meters.clone());
            match self.simulate {
                Some(ms) if self.debug => builder = builder.simulate(ms),
                Some(_) => {
                    tracing::warn!("simulate() is ignored without debug mode");
                }
                None => {}
            }
            Arc::new(builder.build())
        });

        let pool = PoolConfig::builder()
            .name("eventide-upload")
            .size(self.num_network_threads)
            .build();

        AsyncBatchConsumer::from_parts(
            self.app_id,
            self.flush_len,
            self.queue_size,
            self.close_retry,
            self.interval,
            transport,
            pool,
            pager,
            meters,
        )
    }
}

impl Default for ConsumerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
