//! Comprehensive tests for the async batch consumer.
//!
//! Test organization:
//! - batching.rs: group boundaries and upload body shape
//! - backpressure.rs: queue caps, watermark and drop accounting
//! - failure_recovery.rs: requeue/drop disposition per failure kind
//! - interval.rs: flush timer behavior
//! - shutdown.rs: close() draining and its bounds

mod batching;
mod failure_recovery;
mod interval;
mod shutdown;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eventide_consumer::AsyncBatchConsumer;
use eventide_meters::Meters;
use eventide_transport::{Transport, TransportError};

/// Transport fake: replays a script of outcomes (then succeeds), records
/// every post, and can simulate slow uploads.
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    posts: Mutex<Vec<(usize, String)>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn ok() -> Arc<Self> {
        Self::scripted(vec![])
    }

    pub fn scripted(script: Vec<Result<(), TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            posts: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            posts: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    pub fn posts(&self) -> Vec<(usize, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    /// Sequence numbers of every uploaded record, in post order.
    pub fn uploaded_seqs(&self) -> Vec<i64> {
        self.posts()
            .iter()
            .flat_map(|(_, body)| {
                let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
                parsed
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|record| record["seq"].as_i64().unwrap())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_event(&self, body: String, count: usize) -> Result<(), TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.posts.lock().unwrap().push((count, body));
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn post_raw(&self, _url: &str, _body: String) -> bool {
        true
    }
}

/// Consumer wired to a fake transport, a fresh meter table and a long
/// timer interval so tests control every flush.
pub fn consumer(transport: Arc<FakeTransport>, flush_len: usize, queue_size: usize) -> AsyncBatchConsumer {
    consumer_with_interval(transport, flush_len, queue_size, Duration::from_secs(600))
}

pub fn consumer_with_interval(
    transport: Arc<FakeTransport>,
    flush_len: usize,
    queue_size: usize,
    interval: Duration,
) -> AsyncBatchConsumer {
    AsyncBatchConsumer::builder()
        .app_id("app-1")
        .token("tok")
        .flush_len(flush_len)
        .queue_size(queue_size)
        .interval(interval)
        .meters(Meters::new())
        .transport(transport)
        .build()
}

pub fn records(n: usize) -> Vec<String> {
    records_from(0, n)
}

pub fn records_from(start: usize, n: usize) -> Vec<String> {
    (start..start + n)
        .map(|i| format!(r#"{{"seq":{i}}}"#))
        .collect()
}
