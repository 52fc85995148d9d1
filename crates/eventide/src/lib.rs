//! Client-side analytics event pipeline.
//!
//! Applications hand events to the [`Analytics`] façade; the pipeline
//! validates and enriches them into canonical wire records, buffers them in
//! a bounded queue, and uploads them in gzip-compressed batches to an HTTPS
//! collector, without blocking the caller, with bounded memory, and with
//! graceful behavior when the backend is slow or failing.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use eventide::{Analytics, AsyncBatchConsumer, Value};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let consumer = AsyncBatchConsumer::builder()
//!     .app_id("app-1")
//!     .token("secret")
//!     .server_url("https://collector.example.com/sync")
//!     .build();
//! let analytics = Analytics::new(Arc::new(consumer), false);
//!
//! let mut properties = BTreeMap::new();
//! properties.insert("price".to_string(), Value::Int(15));
//! let mut meta = BTreeMap::new();
//! meta.insert("#bundle_id".to_string(), Value::from("com.example"));
//!
//! analytics.track(Some("visitor-1"), None, "purchase", properties, meta)?;
//! analytics.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`eventide_schema`]: validation, enrichment, canonical JSON encoding
//! - [`eventide_consumer`]: bounded queue, group flushing, shutdown drain
//! - [`eventide_transport`]: gzip, retry, response classification
//! - [`eventide_pool`]: priority-scheduled upload workers
//! - [`eventide_meters`]: delivery statistics
//! - [`eventide_core`]: pager channel and the property value model
//!
//! Only validation errors are raised to the caller; everything downstream
//! (network failures, queue pressure, collector rejections) is reported
//! through pager listeners and counters instead.

mod analytics;
mod quality;

pub use analytics::Analytics;
pub use quality::{QualityReporter, DEFAULT_QUALITY_URL};

pub use eventide_consumer::{AsyncBatchConsumer, Consumer, RecordSupplier, DEFAULT_SERVER_URL};
pub use eventide_core::{pager, PagerHandle, PagerHub, QualityLevel, Value};
pub use eventide_meters::{Meters, Timer};
pub use eventide_pool::{PoolConfig, WorkerPool};
pub use eventide_schema::{Event, EventProcessor, SchemaError, SendType};
pub use eventide_transport::{
    HttpTransport, RetryBackoff, Transport, TransportConfig, TransportError,
};
