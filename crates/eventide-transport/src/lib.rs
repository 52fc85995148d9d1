//! HTTPS transport to the event collector.
//!
//! One pooled client, gzip-compressed bodies, bounded retries on a
//! doubling delay schedule, and a classified result instead of
//! exception-driven control flow: a post either succeeds or fails with
//! [`TransportError::Network`], [`TransportError::IllegalData`] or
//! [`TransportError::Oversize`], and the consumer decides what each one
//! means for the buffered batch.
//!
//! The [`Transport`] trait is the seam between the batching consumer and
//! the network; tests drive the consumer through scripted implementations
//! while production wires in [`HttpTransport`].
//!
//! # Example
//!
//! ```no_run
//! use eventide_transport::TransportConfig;
//! use std::time::Duration;
//!
//! let transport = TransportConfig::builder()
//!     .server_url("https://collector.example.com/sync")
//!     .app_id("app")
//!     .token("secret")
//!     .timeout(Duration::from_secs(30))
//!     .build();
//! ```

mod backoff;
mod config;
mod error;
mod http;

pub use backoff::RetryBackoff;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use error::{Result, TransportError};
pub use http::{HttpTransport, Transport, SDK_TYPE, SDK_VERSION};
