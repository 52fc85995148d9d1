//! HTTP transport implementation.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use eventide_core::pager::codes;
use eventide_meters::Meters;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;

use crate::config::TransportConfig;
use crate::error::TransportError;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Value of the `sdk-type` header.
pub const SDK_TYPE: &str = "rust-sdk";
/// Value of the `sdk-version` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sample cap and retention floor for the compression running averages.
const COMPRESS_AVG_CAP: u64 = 10_000;
const COMPRESS_AVG_FLOOR: u64 = 100;

/// Seam between the batching consumer and the network.
///
/// Production wires in [`HttpTransport`]; tests script the outcomes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Posts one upload body (a JSON array of events) to the collector.
    async fn post_event(&self, body: String, count: usize) -> Result<(), TransportError>;

    /// Fire-and-forget post used by the quality channel. Returns whether
    /// the endpoint acknowledged with a success status.
    async fn post_raw(&self, url: &str, body: String) -> bool;
}

/// Collector response body.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectorResponse {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) msg: String,
    #[serde(default)]
    pub(crate) data: Option<CollectorLimits>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CollectorLimits {
    #[serde(default)]
    pub(crate) max_size: u64,
    #[serde(default)]
    pub(crate) receive_size: u64,
}

/// One pooled HTTPS session to the collector.
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
    meters: Meters,
}

impl HttpTransport {
    pub(crate) fn new(config: TransportConfig, meters: Meters) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            meters,
        }
    }

    /// Compresses `body` if configured, recording compression statistics.
    fn prepare_body(&self, body: String) -> Result<(Vec<u8>, &'static str), TransportError> {
        if !self.config.compress {
            return Ok((body.into_bytes(), "none"));
        }
        let original = body.len();
        let gzip_failed = |err: std::io::Error| {
            tracing::warn!(%err, "gzip compression failed");
            TransportError::Network {
                subcode: codes::SUB_NETWORK_OTHER,
            }
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).map_err(gzip_failed)?;
        let compressed = encoder.finish().map_err(gzip_failed)?;

        let ratio = original as f64 / compressed.len().max(1) as f64;
        self.meters.count_avg(
            "transport.compress_ratio",
            ratio,
            COMPRESS_AVG_CAP,
            COMPRESS_AVG_FLOOR,
        );
        self.meters.count_avg(
            "transport.compressed_size",
            compressed.len() as f64,
            COMPRESS_AVG_CAP,
            COMPRESS_AVG_FLOOR,
        );
        Ok((compressed, "gzip"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_event(&self, body: String, count: usize) -> Result<(), TransportError> {
        let (payload, compress_header) = self.prepare_body(body)?;
        let compressed_len = payload.len() as u64;

        if let Some(ms) = self.config.simulate {
            tokio::time::sleep(Duration::from_millis(ms.unsigned_abs())).await;
            return if ms >= 0 {
                Ok(())
            } else {
                Err(TransportError::Network {
                    subcode: codes::SUB_NETWORK_OTHER,
                })
            };
        }

        let mut attempt = 0;
        loop {
            let request = self
                .client
                .post(&self.config.server_url)
                .timeout(self.config.timeout)
                .header("app_id", &self.config.app_id)
                .header("token", &self.config.token)
                .header("data-count", count.to_string())
                .header("sdk-type", SDK_TYPE)
                .header("sdk-version", SDK_VERSION)
                .header("compress", compress_header)
                .body(payload.clone());

            match request.send().await {
                Ok(response) => {
                    let result = classify(response, compressed_len).await;
                    #[cfg(feature = "metrics")]
                    counter!(
                        "eventide_transport_posts_total",
                        "outcome" => if result.is_ok() { "success" } else { "failure" }
                    )
                    .increment(1);
                    return result;
                }
                Err(err) => {
                    let retryable = err.is_timeout() || err.is_connect();
                    if !retryable {
                        tracing::warn!(%err, "collector post failed");
                        return Err(TransportError::Network {
                            subcode: codes::SUB_NETWORK_OTHER,
                        });
                    }
                    attempt += 1;
                    if attempt >= self.config.retries {
                        let subcode = if err.is_connect() {
                            codes::SUB_NETWORK_CONNECTION
                        } else {
                            codes::SUB_NETWORK_MAX_RETRIES
                        };
                        tracing::warn!(%err, attempt, "collector unreachable, giving up");
                        return Err(TransportError::Network { subcode });
                    }
                    let delay = self.config.backoff.delay_for(attempt as u32 - 1);
                    tracing::debug!(%err, attempt, ?delay, "retrying collector post");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn post_raw(&self, url: &str, body: String) -> bool {
        let request = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .header("content-type", "application/json")
            .body(body);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(%err, "raw post failed");
                false
            }
        }
    }
}

async fn classify(response: reqwest::Response, compressed: u64) -> Result<(), TransportError> {
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::warn!(status = status.as_u16(), "collector returned http error");
        return Err(TransportError::Network {
            subcode: u32::from(status.as_u16()),
        });
    }
    let body: CollectorResponse = response.json().await.map_err(|err| {
        tracing::warn!(%err, "collector response was not valid json");
        TransportError::Network {
            subcode: codes::SUB_NETWORK_OTHER,
        }
    })?;
    interpret(body, compressed)
}

pub(crate) fn interpret(body: CollectorResponse, compressed: u64) -> Result<(), TransportError> {
    match body.code {
        0 => Ok(()),
        11 => {
            let limits = body.data.unwrap_or_default();
            Err(TransportError::Oversize {
                received: limits.receive_size,
                compressed,
                limit: limits.max_size,
            })
        }
        code => Err(TransportError::IllegalData {
            message: format!("unexpected result code: {code} reason: {}", body.msg),
        }),
    }
}
