//! Configuration for the collector transport.

use std::time::Duration;

use eventide_meters::Meters;

use crate::backoff::RetryBackoff;
use crate::http::HttpTransport;

/// Configuration for [`HttpTransport`].
pub struct TransportConfig {
    pub(crate) server_url: String,
    pub(crate) app_id: String,
    pub(crate) token: String,
    /// Per-request timeout.
    pub(crate) timeout: Duration,
    /// Total attempts for retryable transport failures.
    pub(crate) retries: usize,
    pub(crate) backoff: RetryBackoff,
    pub(crate) compress: bool,
    /// Debug hook: skip the network, sleep `|ms|` and succeed iff `ms >= 0`.
    pub(crate) simulate: Option<i64>,
}

impl TransportConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::new()
    }
}

/// Builder for [`TransportConfig`].
pub struct TransportConfigBuilder {
    server_url: String,
    app_id: String,
    token: String,
    timeout: Duration,
    retries: usize,
    backoff: RetryBackoff,
    compress: bool,
    simulate: Option<i64>,
    meters: Option<Meters>,
}

impl TransportConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            server_url: String::new(),
            app_id: String::new(),
            token: String::new(),
            timeout: Duration::from_secs(30),
            retries: 3,
            backoff: RetryBackoff::default(),
            compress: true,
            simulate: None,
            meters: None,
        }
    }

    /// Sets the collector endpoint.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Sets the application id sent in the `app_id` header.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Sets the access token sent in the `token` header.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the per-request timeout.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the total number of attempts for retryable failures.
    ///
    /// Default: 3
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Sets the retry delay schedule.
    ///
    /// Default: doubling from 300ms, capped at 10 seconds
    pub fn backoff(mut self, backoff: RetryBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Disables gzip compression of request bodies.
    pub fn no_compress(mut self) -> Self {
        self.compress = false;
        self
    }

    /// Enables the debug simulation hook: posts skip the network, sleep
    /// `|ms|` milliseconds and report success iff `ms >= 0`.
    pub fn simulate(mut self, ms: i64) -> Self {
        self.simulate = Some(ms);
        self
    }

    /// Uses the given meter table for compression statistics.
    ///
    /// Default: [`Meters::global`]
    pub fn meters(mut self, meters: Meters) -> Self {
        self.meters = Some(meters);
        self
    }

    /// Builds the transport.
    pub fn build(self) -> HttpTransport {
        let meters = self.meters.unwrap_or_else(Meters::global);
        HttpTransport::new(
            TransportConfig {
                server_url: self.server_url,
                app_id: self.app_id,
                token: self.token,
                timeout: self.timeout,
                retries: self.retries,
                backoff: self.backoff,
                compress: self.compress,
                simulate: self.simulate,
            },
            meters,
        )
    }
}

impl Default for TransportConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
