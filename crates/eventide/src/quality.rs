//! Fire-and-forget quality reporting.

use std::sync::Arc;
use std::time::Duration;

use eventide_core::QualityLevel;
use eventide_pool::{PoolConfig, WorkerPool};
use eventide_transport::{Transport, SDK_TYPE, SDK_VERSION};

/// Default endpoint for out-of-band diagnostics.
pub const DEFAULT_QUALITY_URL: &str = "https://debug.roiquery.com/debug";

/// Idle timeout for the reporting worker; reports are rare, so the worker
/// lives only as long as it is needed.
const QUALITY_KEEP_ALIVE: Duration = Duration::from_millis(100);

/// Posts diagnostic reports to a quality endpoint, off the caller's path.
///
/// Reports are best-effort: failures are logged and never surfaced.
pub struct QualityReporter {
    app_id: String,
    endpoint: String,
    transport: Arc<dyn Transport>,
    pool: WorkerPool,
}

impl QualityReporter {
    /// Creates a reporter against [`DEFAULT_QUALITY_URL`].
    pub fn new(app_id: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::with_endpoint(app_id, DEFAULT_QUALITY_URL, transport)
    }

    /// Creates a reporter against a custom endpoint.
    pub fn with_endpoint(
        app_id: impl Into<String>,
        endpoint: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            endpoint: endpoint.into(),
            transport,
            pool: PoolConfig::builder()
                .name("eventide-quality")
                .keep_alive(QUALITY_KEEP_ALIVE)
                .build(),
        }
    }

    /// Submits one report. Returns immediately; delivery happens on the
    /// reporting worker.
    pub fn report(&self, code: u32, message: &str, level: QualityLevel) {
        let payload = serde_json::json!({
            "app_id": self.app_id,
            "error_code": code,
            "error_level": level.value(),
            "error_message": message,
            "sdk_type": SDK_TYPE,
            "sdk_version_name": SDK_VERSION,
            "os_version_name": std::env::consts::OS,
            "device_model": std::env::consts::ARCH,
        })
        .to_string();

        let transport = Arc::clone(&self.transport);
        let url = self.endpoint.clone();
        let submitted = self.pool.execute(move || async move {
            if transport.post_raw(&url, payload).await {
                tracing::debug!("quality report delivered");
            } else {
                tracing::warn!("quality report failed");
            }
        });
        if !submitted {
            tracing::debug!("quality report skipped, reporter is shut down");
        }
    }

    /// Stops the reporting worker after pending reports are delivered.
    pub async fn shutdown(&self) {
        self.pool.terminate().await;
    }
}
