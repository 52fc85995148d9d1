//! Error types for the collector transport.

/// Classified outcome of a failed post.
///
/// `Network` is retryable at the batching layer (the batch goes back to the
/// queue head); `IllegalData` is permanent; `Oversize` is retryable only by
/// splitting, so a single-event oversize batch must be dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Transport-level failure. Subcodes `1xx`-`5xx` carry the HTTP status;
    /// `901`/`902`/`999` are the max-retries / connection / other subcodes.
    #[error("network failure (subcode {subcode})")]
    Network { subcode: u32 },
    /// The collector understood the request and rejected its content.
    #[error("collector rejected the batch: {message}")]
    IllegalData { message: String },
    /// The collector refused the body for size.
    #[error("collector refused {received} bytes (compressed {compressed}, limit {limit})")]
    Oversize {
        received: u64,
        compressed: u64,
        limit: u64,
    },
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
