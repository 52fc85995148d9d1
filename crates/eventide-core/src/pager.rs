//! Out-of-band error and warning channel.
//!
//! SDK-internal failures are never raised to the caller once an event has
//! been accepted; they are published to registered pager listeners instead.
//! Emission is panic-isolated: a misbehaving listener cannot take down the
//! flusher or starve the remaining listeners.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Stable pager codes, laid out as `4 CC NN MMM`:
/// `4` marks an error-class code, `CC` the component namespace
/// (`00` common, `01` consumer), `NN` the category (`00` common,
/// `01` network, `02` data) and `MMM` the concrete code.
pub mod codes {
    /// Common namespace base.
    pub const COMMON: u32 = 40_000_000;

    /// Network error base. Codes `1xx`-`5xx` above this base are reserved
    /// for standard HTTP status codes.
    pub const NETWORK_ERROR: u32 = 40_001_000;
    /// Retries were exhausted without reaching the collector.
    pub const SUB_NETWORK_MAX_RETRIES: u32 = 901;
    /// The connection could not be established.
    pub const SUB_NETWORK_CONNECTION: u32 = 902;
    /// The body of a single event is oversize and can never be sent.
    pub const SUB_NETWORK_OVERSIZE: u32 = 903;
    /// Any other transport failure.
    pub const SUB_NETWORK_OTHER: u32 = 999;

    /// The collector rejected a batch semantically.
    pub const DATA_ERROR: u32 = 40_002_000;

    /// Async batch consumer: the queue crossed its warning watermark.
    pub const ASYNC_BATCH_QUEUE_REACH_THRESHOLD: u32 = 40_101_001;
    /// Async batch consumer: the queue is full and records were dropped.
    pub const ASYNC_BATCH_QUEUE_FULL: u32 = 40_101_002;
}

/// Severity attached to quality-channel reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLevel {
    Error,
    Warning,
    Message,
}

impl QualityLevel {
    /// Numeric level as carried on the wire.
    pub fn value(self) -> u8 {
        match self {
            QualityLevel::Error => 1,
            QualityLevel::Warning => 2,
            QualityLevel::Message => 3,
        }
    }
}

type Listener = Arc<dyn Fn(u32, &str) + Send + Sync>;

/// Handle returned by [`PagerHub::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerHandle(u64);

/// Registry of pager listeners.
///
/// Cheap to clone; all clones share the same listener set. Emission
/// snapshots the listeners outside the lock and catches panics per
/// listener, so a pager call can never block or poison the emitting
/// thread.
#[derive(Clone, Default)]
pub struct PagerHub {
    inner: Arc<HubInner>,
}

#[derive(Default)]
struct HubInner {
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl PagerHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns a handle for later removal.
    pub fn register<F>(&self, listener: F) -> PagerHandle
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        PagerHandle(id)
    }

    /// Removes a previously registered listener. Unknown handles are ignored.
    pub fn unregister(&self, handle: PagerHandle) {
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.retain(|(id, _)| *id != handle.0);
        }
    }

    /// Publishes `(code, message)` to every registered listener.
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    pub fn emit(&self, code: u32, message: &str) {
        let snapshot: Vec<Listener> = match self.inner.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener(code, message);
            }));
            if result.is_err() {
                tracing::warn!(code, message, "pager listener panicked");
            }
        }
    }

    /// Returns true if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.inner
            .listeners
            .lock()
            .map(|l| l.is_empty())
            .unwrap_or(true)
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl fmt::Debug for PagerHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagerHub").field("len", &self.len()).finish()
    }
}
