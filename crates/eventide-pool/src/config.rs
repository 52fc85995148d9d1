//! Configuration for the worker pool.

use std::sync::Arc;
use std::time::Duration;

use crate::pool::WorkerPool;

pub(crate) type Callback = Arc<dyn Fn() + Send + Sync>;

/// Configuration for a [`WorkerPool`].
pub struct PoolConfig {
    /// Pool name; workers are named `{name}#{idx}`.
    pub(crate) name: String,
    /// Number of workers.
    pub(crate) size: usize,
    /// Idle time after which a worker stops itself. `None` keeps workers
    /// alive until [`WorkerPool::terminate`].
    pub(crate) keep_alive: Option<Duration>,
    /// Fires whenever the last live worker exits (idle stop included).
    pub(crate) on_all_workers_stop: Option<Callback>,
    /// Fires once on full terminate.
    pub(crate) on_terminate: Option<Callback>,
}

impl PoolConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }
}

/// Builder for [`PoolConfig`].
pub struct PoolConfigBuilder {
    name: String,
    size: usize,
    keep_alive: Option<Duration>,
    on_all_workers_stop: Option<Callback>,
    on_terminate: Option<Callback>,
}

impl PoolConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "workers".to_string(),
            size: 1,
            keep_alive: None,
            on_all_workers_stop: None,
            on_terminate: None,
        }
    }

    /// Sets the pool name.
    ///
    /// Default: "workers"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the number of workers. Clamped to at least 1.
    ///
    /// Default: 1
    pub fn size(mut self, size: usize) -> Self {
        self.size = size.max(1);
        self
    }

    /// Lets idle workers stop themselves after `duration` without work.
    ///
    /// Stopped workers are revived by the next submission.
    /// Default: workers stay alive until terminate.
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = Some(duration);
        self
    }

    /// Registers a callback invoked whenever the last live worker exits,
    /// whether through idle timeout or terminate.
    pub fn on_all_workers_stop<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_all_workers_stop = Some(Arc::new(f));
        self
    }

    /// Registers a callback invoked once when the pool is terminated.
    pub fn on_terminate<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_terminate = Some(Arc::new(f));
        self
    }

    /// Builds the pool, capturing the current Tokio runtime handle for
    /// worker spawning. Workers themselves start lazily on the first
    /// submission.
    ///
    /// # Panics
    ///
    /// Panics if called from outside a Tokio runtime.
    pub fn build(self) -> WorkerPool {
        WorkerPool::new(PoolConfig {
            name: self.name,
            size: self.size,
            keep_alive: self.keep_alive,
            on_all_workers_stop: self.on_all_workers_stop,
            on_terminate: self.on_terminate,
        })
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
