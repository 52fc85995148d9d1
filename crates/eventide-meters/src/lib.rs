//! Counter and timing meters.
//!
//! The pipeline keeps its delivery statistics (inserted, uploaded, dropped,
//! compression rates, flush durations) in one process-lifetime table rather
//! than scattering atomics across components. [`Meters`] is an explicit
//! context handle: components receive it from whoever wires the pipeline
//! together, and tests get a fresh table per scenario. A lazily-initialized
//! [`Meters::global`] is offered for callers that genuinely want one table
//! per process.
//!
//! ```
//! use eventide_meters::Meters;
//!
//! let meters = Meters::new();
//! meters.add("uploads", 3.0);
//! assert_eq!(meters.get("uploads"), 3.0);
//!
//! let avg = meters.count_avg("latency_ms", 12.0, 1000, 100);
//! assert_eq!(avg, 12.0);
//! ```

mod timer;

pub use timer::Timer;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

pub(crate) struct Tables {
    counters: HashMap<String, f64>,
    // name -> (avg seconds, sample count)
    timers: HashMap<String, (f64, u64)>,
}

/// Shared counter and timer tables behind one read-many/write-one lock.
///
/// Cloning is cheap and all clones observe the same tables.
#[derive(Clone)]
pub struct Meters {
    tables: Arc<RwLock<Tables>>,
}

impl Default for Meters {
    fn default() -> Self {
        Self::new()
    }
}

impl Meters {
    /// Creates an empty meter table.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables {
                counters: HashMap::new(),
                timers: HashMap::new(),
            })),
        }
    }

    /// The process-wide table, initialized on first use.
    pub fn global() -> Meters {
        static GLOBAL: LazyLock<Meters> = LazyLock::new(Meters::new);
        GLOBAL.clone()
    }

    /// Current value of `name`, `0.0` when never written.
    pub fn get(&self, name: &str) -> f64 {
        match self.tables.read() {
            Ok(tables) => tables.counters.get(name).copied().unwrap_or(0.0),
            Err(_) => 0.0,
        }
    }

    /// Overwrites `name` with `value`.
    pub fn set(&self, name: &str, value: f64) {
        self.apply(name, |_| value);
    }

    /// Adds `delta` to `name`.
    pub fn add(&self, name: &str, delta: f64) {
        self.apply(name, |v| v + delta);
    }

    /// Atomically replaces `name` with `op(current)`.
    pub fn apply(&self, name: &str, op: impl FnOnce(f64) -> f64) {
        if let Ok(mut tables) = self.tables.write() {
            let entry = tables.counters.entry(name.to_string()).or_insert(0.0);
            *entry = op(*entry);
        }
    }

    /// Folds `x` into the running average stored under `name`, returning the
    /// new average.
    ///
    /// The companion key `{name}_avgcnt` holds the sample count. Once the
    /// count reaches `cap` it wraps back to `floor`, so the average keeps
    /// responding to recent samples instead of freezing under the weight of
    /// history. The wrap makes the average non-stationary on purpose; only
    /// bounded error should be assumed.
    pub fn count_avg(&self, name: &str, x: f64, cap: u64, floor: u64) -> f64 {
        let Ok(mut tables) = self.tables.write() else {
            return x;
        };
        let count_key = format!("{name}_avgcnt");
        let n = tables.counters.get(&count_key).copied().unwrap_or(0.0);
        let old = tables.counters.get(name).copied().unwrap_or(0.0);

        let avg = (old * n + x) / (n + 1.0);
        let mut next = n as u64 + 1;
        if next >= cap {
            next = floor.max(1);
        }
        tables.counters.insert(name.to_string(), avg);
        tables.counters.insert(count_key, next as f64);
        avg
    }

    /// Starts a timer that will record under `name` when stopped.
    pub fn start_timer(&self, name: &str) -> Timer {
        Timer::new(name.to_string(), self.clone())
    }

    pub(crate) fn record_timer(&self, name: &str, elapsed_secs: f64) {
        if let Ok(mut tables) = self.tables.write() {
            let (avg, count) = tables.timers.get(name).copied().unwrap_or((0.0, 0));
            let folded = (avg * count as f64 + elapsed_secs) / (count + 1) as f64;
            tables.timers.insert(name.to_string(), (folded, count + 1));
        }
    }

    /// Average recorded duration for `name` in milliseconds.
    pub fn timer_avg_ms(&self, name: &str) -> Option<f64> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.timers.get(name).map(|(avg, _)| avg * 1000.0))
    }

    /// Total recorded duration for `name` in milliseconds.
    pub fn timer_sum_ms(&self, name: &str) -> Option<f64> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.timers.get(name).map(|(avg, n)| avg * *n as f64 * 1000.0))
    }

    /// Number of samples recorded for `name`.
    pub fn timer_count(&self, name: &str) -> Option<u64> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.timers.get(name).map(|(_, n)| *n))
    }

    /// Removes the timer aggregate for `name`, returning what was stored.
    pub fn remove_timer(&self, name: &str) -> Option<(f64, u64)> {
        self.tables.write().ok().and_then(|mut t| t.timers.remove(name))
    }
}
