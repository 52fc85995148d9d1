//! Timer state machine.

use std::time::{Duration, Instant};

use crate::Meters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Paused,
    Stopped,
}

/// A running stopwatch tied to a meter name.
///
/// Started on creation. `pause`/`resume` exclude gaps from the measured
/// time; `stop` optionally folds the sample into the owning [`Meters`]
/// timer table. Calling a transition from the wrong state is a no-op that
/// logs a warning, mirroring how the meters behave for misuse rather than
/// panicking inside instrumentation.
pub struct Timer {
    name: String,
    meters: Meters,
    accumulated: Duration,
    started_at: Instant,
    state: State,
}

impl Timer {
    pub(crate) fn new(name: String, meters: Meters) -> Self {
        Self {
            name,
            meters,
            accumulated: Duration::ZERO,
            started_at: Instant::now(),
            state: State::Running,
        }
    }

    /// Pauses the stopwatch. Only valid while running.
    pub fn pause(&mut self) {
        if self.state == State::Running {
            self.accumulated += self.started_at.elapsed();
            self.state = State::Paused;
        } else {
            tracing::warn!(name = %self.name, state = ?self.state, "timer pause ignored");
        }
    }

    /// Resumes a paused stopwatch.
    pub fn resume(&mut self) {
        if self.state == State::Paused {
            self.started_at = Instant::now();
            self.state = State::Running;
        } else {
            tracing::warn!(name = %self.name, state = ?self.state, "timer resume ignored");
        }
    }

    /// Elapsed time so far in milliseconds, without changing state.
    pub fn peek(&self) -> f64 {
        let total = match self.state {
            State::Running => self.accumulated + self.started_at.elapsed(),
            _ => self.accumulated,
        };
        total.as_secs_f64() * 1000.0
    }

    /// Stops the stopwatch and returns the elapsed milliseconds.
    ///
    /// The sample is folded into the meter table only when `record` is
    /// true. Stopping twice returns `-1.0` and records nothing.
    pub fn stop(&mut self, record: bool) -> f64 {
        if self.state == State::Stopped {
            tracing::warn!(name = %self.name, "timer already stopped");
            return -1.0;
        }
        if self.state == State::Running {
            self.accumulated += self.started_at.elapsed();
        }
        self.state = State::Stopped;

        let elapsed = self.accumulated;
        if record {
            self.meters.record_timer(&self.name, elapsed.as_secs_f64());
        }
        elapsed.as_secs_f64() * 1000.0
    }

    /// Stops the stopwatch, recording only if `predicate(elapsed_ms)` holds.
    pub fn stop_if(&mut self, predicate: impl FnOnce(f64) -> bool) -> f64 {
        if self.state == State::Stopped {
            tracing::warn!(name = %self.name, "timer already stopped");
            return -1.0;
        }
        if self.state == State::Running {
            self.accumulated += self.started_at.elapsed();
        }
        self.state = State::Stopped;

        let elapsed_ms = self.accumulated.as_secs_f64() * 1000.0;
        if predicate(elapsed_ms) {
            self.meters
                .record_timer(&self.name, self.accumulated.as_secs_f64());
        }
        elapsed_ms
    }
}
