//! Interval flush timer.
//!
//! One task per consumer. It waits on an awake signal with `interval`
//! timeout and submits a flush when the quiet period elapses. Explicit
//! flushes refresh the wait so the timer never piles onto a flush that
//! just happened, and an empty queue parks the task on a second, untimed
//! signal so an idle pipeline does not poll.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::consumer::Inner;

#[derive(Default)]
struct Flags {
    stop: bool,
    refresh: bool,
}

pub(crate) struct TimerShared {
    awake: Notify,
    resume: Notify,
    flags: Mutex<Flags>,
}

impl TimerShared {
    pub(crate) fn new() -> Self {
        Self {
            awake: Notify::new(),
            resume: Notify::new(),
            flags: Mutex::new(Flags::default()),
        }
    }

    /// Restarts the quiet-period countdown from now.
    pub(crate) fn refresh(&self) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.refresh = true;
        }
        self.awake.notify_one();
    }

    /// Wakes the timer out of its empty-queue park.
    pub(crate) fn resume(&self) {
        self.resume.notify_one();
    }

    fn request_stop(&self) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.stop = true;
        }
        self.awake.notify_one();
        self.resume.notify_one();
    }

    /// Reads the stop flag and clears the refresh flag.
    fn consume_flags(&self) -> (bool, bool) {
        match self.flags.lock() {
            Ok(mut flags) => {
                let out = (flags.stop, flags.refresh);
                flags.refresh = false;
                out
            }
            Err(_) => (true, false),
        }
    }

    fn should_stop(&self) -> bool {
        self.flags.lock().map(|f| f.stop).unwrap_or(true)
    }
}

pub(crate) struct FlushTimer {
    shared: Arc<TimerShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FlushTimer {
    /// Spawns the timer task. Must run within a Tokio runtime.
    pub(crate) fn spawn(
        inner: Arc<Inner>,
        shared: Arc<TimerShared>,
        interval: Duration,
    ) -> Self {
        let task_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move {
            loop {
                let _ = tokio::time::timeout(interval, task_shared.awake.notified()).await;
                let (stop, refresh) = task_shared.consume_flags();
                if stop {
                    crate::consumer::submit_flush(&inner);
                    break;
                }
                if refresh {
                    continue;
                }
                if !inner.has_pending() {
                    task_shared.resume.notified().await;
                    if task_shared.should_stop() {
                        crate::consumer::submit_flush(&inner);
                        break;
                    }
                    continue;
                }
                crate::consumer::submit_flush(&inner);
            }
            tracing::debug!("flush timer stopped");
        });
        Self {
            shared,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Requests stop (the task submits one last flush) and joins it.
    pub(crate) async fn stop(&self) {
        self.shared.request_stop();
        let handle = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
