//! Worker pool implementation.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::config::PoolConfig;

type Task = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

enum Job {
    Run(Task),
    Terminate,
}

struct Entry {
    ready_at: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.ready_at == other.ready_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.ready_at
            .cmp(&other.ready_at)
            .then(self.seq.cmp(&other.seq))
    }
}

struct QueueState {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    terminated: bool,
}

struct Shared {
    name: String,
    size: usize,
    keep_alive: Option<Duration>,
    state: Mutex<QueueState>,
    notify: Notify,
    barrier: watch::Sender<bool>,
    live: AtomicUsize,
    on_all_workers_stop: Option<crate::config::Callback>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Terminate sentinels sort after every real task, scheduled or not.
fn sentinel_ready_at() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365)
}

/// A fixed-size pool of workers draining one min-priority queue of
/// `(ready_at, task)` entries.
///
/// See the crate docs for the scheduling model. All methods take `&self`;
/// the pool is meant to be shared behind an `Arc` or owned by a single
/// coordinator.
pub struct WorkerPool {
    shared: Arc<Shared>,
    /// Captured at construction so submissions work from any thread.
    runtime: tokio::runtime::Handle,
    workers: Mutex<Vec<Option<JoinHandle<()>>>>,
    started: AtomicBool,
    terminated: AtomicBool,
    on_terminate: Option<crate::config::Callback>,
}

impl WorkerPool {
    pub(crate) fn new(config: PoolConfig) -> Self {
        let (barrier, _) = watch::channel(true);
        Self {
            runtime: tokio::runtime::Handle::current(),
            shared: Arc::new(Shared {
                name: config.name,
                size: config.size,
                keep_alive: config.keep_alive,
                state: Mutex::new(QueueState {
                    heap: BinaryHeap::new(),
                    next_seq: 0,
                    terminated: false,
                }),
                notify: Notify::new(),
                barrier,
                live: AtomicUsize::new(0),
                on_all_workers_stop: config.on_all_workers_stop,
            }),
            workers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            on_terminate: config.on_terminate,
        }
    }

    /// Number of workers this pool was configured with.
    pub fn len(&self) -> usize {
        self.shared.size
    }

    /// Always false; a pool has at least one worker slot.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True once [`terminate`](Self::terminate) has run.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Submits a task for immediate execution.
    ///
    /// Returns `false` if the pool has been terminated. Workers are spawned
    /// (or revived) here, on the runtime captured at construction, so this
    /// is callable from any thread.
    pub fn execute<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.execute_delayed(task, Duration::ZERO)
    }

    /// Submits a task to run no earlier than `delay` from now.
    pub fn execute_delayed<F, Fut>(&self, task: F, delay: Duration) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.terminated.load(Ordering::Acquire) {
            tracing::debug!(pool = %self.shared.name, "task rejected, pool is terminated");
            return false;
        }
        self.ensure_workers();

        let boxed: Task = Box::new(move || task().boxed());
        {
            let mut state = relock(&self.shared.state);
            if state.terminated {
                return false;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.heap.push(Reverse(Entry {
                ready_at: Instant::now() + delay,
                seq,
                job: Job::Run(boxed),
            }));
        }
        self.shared.notify.notify_one();
        true
    }

    /// Pauses all workers before their next dequeue.
    ///
    /// Remember to call [`remove_barrier`](Self::remove_barrier); nothing
    /// runs while the barrier is down, including terminate sentinels.
    pub fn place_barrier(&self) {
        self.shared.barrier.send_replace(false);
    }

    /// Lifts the barrier and lets workers continue.
    pub fn remove_barrier(&self) {
        self.shared.barrier.send_replace(true);
    }

    /// Terminates the pool: posts one sentinel per worker, wakes everyone
    /// and waits for all workers to exit. Pending tasks that sort before
    /// the sentinels still run.
    pub async fn terminate(&self) {
        if !self.started.load(Ordering::Acquire) {
            self.terminated.store(true, Ordering::Release);
            return;
        }
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(pool = %self.shared.name, "terminating");

        {
            let mut state = relock(&self.shared.state);
            state.terminated = true;
            for _ in 0..self.shared.size {
                let seq = state.next_seq;
                state.next_seq += 1;
                state.heap.push(Reverse(Entry {
                    ready_at: sentinel_ready_at(),
                    seq,
                    job: Job::Terminate,
                }));
            }
        }
        self.shared.notify.notify_waiters();
        for _ in 0..self.shared.size {
            self.shared.notify.notify_one();
        }

        let handles: Vec<JoinHandle<()>> = relock(&self.workers)
            .drain(..)
            .flatten()
            .collect();
        for handle in handles {
            let _ = handle.await;
        }

        relock(&self.shared.state).heap.clear();
        if let Some(callback) = &self.on_terminate {
            callback();
        }
        tracing::debug!(pool = %self.shared.name, "terminated");
    }

    /// Spawns missing workers and revives ones that stopped on idle.
    fn ensure_workers(&self) {
        let mut workers = relock(&self.workers);
        if workers.is_empty() {
            for idx in 0..self.shared.size {
                workers.push(Some(self.spawn_worker(idx)));
            }
            self.started.store(true, Ordering::Release);
            tracing::debug!(pool = %self.shared.name, size = self.shared.size, "started");
            return;
        }
        for (idx, slot) in workers.iter_mut().enumerate() {
            let finished = slot.as_ref().map_or(true, JoinHandle::is_finished);
            if finished {
                tracing::debug!(pool = %self.shared.name, idx, "reviving stopped worker");
                *slot = Some(self.spawn_worker(idx));
            }
        }
    }

    fn spawn_worker(&self, idx: usize) -> JoinHandle<()> {
        self.shared.live.fetch_add(1, Ordering::AcqRel);
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(worker_loop(idx, shared))
    }
}

async fn worker_loop(idx: usize, shared: Arc<Shared>) {
    let name = format!("{}#{}", shared.name, idx);
    tracing::debug!(worker = %name, "worker running");
    let mut barrier = shared.barrier.subscribe();

    loop {
        while !*barrier.borrow_and_update() {
            if barrier.changed().await.is_err() {
                break;
            }
        }

        enum Step {
            Job(Job),
            Idle,
            NotReady(Duration),
        }

        let step = {
            let mut state = relock(&shared.state);
            let now = Instant::now();
            match state.heap.peek() {
                None => Step::Idle,
                Some(Reverse(entry)) => {
                    // Sentinels act immediately once popped, whatever their
                    // nominal ready time; real tasks honor it.
                    let is_sentinel = matches!(entry.job, Job::Terminate);
                    if !is_sentinel && entry.ready_at > now {
                        Step::NotReady(entry.ready_at - now)
                    } else {
                        match state.heap.pop() {
                            Some(Reverse(entry)) => Step::Job(entry.job),
                            None => Step::Idle,
                        }
                    }
                }
            }
        };

        match step {
            Step::Job(Job::Terminate) => {
                tracing::debug!(worker = %name, "got the terminate signal");
                break;
            }
            Step::Job(Job::Run(task)) => {
                let outcome = AssertUnwindSafe(task()).catch_unwind().await;
                if outcome.is_err() {
                    tracing::warn!(worker = %name, "task panicked");
                }
            }
            Step::Idle => {
                let mut notified = pin!(shared.notify.notified());
                notified.as_mut().enable();
                // A submission may have landed between the peek and the
                // registration above.
                if !relock(&shared.state).heap.is_empty() {
                    continue;
                }
                match shared.keep_alive {
                    Some(keep_alive) => {
                        let timed_out = tokio::time::timeout(keep_alive, notified).await.is_err();
                        if timed_out && relock(&shared.state).heap.is_empty() {
                            tracing::debug!(worker = %name, "idle timeout, stopping");
                            break;
                        }
                    }
                    None => notified.await,
                }
            }
            Step::NotReady(wait) => {
                let mut notified = pin!(shared.notify.notified());
                notified.as_mut().enable();
                let _ = tokio::time::timeout(wait, notified).await;
            }
        }
    }

    if shared.live.fetch_sub(1, Ordering::AcqRel) == 1 {
        if let Some(callback) = &shared.on_all_workers_stop {
            callback();
        }
    }
    tracing::debug!(worker = %name, "worker stopped");
}
