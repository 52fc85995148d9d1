//! Idle self-termination and revival.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eventide_pool::PoolConfig;
use tokio::time::sleep;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn idle_workers_exit_after_keep_alive_and_next_submission_revives_them() {
    let all_stopped = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&all_stopped);
    let pool = PoolConfig::builder()
        .name("keepalive")
        .size(3)
        .keep_alive(Duration::from_millis(100))
        .on_all_workers_stop(move || {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    assert!(pool.execute(move || async move {
        r.fetch_add(1, Ordering::SeqCst);
    }));

    // Well past keep_alive with no submissions: every worker has exited.
    sleep(Duration::from_millis(400)).await;
    assert_eq!(all_stopped.load(Ordering::SeqCst), 1);
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    // The next submission revives the workers and the task completes.
    let r = Arc::clone(&ran);
    assert!(pool.execute(move || async move {
        r.fetch_add(1, Ordering::SeqCst);
    }));
    sleep(Duration::from_millis(150)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 2);

    pool.terminate().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn steady_work_keeps_workers_alive() {
    let all_stopped = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&all_stopped);
    let pool = PoolConfig::builder()
        .name("keepalive")
        .keep_alive(Duration::from_millis(150))
        .on_all_workers_stop(move || {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..6 {
        let r = Arc::clone(&ran);
        pool.execute(move || async move {
            r.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(all_stopped.load(Ordering::SeqCst), 0, "never idle long enough");
    assert_eq!(ran.load(Ordering::SeqCst), 6);
    pool.terminate().await;
    assert_eq!(all_stopped.load(Ordering::SeqCst), 1);
}
