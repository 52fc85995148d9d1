//! Delayed dispatch under load.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use eventide_pool::PoolConfig;
use tokio::time::sleep;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delayed_tasks_fire_in_ready_time_order() {
    let pool = PoolConfig::builder().name("sched").size(1).build();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (label, delay_ms) in [("c", 120u64), ("a", 20), ("b", 60)] {
        let order = Arc::clone(&order);
        pool.execute_delayed(
            move || async move {
                order.lock().unwrap().push(label);
            },
            Duration::from_millis(delay_ms),
        );
    }

    sleep(Duration::from_millis(300)).await;
    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    pool.terminate().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_burst_across_workers_all_completes() {
    let pool = PoolConfig::builder().name("sched").size(4).build();
    let done = Arc::new(Mutex::new(0usize));

    let started = Instant::now();
    for _ in 0..100 {
        let done = Arc::clone(&done);
        pool.execute(move || async move {
            sleep(Duration::from_millis(5)).await;
            *done.lock().unwrap() += 1;
        });
    }
    pool.terminate().await;

    assert_eq!(*done.lock().unwrap(), 100);
    // Sanity: four workers ran the 500ms of nominal work concurrently.
    assert!(started.elapsed() < Duration::from_secs(5));
}
