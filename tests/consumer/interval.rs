//! Flush timer behavior tests.

use std::time::Duration;

use super::{consumer_with_interval, records, FakeTransport};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_idle_consumer_never_flushes() {
    let transport = FakeTransport::ok();
    let consumer = consumer_with_interval(
        transport.clone(),
        10_000,
        10_000,
        Duration::from_millis(100),
    );

    // Several intervals pass with nothing queued; the timer parks instead
    // of posting empty bodies.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(transport.post_count(), 0);
    consumer.close().await;
    assert_eq!(transport.post_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_quiet_period_flushes_a_partial_group() {
    let transport = FakeTransport::ok();
    let consumer = consumer_with_interval(
        transport.clone(),
        10_000,
        10_000,
        Duration::from_millis(100),
    );

    // Far below flush_len, so only the timer can deliver this.
    consumer.add(|| records(3));
    let mut waited = 0;
    while transport.post_count() == 0 && waited < 200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    assert_eq!(transport.post_count(), 1);
    assert_eq!(transport.posts()[0].0, 3);
    consumer.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn the_timer_keeps_flushing_while_events_trickle_in() {
    let transport = FakeTransport::ok();
    let consumer = consumer_with_interval(
        transport.clone(),
        10_000,
        10_000,
        Duration::from_millis(80),
    );

    for chunk in 0..3 {
        consumer.add(move || super::records_from(chunk * 2, 2));
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    consumer.close().await;

    assert_eq!(consumer.meters().get("async_batch.uploaded"), 6.0);
    assert!(transport.post_count() >= 2, "timer flushed between chunks");
}
