//! Shutdown drain tests.

use std::time::Duration;

use eventide_transport::TransportError;

use super::{consumer, records, FakeTransport};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_drains_everything_on_a_healthy_backend() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 100, 10_000);

    consumer.add(|| records(250));
    consumer.close().await;

    assert_eq!(consumer.queue_len(), 0);
    assert_eq!(consumer.meters().get("async_batch.uploaded"), 250.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_gives_up_against_a_permanently_failing_backend() {
    let transport = FakeTransport::scripted(
        std::iter::repeat_with(|| {
            Err(TransportError::Network {
                subcode: eventide_core::pager::codes::SUB_NETWORK_MAX_RETRIES,
            })
        })
        .take(64)
        .collect(),
    );
    let consumer = consumer(transport.clone(), 100, 10_000);

    consumer.add(|| records(40));

    // close_retry defaults to 1: the drain loop tolerates the same queue
    // size twice, then returns instead of looping forever.
    let closed = tokio::time::timeout(Duration::from_secs(10), consumer.close()).await;
    assert!(closed.is_ok(), "close() must return against a dead backend");

    assert_eq!(consumer.queue_len(), 40, "records remain unsent");
    assert_eq!(consumer.meters().get("async_batch.uploaded"), 0.0);

    let meters = consumer.meters();
    let accounted = meters.get("async_batch.uploaded")
        + meters.get("async_batch.dropped")
        + consumer.queue_len() as f64;
    assert_eq!(accounted, meters.get("async_batch.inserted"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn adds_after_close_are_silent_noops() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 100, 10_000);

    consumer.add(|| records(2));
    consumer.close().await;
    let uploaded = consumer.meters().get("async_batch.uploaded");

    consumer.add(|| records(5));
    consumer.flush();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(consumer.queue_len(), 0);
    assert_eq!(consumer.meters().get("async_batch.uploaded"), uploaded);
    assert_eq!(consumer.meters().get("async_batch.inserted"), 2.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_twice_is_harmless()  {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 100, 10_000);
    consumer.add(|| records(3));
    consumer.close().await;
    consumer.close().await;
    assert_eq!(consumer.meters().get("async_batch.uploaded"), 3.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_failure_mid_drain_still_terminates() {
    // Success, then permanent failure: the first chunk is delivered, the
    // drain gives up on the rest.
    let mut script: Vec<Result<(), TransportError>> = vec![Ok(())];
    script.extend(std::iter::repeat_with(|| {
        Err(TransportError::Network { subcode: 901 })
    })
    .take(32));
    let transport = FakeTransport::scripted(script);
    let consumer = consumer(transport.clone(), 20, 10_000);

    consumer.add(|| records(50));
    let closed = tokio::time::timeout(Duration::from_secs(10), consumer.close()).await;
    assert!(closed.is_ok());

    assert_eq!(consumer.meters().get("async_batch.uploaded"), 20.0);
    assert_eq!(consumer.queue_len(), 30);
}
