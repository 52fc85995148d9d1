//! Failure disposition tests: what happens to a drained batch when the
//! collector or the network rejects it.

use std::sync::{Arc, Mutex};

use eventide_core::pager::codes;
use eventide_transport::TransportError;

use super::{consumer, records, FakeTransport};

fn network(subcode: u32) -> Result<(), TransportError> {
    Err(TransportError::Network { subcode })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transient_failures_recover_in_order() {
    // First three posts fail, the rest succeed.
    let transport = FakeTransport::scripted(vec![
        network(codes::SUB_NETWORK_MAX_RETRIES),
        network(codes::SUB_NETWORK_CONNECTION),
        network(codes::SUB_NETWORK_OTHER),
    ]);
    let consumer = consumer(transport.clone(), 25, 10_000);
    let network_pages = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&network_pages);
    consumer.pager().register(move |code, _| {
        if (codes::NETWORK_ERROR..codes::DATA_ERROR).contains(&code) {
            p.lock().unwrap().push(code);
        }
    });

    consumer.add(|| records(50));
    consumer.close().await;

    assert_eq!(consumer.meters().get("async_batch.uploaded"), 50.0);
    assert_eq!(consumer.meters().get("async_batch.dropped"), 0.0);

    // Requeued batches went back to the head, so the stream arrives in the
    // original order with repeats only from the failed attempts.
    let mut last_success_order: Vec<i64> = transport.uploaded_seqs();
    last_success_order.sort_unstable();
    last_success_order.dedup();
    assert_eq!(last_success_order, (0..50).collect::<Vec<i64>>());

    let pages = network_pages.lock().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0], codes::NETWORK_ERROR + codes::SUB_NETWORK_MAX_RETRIES);
    assert_eq!(pages[1], codes::NETWORK_ERROR + codes::SUB_NETWORK_CONNECTION);
    assert_eq!(pages[2], codes::NETWORK_ERROR + codes::SUB_NETWORK_OTHER);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn collector_rejection_is_permanent() {
    let transport = FakeTransport::scripted(vec![Err(TransportError::IllegalData {
        message: "malformed record".to_string(),
    })]);
    let consumer = consumer(transport.clone(), 100, 10_000);
    let data_pages = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&data_pages);
    consumer.pager().register(move |code, message| {
        if code == codes::DATA_ERROR {
            p.lock().unwrap().push(message.to_string());
        }
    });

    consumer.add(|| records(8));
    consumer.close().await;

    assert_eq!(transport.post_count(), 1, "no retry for semantic rejection");
    assert_eq!(consumer.meters().get("async_batch.uploaded"), 0.0);
    assert_eq!(consumer.meters().get("async_batch.dropped"), 8.0);
    assert!(data_pages.lock().unwrap()[0].contains("malformed record"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversize_single_event_drops_without_a_retry_loop() {
    let transport = FakeTransport::scripted(vec![Err(TransportError::Oversize {
        received: 40_000_000,
        compressed: 20_000_000,
        limit: 10_000_000,
    })]);
    let consumer = consumer(transport.clone(), 100, 10_000);
    let oversize_pages = Arc::new(Mutex::new(0usize));
    let p = Arc::clone(&oversize_pages);
    consumer.pager().register(move |code, _| {
        if code == codes::NETWORK_ERROR + codes::SUB_NETWORK_OVERSIZE {
            *p.lock().unwrap() += 1;
        }
    });

    consumer.add(|| records(1));
    consumer.close().await;

    assert_eq!(transport.post_count(), 1, "dropped exactly once, no loop");
    assert_eq!(consumer.meters().get("async_batch.dropped"), 1.0);
    assert_eq!(*oversize_pages.lock().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversize_batch_is_requeued_and_eventually_delivered() {
    let transport = FakeTransport::scripted(vec![Err(TransportError::Oversize {
        received: 40_000_000,
        compressed: 20_000_000,
        limit: 10_000_000,
    })]);
    let consumer = consumer(transport.clone(), 100, 10_000);

    consumer.add(|| records(6));
    consumer.close().await;

    assert_eq!(consumer.meters().get("async_batch.uploaded"), 6.0);
    assert_eq!(consumer.meters().get("async_batch.dropped"), 0.0);
}
