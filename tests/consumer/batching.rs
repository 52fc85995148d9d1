//! Group boundary and upload body tests.

use super::{consumer, records, FakeTransport};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upload_body_is_a_compact_json_array() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 100, 10_000);

    consumer.add(|| records(3));
    consumer.close().await;

    let posts = transport.posts();
    assert_eq!(posts.len(), 1);
    let (count, body) = &posts[0];
    assert_eq!(*count, 3);
    assert_eq!(body, r#"[{"seq":0},{"seq":1},{"seq":2}]"#);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batches_never_exceed_flush_len() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 10, 10_000);

    consumer.add(|| records(35));
    consumer.close().await;

    let counts: Vec<usize> = transport.posts().iter().map(|(c, _)| *c).collect();
    assert_eq!(counts.iter().sum::<usize>(), 35);
    assert!(counts.iter().all(|&c| c <= 10), "counts: {counts:?}");
    assert_eq!(consumer.queue_len(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reaching_flush_len_triggers_an_upload_without_waiting() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 10, 10_000);

    // The timer interval is 10 minutes; only the group boundary can
    // trigger this upload.
    consumer.add(|| records(10));
    let mut waited = 0;
    while transport.post_count() == 0 && waited < 100 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        waited += 1;
    }
    assert_eq!(transport.post_count(), 1);
    assert_eq!(consumer.queue_len(), 0);
    consumer.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn order_is_preserved_across_multiple_adds() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 7, 10_000);

    for chunk in 0..4 {
        consumer.add(move || super::records_from(chunk * 5, 5));
    }
    consumer.close().await;

    assert_eq!(transport.uploaded_seqs(), (0..20).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn explicit_flush_uploads_a_partial_group() {
    let transport = FakeTransport::ok();
    let consumer = consumer(transport.clone(), 1000, 10_000);

    consumer.add(|| records(4));
    consumer.flush();

    let mut waited = 0;
    while transport.post_count() == 0 && waited < 100 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        waited += 1;
    }
    assert_eq!(transport.posts()[0].0, 4);
    consumer.close().await;
}
