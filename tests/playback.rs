//! Playback coordinator integration tests
//!
//! Covers snapshot isolation, cancellation scoping, idempotent cancel,
//! empty-slot behavior, and chunk coverage.

use futures::StreamExt;

use agrovoice_gateway::PlaybackCoordinator;

mod common;

/// Collect every chunk of a stream into owned byte vectors
async fn collect_chunks(
    stream: impl futures::Stream<Item = bytes::Bytes>,
) -> Vec<Vec<u8>> {
    stream.map(|chunk| chunk.to_vec()).collect().await
}

#[tokio::test]
async fn no_publish_reports_unavailable() {
    let coordinator = PlaybackCoordinator::new();

    let status = coordinator.status();
    assert!(!status.available);
    assert!(status.id.is_none());

    assert!(coordinator.stream().is_none());
    assert!(coordinator.cancel().is_none());
}

#[tokio::test]
async fn chunks_cover_the_buffer_exactly() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4096);
    let audio: Vec<u8> = (0..10_000_u32).map(|i| (i % 251) as u8).collect();
    coordinator.publish(audio.clone());

    let chunks = collect_chunks(coordinator.stream().expect("stream missing")).await;

    let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![4096, 4096, 1808]);

    let reassembled: Vec<u8> = chunks.concat();
    assert_eq!(reassembled, audio);
}

#[tokio::test]
async fn chunk_count_matches_ceiling_division() {
    for (len, chunk_size, expected) in [(1, 4, 1), (4, 4, 1), (5, 4, 2), (12, 4, 3), (13, 4, 4)] {
        let coordinator = PlaybackCoordinator::with_chunk_size(chunk_size);
        coordinator.publish(vec![0xAB_u8; len]);

        let chunks = collect_chunks(coordinator.stream().expect("stream missing")).await;
        assert_eq!(chunks.len(), expected, "len={len} chunk_size={chunk_size}");
    }
}

#[tokio::test]
async fn stream_is_bound_to_its_snapshot() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4);
    coordinator.publish(vec![0xAA_u8; 12]);

    let mut stream = Box::pin(coordinator.stream().expect("stream missing"));
    let first = stream.next().await.expect("first chunk missing");
    assert!(first.iter().all(|&b| b == 0xAA));

    // a new answer lands while the old one is still streaming
    coordinator.publish(vec![0xBB_u8; 12]);

    let mut rest = Vec::new();
    while let Some(chunk) = stream.next().await {
        rest.extend_from_slice(&chunk);
    }
    assert_eq!(rest.len(), 8);
    assert!(rest.iter().all(|&b| b == 0xAA), "observed bytes of the new answer");
}

#[tokio::test]
async fn cancel_stops_stream_at_next_chunk_boundary() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4);
    coordinator.publish(vec![1_u8; 10]);

    let mut stream = Box::pin(coordinator.stream().expect("stream missing"));
    let first = stream.next().await.expect("first chunk missing");
    assert_eq!(first.len(), 4);

    coordinator.cancel();

    assert!(stream.next().await.is_none(), "stream continued past cancel");
}

#[tokio::test]
async fn cancel_does_not_leak_into_the_next_answer() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4);
    coordinator.publish(vec![1_u8; 10]);
    coordinator.cancel();

    // the replacement answer gets a fresh, unraised token
    coordinator.publish(vec![2_u8; 10]);
    let chunks = collect_chunks(coordinator.stream().expect("stream missing")).await;

    let total: usize = chunks.iter().map(Vec::len).sum();
    assert_eq!(total, 10, "new answer was pre-cancelled");
}

#[tokio::test]
async fn cancel_only_affects_the_current_answer() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4);
    coordinator.publish(vec![0xAA_u8; 8]);

    let mut stale = Box::pin(coordinator.stream().expect("stream missing"));
    let first = stale.next().await.expect("first chunk missing");
    assert_eq!(first.len(), 4);

    // supersede, then cancel the *new* answer
    coordinator.publish(vec![0xBB_u8; 8]);
    coordinator.cancel();

    // the stale stream still drains its own snapshot
    let mut rest = Vec::new();
    while let Some(chunk) = stale.next().await {
        rest.extend_from_slice(&chunk);
    }
    assert_eq!(rest.len(), 4);
    assert!(rest.iter().all(|&b| b == 0xAA));

    // while the cancelled new answer terminates immediately
    let chunks = collect_chunks(coordinator.stream().expect("stream missing")).await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4);
    let id = coordinator.publish(vec![7_u8; 8]);

    assert_eq!(coordinator.cancel(), Some(id));
    assert_eq!(coordinator.cancel(), Some(id));

    let status = coordinator.status();
    assert!(status.available);
    assert_eq!(status.id, Some(id));

    // publish still works after redundant cancels
    let next = coordinator.publish(vec![8_u8; 8]);
    assert_ne!(next, id);
}

#[tokio::test]
async fn restreaming_a_cancelled_answer_yields_nothing() {
    let coordinator = PlaybackCoordinator::with_chunk_size(4);
    coordinator.publish(vec![3_u8; 12]);
    coordinator.cancel();

    // cancellation is one-shot per answer: the raised token is observed
    // before the first chunk of any later stream
    let chunks = collect_chunks(coordinator.stream().expect("stream missing")).await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn concurrent_readers_each_get_the_full_buffer() {
    let coordinator = std::sync::Arc::new(PlaybackCoordinator::with_chunk_size(16));
    let audio: Vec<u8> = (0..200_u32).map(|i| i as u8).collect();
    coordinator.publish(audio.clone());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let stream = coordinator.stream().expect("stream missing");
        handles.push(tokio::spawn(async move {
            collect_chunks(stream).await.concat()
        }));
    }

    for handle in handles {
        let bytes = handle.await.expect("reader panicked");
        assert_eq!(bytes, audio);
    }
}

#[tokio::test]
async fn each_publish_gets_a_fresh_id() {
    let coordinator = PlaybackCoordinator::new();
    let a = coordinator.publish(vec![1]);
    let b = coordinator.publish(vec![2]);

    assert_ne!(a, b);
    assert_eq!(coordinator.status().id, Some(b));
}
