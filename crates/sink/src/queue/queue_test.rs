//! Tests for the event queue

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;
use crate::event::LogLevel;

fn event(n: usize) -> LogEvent {
    LogEvent::new(LogLevel::Information, "event {n}").with_property("n", n)
}

fn n_of(event: &LogEvent) -> u64 {
    match event.property("n") {
        Some(crate::PropertyValue::Scalar(crate::Scalar::UInt(n))) => *n,
        other => panic!("unexpected property: {other:?}"),
    }
}

#[test]
fn test_fifo_order() {
    let queue = EventQueue::unbounded();
    for i in 0..5 {
        queue.try_enqueue(event(i)).unwrap();
    }

    let order: Vec<u64> = (0..5).map(|_| n_of(&queue.try_recv().unwrap())).collect();
    assert_eq!(order, [0, 1, 2, 3, 4]);
    assert_eq!(queue.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[test]
fn test_bounded_full_rejects() {
    let queue = EventQueue::new(Some(2), false);
    queue.try_enqueue(event(1)).unwrap();
    queue.try_enqueue(event(2)).unwrap();

    let err = queue.try_enqueue(event(3)).unwrap_err();
    assert!(err.is_full());
    assert_eq!(n_of(&err.into_inner()), 3);
    assert_eq!(queue.len(), 2);

    queue.try_recv().unwrap();
    queue.try_enqueue(event(4)).unwrap();
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_zero_limit_clamped() {
    let queue = EventQueue::new(Some(0), false);
    assert_eq!(queue.limit(), Some(1));

    queue.try_enqueue(event(1)).unwrap();
    assert!(queue.try_enqueue(event(2)).unwrap_err().is_full());
}

#[test]
fn test_blocks_when_full_requires_limit() {
    assert!(EventQueue::new(Some(1), true).blocks_when_full());
    assert!(!EventQueue::new(Some(1), false).blocks_when_full());
    assert!(!EventQueue::new(None, true).blocks_when_full());
}

#[test]
fn test_closed_rejects() {
    let queue = EventQueue::unbounded();
    assert!(queue.close());

    let err = queue.try_enqueue(event(1)).unwrap_err();
    assert!(err.is_closed());
    assert!(queue.enqueue_blocking(event(2)).is_err());
    assert!(queue.is_empty());
}

#[test]
fn test_close_idempotent() {
    let queue = EventQueue::unbounded();
    assert!(!queue.is_closed());
    assert!(queue.close());
    assert!(!queue.close());
    assert!(queue.is_closed());
}

#[test]
fn test_concurrent_close_single_winner() {
    let queue = Arc::new(EventQueue::unbounded());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let q = Arc::clone(&queue);
            thread::spawn(move || q.close())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|closed| *closed)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn test_drains_after_close() {
    let queue = EventQueue::unbounded();
    queue.try_enqueue(event(1)).unwrap();
    queue.try_enqueue(event(2)).unwrap();
    queue.close();

    assert_eq!(n_of(&queue.try_recv().unwrap()), 1);
    assert_eq!(n_of(&queue.try_recv().unwrap()), 2);
    assert_eq!(queue.try_recv().unwrap_err(), TryRecvError::Closed);
}

#[test]
fn test_close_and_discard() {
    let queue = EventQueue::unbounded();
    for i in 0..3 {
        queue.try_enqueue(event(i)).unwrap();
    }

    assert_eq!(queue.close_and_discard(), 3);
    assert!(queue.is_closed());
    assert_eq!(queue.try_recv().unwrap_err(), TryRecvError::Closed);
}

#[test]
fn test_blocked_producer_released_by_consumer() {
    let queue = Arc::new(EventQueue::new(Some(1), true));
    queue.enqueue_blocking(event(1)).unwrap();

    let producer = {
        let q = Arc::clone(&queue);
        thread::spawn(move || q.enqueue_blocking(event(2)))
    };

    // Producer cannot make progress while the queue is full
    thread::sleep(Duration::from_millis(20));
    assert!(!producer.is_finished());
    assert_eq!(queue.len(), 1);

    assert_eq!(n_of(&queue.try_recv().unwrap()), 1);
    assert!(producer.join().unwrap().is_ok());
    assert_eq!(n_of(&queue.try_recv().unwrap()), 2);
}

#[test]
fn test_blocked_producer_released_by_close() {
    let queue = Arc::new(EventQueue::new(Some(1), true));
    queue.enqueue_blocking(event(1)).unwrap();

    let producer = {
        let q = Arc::clone(&queue);
        thread::spawn(move || q.enqueue_blocking(event(2)))
    };

    thread::sleep(Duration::from_millis(20));
    queue.close();

    let rejected = producer.join().unwrap().unwrap_err();
    assert_eq!(n_of(&rejected), 2);

    // The event accepted before close is still delivered
    assert_eq!(n_of(&queue.try_recv().unwrap()), 1);
    assert_eq!(queue.try_recv().unwrap_err(), TryRecvError::Closed);
}

#[tokio::test]
async fn test_recv_returns_buffered_then_none() {
    let queue = EventQueue::unbounded();
    queue.try_enqueue(event(7)).unwrap();
    queue.close();

    assert_eq!(n_of(&queue.recv().await.unwrap()), 7);
    assert!(queue.recv().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recv_wakes_on_enqueue() {
    let queue = Arc::new(EventQueue::unbounded());

    let consumer = {
        let q = Arc::clone(&queue);
        tokio::spawn(async move { q.recv().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    queue.try_enqueue(event(3)).unwrap();

    let received = consumer.await.unwrap().unwrap();
    assert_eq!(n_of(&received), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recv_wakes_on_close() {
    let queue = Arc::new(EventQueue::unbounded());

    let consumer = {
        let q = Arc::clone(&queue);
        tokio::spawn(async move { q.recv().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    queue.close();

    assert!(consumer.await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_producers_deliver_everything() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 500;

    let queue = Arc::new(EventQueue::new(Some(16), true));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let q = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    q.enqueue_blocking(event(p * PER_PRODUCER + i)).unwrap();
                }
            })
        })
        .collect();

    let consumer = {
        let q = Arc::clone(&queue);
        tokio::spawn(async move {
            let mut last_seen = vec![None::<u64>; PRODUCERS];
            let mut count = 0;
            while let Some(e) = q.recv().await {
                let n = n_of(&e);
                let producer = n as usize / PER_PRODUCER;
                // Per-producer order is preserved
                assert!(last_seen[producer].is_none_or(|prev| prev < n));
                last_seen[producer] = Some(n);
                count += 1;
            }
            count
        })
    };

    for p in producers {
        p.join().unwrap();
    }
    queue.close();

    assert_eq!(consumer.await.unwrap(), PRODUCERS * PER_PRODUCER);
}
