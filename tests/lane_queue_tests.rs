//! Lane queue behaviour

use std::collections::VecDeque;

use junction_sim::simulation::LaneQueue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_new_queue_is_empty() {
    let queue: LaneQueue<u32> = LaneQueue::new(10);
    assert!(queue.is_empty());
    assert!(!queue.is_full());
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.capacity(), 10);
    assert!(queue.peek().is_none());
}

#[test]
fn test_fifo_order() {
    let mut queue = LaneQueue::new(10);
    for i in 0..5 {
        assert!(queue.enqueue(i));
    }
    assert_eq!(queue.peek(), Some(&0));
    for i in 0..5 {
        assert_eq!(queue.dequeue(), Some(i));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_enqueue_on_full_queue_is_rejected() {
    let mut queue = LaneQueue::new(10);
    for i in 0..10 {
        assert!(queue.enqueue(i));
    }
    assert!(queue.is_full());

    // Backpressure: the request is dropped and nothing changes
    assert!(!queue.enqueue(99));
    assert_eq!(queue.len(), 10);
    assert_eq!(queue.peek(), Some(&0));
    assert!(!queue.iter().any(|&v| v == 99));
}

#[test]
fn test_dequeue_after_draining_returns_nothing() {
    let mut queue = LaneQueue::new(12);
    for i in 0..7 {
        queue.enqueue(i);
    }
    for _ in 0..7 {
        assert!(queue.dequeue().is_some());
    }
    assert_eq!(queue.dequeue(), None);
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_wrap_around_keeps_order() {
    let mut queue = LaneQueue::new(10);
    for i in 0..8 {
        queue.enqueue(i);
    }
    for _ in 0..6 {
        queue.dequeue();
    }
    // front is now at slot 6; these wrap past the end of the buffer
    for i in 8..16 {
        assert!(queue.enqueue(i));
    }
    assert!(queue.is_full());

    let seen: Vec<_> = queue.iter().copied().collect();
    assert_eq!(seen, (6..16).collect::<Vec<_>>());

    for v in queue.iter_mut() {
        *v *= 10;
    }
    let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue()).collect();
    assert_eq!(drained, (6..16).map(|v| v * 10).collect::<Vec<_>>());
}

#[test]
fn test_reclaim_only_pops_from_front() {
    let mut queue = LaneQueue::new(10);
    for v in [1, 2, 3, 4, 5] {
        queue.enqueue(v);
    }
    // 1, 2 and 4 are "done", but 3 blocks 4 from being reclaimed
    let reclaimed = queue.reclaim_while(|v| *v != 3 && *v != 5);
    assert_eq!(reclaimed, 2);
    assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
}

#[test]
fn test_clear_releases_every_slot() {
    let mut queue = LaneQueue::new(10);
    for i in 0..10 {
        queue.enqueue(i);
    }
    queue.dequeue();
    queue.enqueue(10);

    assert_eq!(queue.clear(), 10);
    assert!(queue.is_empty());
    assert_eq!(queue.iter().count(), 0);
    assert!(queue.enqueue(42));
    assert_eq!(queue.peek(), Some(&42));
}

#[test]
fn test_random_operations_stay_within_bounds() {
    let mut rng = StdRng::seed_from_u64(0x1a2b);
    let mut queue = LaneQueue::new(16);
    let mut model = VecDeque::new();

    for step in 0..10_000u32 {
        if rng.random_bool(0.55) {
            let accepted = queue.enqueue(step);
            assert_eq!(accepted, model.len() < 16);
            if accepted {
                model.push_back(step);
            }
        } else {
            assert_eq!(queue.dequeue(), model.pop_front());
        }
        assert!(queue.len() <= queue.capacity());
        assert_eq!(queue.len(), model.len());
        assert_eq!(queue.peek(), model.front());
    }
}
