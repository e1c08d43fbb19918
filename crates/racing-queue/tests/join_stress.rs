//! `join()` must not return while any descendant of an enqueued task is
//! still outstanding, whatever the pool size.

#![allow(unused_results)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use racing_queue::{QueueHandle, WorkerQueue};

const FANOUT: usize = 4;
const DEPTH: usize = 4;

/// 1 + 4 + 16 + 64 + 256
const TOTAL_NODES: usize = 341;

fn spawn_node(handle: &QueueHandle, depth: usize, visited: &Arc<AtomicUsize>) {
    let child_handle = handle.clone();
    let visited = Arc::clone(visited);
    handle.enqueue(move || {
        let index = visited.fetch_add(1, Ordering::SeqCst);
        // Stagger completion so parents often finish before their children start.
        thread::sleep(Duration::from_micros(((index % 3) * 150) as u64));
        if depth < DEPTH {
            for _ in 0..FANOUT {
                spawn_node(&child_handle, depth + 1, &visited);
            }
        }
        Ok(())
    });
}

fn run(threads: usize) -> usize {
    let queue = WorkerQueue::new(threads).unwrap();
    let visited = Arc::new(AtomicUsize::new(0));
    spawn_node(&queue.handle(), 0, &visited);
    queue.join();
    assert_eq!(queue.pending(), 0);
    visited.load(Ordering::SeqCst)
}

#[test]
fn recursive_fanout_completes_before_join_returns() {
    for threads in [1, 2, 4, 16] {
        for _round in 0..5 {
            assert_eq!(run(threads), TOTAL_NODES, "early join with {threads} threads");
        }
    }
}

#[test]
fn deep_failure_stops_the_whole_tree() {
    let queue = WorkerQueue::new(4).unwrap();
    let visited = Arc::new(AtomicUsize::new(0));
    let handle = queue.handle();

    let counter = Arc::clone(&visited);
    let inner = handle.clone();
    handle.enqueue(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        for branch in 0..FANOUT {
            let counter = Arc::clone(&counter);
            let grandchildren = inner.clone();
            inner.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                if branch == 0 {
                    anyhow::bail!("branch {branch} failed");
                }
                for _ in 0..FANOUT {
                    let counter = Arc::clone(&counter);
                    grandchildren.enqueue(move || {
                        thread::sleep(Duration::from_millis(2));
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    });
                }
                Ok(())
            });
        }
        Ok(())
    });

    queue.join();
    assert_eq!(queue.pending(), 0);
    assert!(!queue.is_running());
    assert_eq!(queue.fault().unwrap().to_string(), "branch 0 failed");
    assert!(!handle.enqueue(|| Ok(())));
}

#[test]
fn queues_are_reusable_after_join() {
    let queue = WorkerQueue::new(3).unwrap();
    let visited = Arc::new(AtomicUsize::new(0));
    for expected in [TOTAL_NODES, 2 * TOTAL_NODES] {
        spawn_node(&queue.handle(), 0, &visited);
        queue.join();
        assert_eq!(visited.load(Ordering::SeqCst), expected);
    }
}
