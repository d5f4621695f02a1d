//! Bounded FIFO queue with blocking producers and consumers.
//!
//! Closing is a poison pill: buffered items are still handed out, and
//! consumers only see `None` once the queue is both closed and empty. The
//! right to close belongs to a single [`QueueCloser`], which is consumed by
//! [`QueueCloser::close`], so a queue cannot be closed twice.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Item handed back by a push that found the queue closed.
#[derive(Debug, PartialEq, Eq)]
pub struct Closed<T>(pub T);

/// Shared FIFO between one stage's producers and the next stage's consumers.
pub struct BoundedQueue<T> {
    name: &'static str,
    capacity: usize,
    inner: Mutex<QueueState<T>>,
    not_empty: Condvar,
    // Signals both freed slots and, for rendezvous queues, taken items.
    space: Condvar,
}

struct QueueState<T> {
    queue: VecDeque<T>,
    closed: bool,
    pushed: u64,
    popped: u64,
}

/// Sole owner of the right to close one queue.
pub struct QueueCloser<T> {
    queue: Arc<BoundedQueue<T>>,
}

/// Create a queue holding at most `capacity` items.
///
/// A capacity of 0 makes a rendezvous queue: `push` returns only after a
/// consumer has taken the item.
pub fn bounded<T>(name: &'static str, capacity: usize) -> (Arc<BoundedQueue<T>>, QueueCloser<T>) {
    let queue = Arc::new(BoundedQueue {
        name,
        capacity,
        inner: Mutex::new(QueueState {
            queue: VecDeque::with_capacity(capacity),
            closed: false,
            pushed: 0,
            popped: 0,
        }),
        not_empty: Condvar::new(),
        space: Condvar::new(),
    });
    let closer = QueueCloser {
        queue: Arc::clone(&queue),
    };
    (queue, closer)
}

impl<T> BoundedQueue<T> {
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.inner.lock().expect("queue mutex poisoned")
    }

    /// Name used in logs and [`crate::error::SimError::QueueClosed`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Configured capacity; 0 for a rendezvous queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push an item, blocking while the queue is full.
    ///
    /// Returns the item back if the queue is (or becomes) closed before the
    /// item could be buffered.
    pub fn push(&self, item: T) -> Result<(), Closed<T>> {
        let slots = self.capacity.max(1);
        let mut guard = self.lock();
        while !guard.closed && guard.queue.len() >= slots {
            guard = self.space.wait(guard).expect("condvar wait failed");
        }
        if guard.closed {
            return Err(Closed(item));
        }
        guard.queue.push_back(item);
        guard.pushed += 1;
        let ticket = guard.pushed;
        self.not_empty.notify_one();

        if self.capacity == 0 {
            // FIFO order: our item is gone once `ticket` items were popped.
            while guard.popped < ticket {
                guard = self.space.wait(guard).expect("condvar wait failed");
            }
        }
        Ok(())
    }

    /// Try to pop immediately without blocking.
    #[cfg(test)]
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.lock();
        let item = guard.queue.pop_front()?;
        guard.popped += 1;
        self.space.notify_all();
        Some(item)
    }

    /// Block until an item is available, or return `None` once the queue is
    /// closed and drained.
    pub fn pop_blocking_or_closed(&self) -> Option<T> {
        let mut guard = self.lock();
        loop {
            if let Some(item) = guard.queue.pop_front() {
                guard.popped += 1;
                self.space.notify_all();
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.not_empty.wait(guard).expect("condvar wait failed");
        }
    }

    /// Current number of buffered items.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the close handle has been used.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Total items accepted and handed out so far.
    pub fn counters(&self) -> (u64, u64) {
        let guard = self.lock();
        (guard.pushed, guard.popped)
    }

    fn close(&self) {
        let mut guard = self.lock();
        debug_assert!(!guard.closed, "{} queue closed twice", self.name);
        guard.closed = true;
        self.not_empty.notify_all();
        self.space.notify_all();
    }
}

impl<T> QueueCloser<T> {
    /// Close the queue and wake every blocked producer and consumer.
    pub fn close(self) {
        self.queue.close();
    }

    pub fn name(&self) -> &'static str {
        self.queue.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::{Barrier, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn items_are_consumed_once() {
        let (queue, _closer) = bounded("test", 128);
        let total = 100u64;
        for id in 0..total {
            queue.push(id).expect("queue closed");
        }

        let consumers = 4;
        let barrier = Arc::new(Barrier::new(consumers));
        let seen: Arc<Mutex<HashSet<u64>>> = Arc::new(Mutex::new(HashSet::new()));

        let mut handles = Vec::new();
        for _ in 0..consumers {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            let seen = Arc::clone(&seen);
            handles.push(thread::spawn(move || {
                barrier.wait();
                while let Some(id) = queue.try_pop() {
                    let mut guard = seen.lock().expect("seen mutex poisoned");
                    assert!(guard.insert(id));
                }
            }));
        }

        for handle in handles {
            handle.join().expect("consumer thread panicked");
        }

        let guard = seen.lock().expect("seen mutex poisoned");
        assert_eq!(guard.len(), total as usize);
        assert!(queue.is_empty());
        assert_eq!(queue.counters(), (total, total));
    }

    #[test]
    fn pop_blocking_wakes_on_push() {
        let (queue, _closer) = bounded("test", 4);
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let consumer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            ready_tx.send(()).expect("send ready");
            let item = consumer.pop_blocking_or_closed().expect("queue closed");
            tx.send(item).expect("send item");
        });

        ready_rx.recv_timeout(Duration::from_secs(1)).expect("ready");
        queue.push(99u64).expect("queue closed");

        let received = rx.recv_timeout(Duration::from_secs(1)).expect("receive item");
        assert_eq!(received, 99);
        handle.join().expect("blocking pop thread panicked");
    }

    #[test]
    fn push_blocks_while_full() {
        let (queue, _closer) = bounded("test", 1);
        queue.push(1u64).expect("queue closed");

        let (done_tx, done_rx) = mpsc::channel();
        let producer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            producer.push(2).expect("queue closed");
            done_tx.send(()).expect("done");
        });

        // The second push has nowhere to go until a slot frees up.
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(queue.try_pop(), Some(1));
        done_rx.recv_timeout(Duration::from_secs(1)).expect("push completed");
        assert_eq!(queue.try_pop(), Some(2));
        handle.join().expect("producer thread panicked");
    }

    #[test]
    fn close_still_drains_buffered_items() {
        let (queue, closer) = bounded("test", 8);
        for id in 0..3u64 {
            queue.push(id).expect("queue closed");
        }
        closer.close();

        assert!(queue.is_closed());
        assert_eq!(queue.pop_blocking_or_closed(), Some(0));
        assert_eq!(queue.pop_blocking_or_closed(), Some(1));
        assert_eq!(queue.pop_blocking_or_closed(), Some(2));
        assert_eq!(queue.pop_blocking_or_closed(), None);
    }

    #[test]
    fn pop_blocking_or_closed_unblocks_on_close() {
        let (queue, closer) = bounded::<u64>("test", 4);
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let consumer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            ready_tx.send(()).expect("ready");
            let item = consumer.pop_blocking_or_closed();
            done_tx.send(item.is_none()).expect("done");
        });

        ready_rx.recv_timeout(Duration::from_secs(1)).expect("ready");
        closer.close();

        let closed = done_rx.recv_timeout(Duration::from_secs(1)).expect("done recv");
        assert!(closed);
        handle.join().expect("consumer thread panicked");
    }

    #[test]
    fn push_fails_after_close() {
        let (queue, closer) = bounded("test", 4);
        closer.close();
        assert_eq!(queue.push(1u64), Err(Closed(1)));
    }

    #[test]
    fn rendezvous_push_waits_for_consumer() {
        let (queue, _closer) = bounded("test", 0);
        let (done_tx, done_rx) = mpsc::channel();
        let producer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            producer.push(7u64).expect("queue closed");
            done_tx.send(()).expect("done");
        });

        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(queue.pop_blocking_or_closed(), Some(7));
        done_rx.recv_timeout(Duration::from_secs(1)).expect("push completed");
        handle.join().expect("producer thread panicked");
    }

    #[test]
    fn rendezvous_queue_makes_progress_with_many_workers() {
        let (queue, closer) = bounded("test", 0);
        let producers = 4;
        let per_producer = 50u64;
        let consumers = 3;
        let received = Arc::new(Mutex::new(Vec::new()));

        let consumer_handles: Vec<_> = (0..consumers)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let received = Arc::clone(&received);
                thread::spawn(move || {
                    while let Some(item) = queue.pop_blocking_or_closed() {
                        received.lock().expect("received mutex poisoned").push(item);
                    }
                })
            })
            .collect();

        let producer_handles: Vec<_> = (0..producers)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..per_producer {
                        queue.push(p * 1_000 + i).expect("queue closed");
                    }
                })
            })
            .collect();

        for handle in producer_handles {
            handle.join().expect("producer thread panicked");
        }
        closer.close();
        for handle in consumer_handles {
            handle.join().expect("consumer thread panicked");
        }

        let received = received.lock().expect("received mutex poisoned");
        assert_eq!(received.len() as u64, producers * per_producer);
        let unique: HashSet<_> = received.iter().copied().collect();
        assert_eq!(unique.len(), received.len());
    }
}
