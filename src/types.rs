//! Shared identifiers and the order model flowing through the pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Unique identifier for an order.
pub type OrderId = u64;
/// Table number, 1-based.
pub type TableId = u32;

/// A guest order travelling from the generator to a waiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Unique id, assigned from 1 upwards.
    pub id: OrderId,
    /// Table that placed the order.
    pub table: TableId,
    /// Dish names in the order they were requested; repeats allowed.
    pub dishes: Vec<String>,
    /// Real time the order was created, for logging.
    pub created_at: Instant,
    /// Virtual time since opening when the order was taken.
    pub virtual_at: Duration,
}

impl Order {
    /// Construct an order stamped with the current real time.
    pub fn new(id: OrderId, table: TableId, dishes: Vec<String>, virtual_at: Duration) -> Self {
        Self {
            id,
            table,
            dishes,
            created_at: Instant::now(),
            virtual_at,
        }
    }
}

/// One dish handed from a waiter to the kitchen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DishRequest {
    /// Order this dish belongs to.
    pub order_id: OrderId,
    /// Table the dish is served to.
    pub table: TableId,
    /// Catalog name of the dish.
    pub dish: String,
}

/// Monotonic order id source shared by every producer of orders.
#[derive(Clone, Debug, Default)]
pub struct OrderIds(Arc<AtomicU64>);

impl OrderIds {
    /// Counter whose first id is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, starting at 1. Ids are never reused.
    pub fn next(&self) -> OrderId {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Barrier, Mutex};
    use std::thread;

    #[test]
    fn order_ids_are_unique_across_threads() {
        let ids = OrderIds::new();
        let threads = 8;
        let per_thread = 250;
        let barrier = Arc::new(Barrier::new(threads));
        let seen = Arc::new(Mutex::new(HashSet::new()));

        let mut handles = Vec::new();
        for _ in 0..threads {
            let ids = ids.clone();
            let barrier = Arc::clone(&barrier);
            let seen = Arc::clone(&seen);
            handles.push(thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_thread {
                    let id = ids.next();
                    assert!(seen.lock().expect("seen mutex poisoned").insert(id));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("id thread panicked");
        }

        let seen = seen.lock().expect("seen mutex poisoned");
        assert_eq!(seen.len(), threads * per_thread);
        assert_eq!(ids.issued(), (threads * per_thread) as u64);
        assert!(!seen.contains(&0));
    }
}
