//! Shutdown sequencing for the order and dish queues.
//!
//! ```text
//! Running --(OrderIntake::close)--> Draining --(Coordinator::shutdown)--> Closed
//! ```
//!
//! The order queue's close handle lives in [`OrderIntake`], which the order
//! producer owns. The dish queue's close handle never leaves the
//! [`Coordinator`], and it is used only after every waiter has been joined,
//! so no waiter can push into a closed dish queue.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::chef::{self, ChefReport};
use crate::clock::SimClock;
use crate::config::Settings;
use crate::error::{Result, SimError};
use crate::pool::{self, Worker};
use crate::queue::{self, BoundedQueue, QueueCloser};
use crate::stats::StatsAggregator;
use crate::types::{DishRequest, Order};
use crate::waiter::{self, WaiterReport};

/// Name of the generator-to-waiter queue in logs and errors.
pub const ORDER_QUEUE: &str = "order";
/// Name of the waiter-to-chef queue in logs and errors.
pub const DISH_QUEUE: &str = "dish";

/// Lifecycle of the pipeline; only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Running,
    Draining,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Closed => "closed",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
struct PhaseCell(Mutex<Phase>);

impl PhaseCell {
    fn get(&self) -> Phase {
        *self.0.lock().expect("phase mutex poisoned")
    }

    fn advance(&self, next: Phase) {
        let mut guard = self.0.lock().expect("phase mutex poisoned");
        debug_assert!(next > *guard, "phase moved backwards: {} -> {next}", *guard);
        info!(from = %*guard, to = %next, "phase transition");
        *guard = next;
    }
}

/// Proof that the order queue has been closed; required by
/// [`Coordinator::shutdown`].
#[derive(Debug)]
pub struct IntakeClosed(());

/// The producer side of the order queue together with its only close handle.
pub struct OrderIntake {
    queue: Arc<BoundedQueue<Order>>,
    closer: QueueCloser<Order>,
    phase: Arc<PhaseCell>,
}

impl OrderIntake {
    /// Hand an order to the waiters, blocking while the queue is full.
    pub fn push(&self, order: Order) -> Result<()> {
        self.queue.push(order).map_err(|_| SimError::QueueClosed {
            queue: self.closer.name(),
        })
    }

    /// Stop taking orders. Buffered orders are still served.
    pub fn close(self) -> IntakeClosed {
        self.closer.close();
        self.phase.advance(Phase::Draining);
        IntakeClosed(())
    }
}

/// Per-worker reports collected at shutdown, in spawn order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub waiters: Vec<WaiterReport>,
    pub chefs: Vec<ChefReport>,
}

impl ShutdownReport {
    /// Orders taken by all waiters.
    pub fn orders_served(&self) -> u64 {
        self.waiters.iter().map(|w| w.orders).sum()
    }

    /// Dish requests pushed by all waiters.
    pub fn dishes_forwarded(&self) -> u64 {
        self.waiters.iter().map(|w| w.dishes_forwarded).sum()
    }

    /// Portions finished by all chefs.
    pub fn portions_cooked(&self) -> u64 {
        self.chefs.iter().map(|c| c.portions).sum()
    }
}

/// Owns both worker pools and the dish queue's close handle.
pub struct Coordinator {
    phase: Arc<PhaseCell>,
    waiters: Vec<Worker<WaiterReport>>,
    chefs: Vec<Worker<ChefReport>>,
    dishes: Arc<BoundedQueue<DishRequest>>,
    dish_closer: QueueCloser<DishRequest>,
}

impl Coordinator {
    /// Build both queues and start the waiter and chef pools.
    pub fn start(
        settings: &Settings,
        clock: SimClock,
        stats: &Arc<StatsAggregator>,
    ) -> Result<(Self, OrderIntake)> {
        let (orders, order_closer) = queue::bounded(ORDER_QUEUE, settings.order_queue_capacity);
        let (dishes, dish_closer) = queue::bounded(DISH_QUEUE, settings.dish_queue_capacity);

        let waiters = match waiter::spawn_pool(settings.waiters, &orders, &dishes, stats) {
            Ok(workers) => workers,
            Err(err) => {
                // Release whatever already started before reporting.
                order_closer.close();
                dish_closer.close();
                return Err(err);
            }
        };
        let chefs = match chef::spawn_pool(settings.chefs, &dishes, stats, clock, |id| {
            settings.rng_for(1_000 + id as u64)
        }) {
            Ok(workers) => workers,
            Err(err) => {
                order_closer.close();
                let _ = pool::join_all(waiters);
                dish_closer.close();
                return Err(err);
            }
        };
        info!(
            waiters = waiters.len(),
            chefs = chefs.len(),
            order_capacity = orders.capacity(),
            dish_capacity = dishes.capacity(),
            speed = clock.speed(),
            "restaurant open"
        );

        let phase = Arc::new(PhaseCell(Mutex::new(Phase::Running)));
        let intake = OrderIntake {
            queue: orders,
            closer: order_closer,
            phase: Arc::clone(&phase),
        };
        let coordinator = Self {
            phase,
            waiters,
            chefs,
            dishes,
            dish_closer,
        };
        Ok((coordinator, intake))
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Drain both pools in pipeline order and return their reports.
    ///
    /// Waiters are joined first; only then is the dish queue closed, after
    /// which the chefs finish the remaining dishes and are joined. Every
    /// worker is joined even when one of them failed.
    pub fn shutdown(self, _intake: IntakeClosed) -> Result<ShutdownReport> {
        let waiters = pool::join_all(self.waiters);
        info!(pending_dishes = self.dishes.len(), "all waiters done");

        self.dish_closer.close();
        self.phase.advance(Phase::Closed);

        let chefs = pool::join_all(self.chefs);
        debug_assert!(
            self.dishes.is_closed() && self.dishes.is_empty(),
            "chefs exited with dishes left"
        );
        let (accepted, cooked) = self.dishes.counters();
        info!(accepted, cooked, "all chefs done");

        Ok(ShutdownReport {
            waiters: waiters?,
            chefs: chefs?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Dish};
    use crate::types::OrderIds;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn scenario_settings() -> Settings {
        Settings {
            waiters: 2,
            chefs: 2,
            max_dishes_per_order: 1,
            tables: 3,
            seed: Some(5),
            ..Settings::default()
        }
    }

    fn catalog_a() -> Arc<Catalog> {
        // One virtual minute of cooking.
        let minute = Duration::from_secs(60);
        Arc::new(Catalog::new(vec![Dish::new("A", 10, minute, minute)]).expect("catalog"))
    }

    #[test]
    fn five_orders_for_table_one() {
        let settings = scenario_settings();
        let catalog = catalog_a();
        let stats = Arc::new(StatsAggregator::new(catalog, settings.tables));
        let (coordinator, intake) =
            Coordinator::start(&settings, SimClock::new(6_000), &stats).expect("start");
        assert_eq!(coordinator.phase(), Phase::Running);

        let ids = OrderIds::new();
        for _ in 0..5 {
            intake
                .push(Order::new(ids.next(), 1, vec!["A".to_string()], Duration::ZERO))
                .expect("push order");
        }
        let closed = intake.close();
        assert_eq!(coordinator.phase(), Phase::Draining);

        let phase = Arc::clone(&coordinator.phase);
        let report = coordinator.shutdown(closed).expect("shutdown");
        assert_eq!(phase.get(), Phase::Closed);

        assert_eq!(report.orders_served(), 5);
        assert_eq!(report.dishes_forwarded(), 5);
        assert_eq!(report.portions_cooked(), 5);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.tables.len(), 1);
        assert_eq!(snapshot.tables[&1].orders, 5);
        assert_eq!(snapshot.tables[&1].profit, 50);
        assert_eq!(snapshot.dishes["A"].portions, 5);
        assert_eq!(snapshot.dishes["A"].revenue, 50);
    }

    #[test]
    fn unbuffered_queues_do_not_deadlock() {
        let settings = Settings {
            order_queue_capacity: 0,
            dish_queue_capacity: 0,
            max_dishes_per_order: 3,
            ..scenario_settings()
        };
        let catalog = catalog_a();
        let stats = Arc::new(StatsAggregator::new(catalog, settings.tables));
        let (done_tx, done_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let (coordinator, intake) =
                Coordinator::start(&settings, SimClock::new(60_000), &stats).expect("start");
            let ids = OrderIds::new();
            for i in 0..40u32 {
                let dishes = vec!["A".to_string(); (i % 3) as usize + 1];
                intake
                    .push(Order::new(ids.next(), i % 3 + 1, dishes, Duration::ZERO))
                    .expect("push order");
            }
            let report = coordinator.shutdown(intake.close()).expect("shutdown");
            done_tx.send(()).expect("done");
            (report, stats.snapshot())
        });

        done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("pipeline finished without deadlock");
        let (report, snapshot) = handle.join().expect("pipeline thread panicked");
        assert_eq!(report.orders_served(), 40);
        // 1 + 2 + 3 dishes repeating, 40 orders.
        let expected_dishes = (0..40u64).map(|i| i % 3 + 1).sum::<u64>();
        assert_eq!(report.dishes_forwarded(), expected_dishes);
        assert_eq!(snapshot.total_portions(), expected_dishes);
        assert_eq!(snapshot.total_profit(), expected_dishes * 10);
    }

    #[test]
    fn buffered_orders_are_served_after_close() {
        let settings = Settings {
            waiters: 1,
            ..scenario_settings()
        };
        let stats = Arc::new(StatsAggregator::new(catalog_a(), settings.tables));
        let (coordinator, intake) =
            Coordinator::start(&settings, SimClock::new(60_000), &stats).expect("start");

        let ids = OrderIds::new();
        for _ in 0..20 {
            intake
                .push(Order::new(ids.next(), 2, vec!["A".to_string()], Duration::ZERO))
                .expect("push order");
        }
        // Closing right away must not discard what is still buffered.
        let report = coordinator.shutdown(intake.close()).expect("shutdown");
        assert_eq!(report.orders_served(), 20);
        assert_eq!(stats.snapshot().tables[&2].orders, 20);
    }
}
