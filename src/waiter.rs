//! Waiters: take orders off the order queue and forward each dish to the
//! kitchen, recording how long the hand-off took.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::{Result, SimError};
use crate::pool::{self, Worker};
use crate::queue::BoundedQueue;
use crate::stats::StatsAggregator;
use crate::types::{DishRequest, Order};

/// What one waiter did before the order queue closed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaiterReport {
    /// Orders taken.
    pub orders: u64,
    /// Dish requests pushed to the kitchen.
    pub dishes_forwarded: u64,
}

/// Serve orders until the order queue is closed and drained.
pub fn serve(
    orders: &BoundedQueue<Order>,
    dishes: &BoundedQueue<DishRequest>,
    stats: &StatsAggregator,
) -> Result<WaiterReport> {
    let mut report = WaiterReport::default();
    while let Some(order) = orders.pop_blocking_or_closed() {
        debug!(order = order.id, table = order.table, dishes = ?order.dishes, "took order");
        let start = Instant::now();
        for dish in &order.dishes {
            let request = DishRequest {
                order_id: order.id,
                table: order.table,
                dish: dish.clone(),
            };
            dishes.push(request).map_err(|_| SimError::QueueClosed {
                queue: dishes.name(),
            })?;
            report.dishes_forwarded += 1;
        }
        let service = start.elapsed();
        stats.record_table_service(order.table, &order.dishes, service)?;
        report.orders += 1;
        debug!(order = order.id, ?service, "order handed to kitchen");
    }
    debug!(orders = report.orders, "order queue drained, going home");
    Ok(report)
}

/// Start `count` waiters named `waiter-1..count`.
pub fn spawn_pool(
    count: usize,
    orders: &Arc<BoundedQueue<Order>>,
    dishes: &Arc<BoundedQueue<DishRequest>>,
    stats: &Arc<StatsAggregator>,
) -> Result<Vec<Worker<WaiterReport>>> {
    (1..=count)
        .map(|id| {
            let orders = Arc::clone(orders);
            let dishes = Arc::clone(dishes);
            let stats = Arc::clone(stats);
            pool::spawn(format!("waiter-{id}"), move || {
                serve(&orders, &dishes, &stats)
            })
        })
        .collect()
}
