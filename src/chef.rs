//! Chefs: cook dishes from the dish queue and book them in the dish stats.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::debug;

use crate::catalog::Catalog;
use crate::clock::{SimClock, format_clock};
use crate::error::Result;
use crate::pool::{self, Worker};
use crate::queue::BoundedQueue;
use crate::stats::StatsAggregator;
use crate::types::DishRequest;

/// What one chef did before the dish queue closed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChefReport {
    /// Portions cooked and booked.
    pub portions: u64,
    /// Virtual time spent at the stove.
    pub cooked: Duration,
}

/// Cook until the dish queue is closed and drained.
///
/// A portion is recorded only after its cook delay has fully elapsed.
pub fn cook(
    dishes: &BoundedQueue<DishRequest>,
    catalog: &Catalog,
    clock: &SimClock,
    stats: &StatsAggregator,
    rng: &mut StdRng,
) -> Result<ChefReport> {
    let mut report = ChefReport::default();
    while let Some(request) = dishes.pop_blocking_or_closed() {
        let cook_time = catalog.sample_cook_time(&request.dish, rng)?;
        debug!(
            at = %format_clock(clock.virtual_elapsed()),
            dish = %request.dish,
            order = request.order_id,
            table = request.table,
            minutes = cook_time.as_secs_f64() / 60.0,
            "started cooking"
        );
        clock.sleep_virtual(cook_time);
        stats.record_dish_prepared(&request.dish)?;
        report.portions += 1;
        report.cooked += cook_time;
        debug!(
            at = %format_clock(clock.virtual_elapsed()),
            dish = %request.dish,
            order = request.order_id,
            "dish ready"
        );
    }
    debug!(portions = report.portions, "dish queue drained, kitchen closed");
    Ok(report)
}

/// Start `count` chefs named `chef-1..count`, each with its own random stream.
pub fn spawn_pool(
    count: usize,
    dishes: &Arc<BoundedQueue<DishRequest>>,
    stats: &Arc<StatsAggregator>,
    clock: SimClock,
    mut rng_for: impl FnMut(usize) -> StdRng,
) -> Result<Vec<Worker<ChefReport>>> {
    (1..=count)
        .map(|id| {
            let dishes = Arc::clone(dishes);
            let stats = Arc::clone(stats);
            let mut rng = rng_for(id);
            pool::spawn(format!("chef-{id}"), move || {
                let catalog = Arc::clone(stats.catalog());
                cook(&dishes, &catalog, &clock, &stats, &mut rng)
            })
        })
        .collect()
}
