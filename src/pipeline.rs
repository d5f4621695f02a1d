//! One complete business day: generator, waiters, chefs, shutdown, and the
//! post-run consistency audit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::catalog::Catalog;
use crate::clock::SimClock;
use crate::config::Settings;
use crate::coordinator::{Coordinator, Phase, ShutdownReport};
use crate::error::{Result, SimError};
use crate::generator::{GeneratorReport, OrderGenerator};
use crate::pool;
use crate::reporter::PeriodicReporter;
use crate::stats::{self, StatsAggregator, StatsSnapshot};
use crate::types::{OrderIds, TableId};

/// Everything a finished day produced.
#[derive(Clone, Debug)]
pub struct SimulationOutcome {
    /// Final statistics.
    pub snapshot: StatsSnapshot,
    pub generated: GeneratorReport,
    pub shutdown: ShutdownReport,
    /// Real time the whole run took.
    pub elapsed: Duration,
    /// Virtual time since opening when the last chef finished.
    pub virtual_elapsed: Duration,
    /// Snapshots logged by the periodic reporter, 0 when disabled.
    pub periodic_reports: u64,
}

/// Run the whole pipeline to completion and return the final statistics.
pub fn run(settings: &Settings, catalog: Arc<Catalog>) -> Result<SimulationOutcome> {
    settings.validate()?;
    let clock = SimClock::new(settings.speed);
    let started = Instant::now();
    let stats = Arc::new(StatsAggregator::new(Arc::clone(&catalog), settings.tables));

    let generator = OrderGenerator::new(settings, catalog, clock, OrderIds::new())?;
    // Dropping the reporter's sender stops it if the pools fail to start.
    let reporter = match settings.report_every {
        Some(every) => Some(PeriodicReporter::spawn(Arc::clone(&stats), clock, every)?),
        None => None,
    };
    let (coordinator, intake) = Coordinator::start(settings, clock, &stats)?;

    let generator_thread = pool::spawn("generator".to_string(), move || {
        let (result, closed) = generator.run(intake);
        Ok((result, closed))
    })?;
    let (generated, closed) = generator_thread.join()?;
    debug_assert_eq!(coordinator.phase(), Phase::Draining);
    let shutdown = coordinator.shutdown(closed);

    let periodic_reports = match reporter {
        Some(reporter) => reporter.stop()?,
        None => 0,
    };
    let generated = generated?;
    let shutdown = shutdown?;

    let outcome = SimulationOutcome {
        snapshot: stats.snapshot(),
        generated,
        shutdown,
        elapsed: started.elapsed(),
        virtual_elapsed: clock.virtual_elapsed(),
        periodic_reports,
    };
    info!(
        orders = outcome.generated.orders,
        dishes = outcome.generated.dishes,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "restaurant closed"
    );
    Ok(outcome)
}

/// A broken consistency property found after a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("generated {generated} orders but waiters served {served}")]
    LostOrders { generated: u64, served: u64 },
    #[error("orders carried {generated} dishes but waiters forwarded {forwarded}")]
    LostDishRequests { generated: u64, forwarded: u64 },
    #[error("waiters forwarded {forwarded} dishes but chefs cooked {cooked}")]
    UncookedDishes { forwarded: u64, cooked: u64 },
    #[error("chefs cooked {cooked} portions but dish stats count {recorded}")]
    UnrecordedPortions { cooked: u64, recorded: u64 },
    #[error("table {table}: average service does not match total / orders")]
    StaleAverage { table: TableId },
    #[error("dish {dish}: revenue {revenue} is not portions x price")]
    RevenueMismatch { dish: String, revenue: u64 },
    #[error("table profit {profit} differs from dish revenue {revenue}")]
    ProfitMismatch { profit: u64, revenue: u64 },
    #[error("table stats count {recorded} orders, waiters served {served}")]
    UnrecordedOrders { served: u64, recorded: u64 },
}

/// Check the end-of-day bookkeeping for consistency.
pub fn audit(outcome: &SimulationOutcome, catalog: &Catalog) -> Result<Vec<Violation>, SimError> {
    let mut violations = Vec::new();
    let snapshot = &outcome.snapshot;
    let served = outcome.shutdown.orders_served();
    let forwarded = outcome.shutdown.dishes_forwarded();
    let cooked = outcome.shutdown.portions_cooked();

    if outcome.generated.orders != served {
        violations.push(Violation::LostOrders {
            generated: outcome.generated.orders,
            served,
        });
    }
    if snapshot.total_orders() != served {
        violations.push(Violation::UnrecordedOrders {
            served,
            recorded: snapshot.total_orders(),
        });
    }
    if outcome.generated.dishes != forwarded {
        violations.push(Violation::LostDishRequests {
            generated: outcome.generated.dishes,
            forwarded,
        });
    }
    if forwarded != cooked {
        violations.push(Violation::UncookedDishes { forwarded, cooked });
    }
    if snapshot.total_portions() != cooked {
        violations.push(Violation::UnrecordedPortions {
            cooked,
            recorded: snapshot.total_portions(),
        });
    }
    for (&table, row) in &snapshot.tables {
        if row.average_service != stats::average(row.total_service, row.orders) {
            violations.push(Violation::StaleAverage { table });
        }
    }
    for (dish, row) in &snapshot.dishes {
        if row.revenue != row.portions * catalog.price(dish)? {
            violations.push(Violation::RevenueMismatch {
                dish: dish.clone(),
                revenue: row.revenue,
            });
        }
    }
    // Every forwarded dish is cooked, so both ledgers price the same dishes.
    if snapshot.total_profit() != snapshot.total_revenue() {
        violations.push(Violation::ProfitMismatch {
            profit: snapshot.total_profit(),
            revenue: snapshot.total_revenue(),
        });
    }
    Ok(violations)
}
