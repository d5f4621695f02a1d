//! Guests placing orders at random intervals for the length of the day.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::clock::{SimClock, format_clock};
use crate::config::Settings;
use crate::coordinator::{IntakeClosed, OrderIntake};
use crate::error::{ConfigError, Result};
use crate::types::{Order, OrderIds, TableId};

/// Totals emitted by the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratorReport {
    /// Orders pushed onto the order queue.
    pub orders: u64,
    /// Sum of the dish-list lengths of every emitted order.
    pub dishes: u64,
}

/// Produces random orders on a virtual schedule.
pub struct OrderGenerator {
    catalog: Arc<Catalog>,
    clock: SimClock,
    ids: OrderIds,
    rng: StdRng,
    tables: TableId,
    max_dishes: usize,
    interval: (Duration, Duration),
    duration: Duration,
    order_limit: Option<u64>,
}

impl OrderGenerator {
    /// Build a generator, rejecting settings it cannot draw orders from.
    pub fn new(
        settings: &Settings,
        catalog: Arc<Catalog>,
        clock: SimClock,
        ids: OrderIds,
    ) -> Result<Self, ConfigError> {
        if settings.tables == 0 {
            return Err(ConfigError::OutOfRange {
                field: "tables",
                value: 0,
                min: 1,
                max: u64::from(TableId::MAX),
            });
        }
        if settings.max_dishes_per_order == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max dishes per order",
                value: 0,
                min: 1,
                max: u64::MAX,
            });
        }
        if settings.order_interval_min > settings.order_interval_max {
            return Err(ConfigError::InvertedInterval {
                min: settings.order_interval_min,
                max: settings.order_interval_max,
            });
        }
        Ok(Self {
            catalog,
            clock,
            ids,
            rng: settings.rng_for(0),
            tables: settings.tables,
            max_dishes: settings.max_dishes_per_order,
            interval: (settings.order_interval_min, settings.order_interval_max),
            duration: settings.duration,
            order_limit: settings.order_limit,
        })
    }

    fn exhausted(&self, emitted: u64) -> bool {
        self.order_limit.is_some_and(|limit| emitted >= limit)
            || self.clock.virtual_elapsed() >= self.duration
    }

    fn next_order(&mut self) -> Order {
        let table = self.rng.gen_range(1..=self.tables);
        let count = self.rng.gen_range(1..=self.max_dishes);
        let dishes = (0..count)
            .map(|_| self.catalog.sample(&mut self.rng).name.clone())
            .collect();
        Order::new(self.ids.next(), table, dishes, self.clock.virtual_elapsed())
    }

    fn pause(&mut self) -> Duration {
        let (min, max) = self.interval;
        let millis = self
            .rng
            .gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    fn emit(&mut self, intake: &OrderIntake) -> Result<GeneratorReport> {
        let mut report = GeneratorReport::default();
        while !self.exhausted(report.orders) {
            let order = self.next_order();
            debug!(
                at = %format_clock(order.virtual_at),
                order = order.id,
                table = order.table,
                dishes = ?order.dishes,
                "new order"
            );
            let dish_count = order.dishes.len() as u64;
            intake.push(order)?;
            report.orders += 1;
            report.dishes += dish_count;

            if self.exhausted(report.orders) {
                break;
            }
            let pause = self.pause();
            self.clock.sleep_virtual(pause);
        }
        Ok(report)
    }

    /// Generate orders until the day (or the order limit) runs out, then close
    /// the intake. The intake is closed on every path, so the pipeline can
    /// always be shut down with the returned proof.
    pub fn run(mut self, intake: OrderIntake) -> (Result<GeneratorReport>, IntakeClosed) {
        let result = self.emit(&intake);
        if let Ok(report) = &result {
            info!(
                at = %format_clock(self.clock.virtual_elapsed()),
                orders = report.orders,
                dishes = report.dishes,
                last_id = self.ids.issued(),
                "kitchen stops taking orders"
            );
        }
        (result, intake.close())
    }
}
