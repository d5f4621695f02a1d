//! Per-table and per-dish statistics shared by the worker pools.
//!
//! The maps are private; callers mutate them only through
//! [`StatsAggregator::record_table_service`] and
//! [`StatsAggregator::record_dish_prepared`]. Each update holds its map's
//! mutex for the whole read-modify-write, so a [`StatsAggregator::snapshot`]
//! never sees a count without the matching profit or time.
//!
//! Lock order: tables before dishes. Only `snapshot` takes both.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::error::{Result, SimError};
use crate::types::TableId;

/// Running totals for one table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Orders served.
    pub orders: u64,
    /// Sum of the catalog prices of every dish ordered.
    pub profit: u64,
    /// Sum of real service times.
    pub total_service: Duration,
    /// Always `total_service / orders`, recomputed on every update.
    pub average_service: Duration,
}

impl TableStats {
    fn record(&mut self, profit: u64, service: Duration) {
        self.orders += 1;
        self.profit += profit;
        self.total_service += service;
        self.average_service = average(self.total_service, self.orders);
    }
}

/// Running totals for one dish.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DishStats {
    /// Portions cooked.
    pub portions: u64,
    /// `portions` times the dish price.
    pub revenue: u64,
}

/// Mean of `count` spans totalling `total`, truncated to whole nanoseconds.
pub fn average(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// The only writer of table and dish statistics.
pub struct StatsAggregator {
    catalog: Arc<Catalog>,
    tables_total: TableId,
    tables: Mutex<HashMap<TableId, TableStats>>,
    dishes: Mutex<HashMap<String, DishStats>>,
}

impl StatsAggregator {
    /// Empty statistics for tables `1..=tables_total`.
    pub fn new(catalog: Arc<Catalog>, tables_total: TableId) -> Self {
        Self {
            catalog,
            tables_total,
            tables: Mutex::new(HashMap::new()),
            dishes: Mutex::new(HashMap::new()),
        }
    }

    /// Count one served order for `table`, adding its dishes' prices.
    ///
    /// Unknown dishes and out-of-range tables are rejected before anything
    /// is mutated.
    pub fn record_table_service(
        &self,
        table: TableId,
        dishes: &[String],
        service: Duration,
    ) -> Result<()> {
        if table == 0 || table > self.tables_total {
            return Err(SimError::TableOutOfRange {
                table,
                tables: self.tables_total,
            });
        }
        let profit = self.catalog.order_total(dishes)?;
        let mut guard = self.tables.lock().expect("table stats mutex poisoned");
        guard.entry(table).or_default().record(profit, service);
        Ok(())
    }

    /// Count one finished portion of `dish`.
    pub fn record_dish_prepared(&self, dish: &str) -> Result<()> {
        let price = self.catalog.price(dish)?;
        let mut guard = self.dishes.lock().expect("dish stats mutex poisoned");
        match guard.get_mut(dish) {
            Some(stats) => {
                stats.portions += 1;
                stats.revenue += price;
            }
            None => {
                guard.insert(
                    dish.to_string(),
                    DishStats {
                        portions: 1,
                        revenue: price,
                    },
                );
            }
        }
        Ok(())
    }

    /// Consistent copy of both maps, ordered by key.
    pub fn snapshot(&self) -> StatsSnapshot {
        let tables = self.tables.lock().expect("table stats mutex poisoned");
        let dishes = self.dishes.lock().expect("dish stats mutex poisoned");
        StatsSnapshot {
            tables: tables.iter().map(|(&k, v)| (k, v.clone())).collect(),
            dishes: dishes.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Menu used to price orders and dishes.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}

/// Point-in-time copy of all statistics, ordered by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tables: BTreeMap<TableId, TableStats>,
    pub dishes: BTreeMap<String, DishStats>,
}

impl StatsSnapshot {
    /// Orders across all tables.
    pub fn total_orders(&self) -> u64 {
        self.tables.values().map(|t| t.orders).sum()
    }

    /// Profit across all tables.
    pub fn total_profit(&self) -> u64 {
        self.tables.values().map(|t| t.profit).sum()
    }

    /// Portions across all dishes.
    pub fn total_portions(&self) -> u64 {
        self.dishes.values().map(|d| d.portions).sum()
    }

    /// Revenue across all dishes.
    pub fn total_revenue(&self) -> u64 {
        self.dishes.values().map(|d| d.revenue).sum()
    }

    /// Mean service time across every order of every table.
    pub fn overall_average_service(&self) -> Duration {
        let total: Duration = self.tables.values().map(|t| t.total_service).sum();
        average(total, self.total_orders())
    }
}
