//! Text and JSON renderings of a statistics snapshot.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::stats::StatsSnapshot;
use crate::types::TableId;

const TABLE_RULE: &str = "+-------+---------+------------+------------------+";
const DISH_RULE: &str = "+------------------+----------+------------+";

fn millis(span: Duration) -> f64 {
    span.as_secs_f64() * 1_000.0
}

/// Per-table table: orders, profit, and average service time.
pub fn render_tables(snapshot: &StatsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TABLE_RULE}");
    let _ = writeln!(
        out,
        "| {:<5} | {:>7} | {:>10} | {:>16} |",
        "Table", "Orders", "Profit", "Avg service (ms)"
    );
    let _ = writeln!(out, "{TABLE_RULE}");
    for (table, row) in &snapshot.tables {
        let avg = if row.orders > 0 {
            format!("{:.3}", millis(row.average_service))
        } else {
            "no orders".to_string()
        };
        let _ = writeln!(
            out,
            "| {:<5} | {:>7} | {:>10} | {:>16} |",
            table, row.orders, row.profit, avg
        );
    }
    let _ = writeln!(out, "{TABLE_RULE}");
    let _ = writeln!(
        out,
        "| {:<5} | {:>7} | {:>10} | {:>16.3} |",
        "TOTAL",
        snapshot.total_orders(),
        snapshot.total_profit(),
        millis(snapshot.overall_average_service())
    );
    let _ = writeln!(out, "{TABLE_RULE}");
    out
}

/// Per-dish table: portions prepared and revenue.
pub fn render_dishes(snapshot: &StatsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{DISH_RULE}");
    let _ = writeln!(out, "| {:<16} | {:>8} | {:>10} |", "Dish", "Portions", "Revenue");
    let _ = writeln!(out, "{DISH_RULE}");
    for (dish, row) in &snapshot.dishes {
        let _ = writeln!(
            out,
            "| {:<16} | {:>8} | {:>10} |",
            dish, row.portions, row.revenue
        );
    }
    let _ = writeln!(out, "{DISH_RULE}");
    let _ = writeln!(
        out,
        "| {:<16} | {:>8} | {:>10} |",
        "TOTAL",
        snapshot.total_portions(),
        snapshot.total_revenue()
    );
    let _ = writeln!(out, "{DISH_RULE}");
    out
}

#[derive(Debug, Serialize)]
struct TableRow {
    table: TableId,
    orders: u64,
    profit: u64,
    avg_service_ms: f64,
}

#[derive(Debug, Serialize)]
struct DishRow<'a> {
    dish: &'a str,
    portions: u64,
    revenue: u64,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    tables: Vec<TableRow>,
    dishes: Vec<DishRow<'a>>,
    total_orders: u64,
    total_profit: u64,
    total_portions: u64,
    total_revenue: u64,
}

/// Pretty-printed JSON with both tables and the totals.
pub fn to_json(snapshot: &StatsSnapshot) -> Result<String> {
    let report = Report {
        tables: snapshot
            .tables
            .iter()
            .map(|(&table, row)| TableRow {
                table,
                orders: row.orders,
                profit: row.profit,
                avg_service_ms: millis(row.average_service),
            })
            .collect(),
        dishes: snapshot
            .dishes
            .iter()
            .map(|(dish, row)| DishRow {
                dish,
                portions: row.portions,
                revenue: row.revenue,
            })
            .collect(),
        total_orders: snapshot.total_orders(),
        total_profit: snapshot.total_profit(),
        total_portions: snapshot.total_portions(),
        total_revenue: snapshot.total_revenue(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
