//! Demo, single-run, interactive, and stress-test runners.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::catalog::Catalog;
use crate::clock::format_clock;
use crate::config::Settings;
use crate::error::Result;
use crate::pipeline::{self, SimulationOutcome, Violation};
use crate::prompt;
use crate::report;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage};
    let zero = libc::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    let mut usage = rusage {
        ru_utime: zero,
        ru_stime: zero,
        ru_maxrss: 0,
        ru_ixrss: 0,
        ru_idrss: 0,
        ru_isrss: 0,
        ru_minflt: 0,
        ru_majflt: 0,
        ru_nswap: 0,
        ru_inblock: 0,
        ru_oublock: 0,
        ru_msgsnd: 0,
        ru_msgrcv: 0,
        ru_nsignals: 0,
        ru_nvcsw: 0,
        ru_nivcsw: 0,
    };
    let rc = unsafe { getrusage(RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

fn demo_settings() -> Settings {
    Settings {
        waiters: 3,
        chefs: 3,
        max_dishes_per_order: 2,
        tables: 4,
        order_limit: Some(8),
        order_interval_min: Duration::from_secs(60),
        order_interval_max: Duration::from_secs(3 * 60),
        duration: Duration::from_secs(60 * 60),
        ..Settings::default()
    }
}

fn print_report(outcome: &SimulationOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", report::to_json(&outcome.snapshot)?);
    } else {
        println!("Table statistics:");
        print!("{}", report::render_tables(&outcome.snapshot));
        println!();
        println!("Dish statistics:");
        print!("{}", report::render_dishes(&outcome.snapshot));
    }
    Ok(())
}

fn log_violations(violations: &[Violation]) {
    for violation in violations {
        warn!(%violation, "bookkeeping violation");
        eprintln!("# violation,{violation}");
    }
}

/// Run a short fixed day and print a summary.
pub fn run_demo() -> Result<()> {
    let catalog = Arc::new(Catalog::standard());
    let settings = demo_settings();
    let outcome = pipeline::run(&settings, Arc::clone(&catalog))?;
    let violations = pipeline::audit(&outcome, &catalog)?;
    log_violations(&violations);

    let per_waiter: Vec<u64> = outcome.shutdown.waiters.iter().map(|w| w.orders).collect();
    let per_chef: Vec<u64> = outcome.shutdown.chefs.iter().map(|c| c.portions).collect();
    println!("DEMO SUMMARY");
    println!(
        "waiters={} chefs={} tables={}",
        settings.waiters, settings.chefs, settings.tables
    );
    println!("orders_generated={}", outcome.generated.orders);
    println!("dishes_enqueued={}", outcome.shutdown.dishes_forwarded());
    println!("portions_prepared={}", outcome.snapshot.total_portions());
    println!("orders_per_waiter={per_waiter:?}");
    println!("portions_per_chef={per_chef:?}");
    println!("invariant_violations={}", violations.len());
    println!("closed_at={}", format_clock(outcome.virtual_elapsed));
    println!();
    print_report(&outcome, false)
}

/// Run one day with explicit settings and print the final statistics.
pub fn run_with(settings: &Settings, catalog: Arc<Catalog>, json: bool) -> Result<()> {
    let outcome = pipeline::run(settings, Arc::clone(&catalog))?;
    log_violations(&pipeline::audit(&outcome, &catalog)?);
    if !json {
        println!(
            "Kitchen closed at {} after {} periodic reports.",
            format_clock(outcome.virtual_elapsed),
            outcome.periodic_reports
        );
        println!();
    }
    print_report(&outcome, json)
}

/// Ask for the settings on the terminal, then run.
pub fn run_interactive(catalog: Arc<Catalog>, json: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let settings = prompt::read_settings(&mut input, &mut output)?;
    println!("Restaurant is open!");
    run_with(&settings, catalog, json)?;
    println!("Restaurant is closed!");
    Ok(())
}

/// Sweep waiter/chef combinations and print one CSV row per run.
pub fn run_stress(
    waiter_sets: &[usize],
    chef_sets: &[usize],
    base: &Settings,
    catalog: Arc<Catalog>,
    validate: bool,
) -> Result<()> {
    println!(
        "waiters,chefs,orders,dishes,elapsed_ms,virtual_min,throughput_dishes_per_s,avg_service_us,cpu_user_s,cpu_sys_s,violations"
    );
    for &waiters in waiter_sets {
        for &chefs in chef_sets {
            let settings = Settings {
                waiters,
                chefs,
                ..base.clone()
            };
            let cpu_start = cpu_times_seconds();
            let outcome = pipeline::run(&settings, Arc::clone(&catalog))?;
            let (cpu_user, cpu_sys) = match (cpu_start, cpu_times_seconds()) {
                (Some((user_start, sys_start)), Some((user_end, sys_end))) => (
                    format!("{:.4}", user_end - user_start),
                    format!("{:.4}", sys_end - sys_start),
                ),
                _ => ("NA".to_string(), "NA".to_string()),
            };
            let elapsed_ms = outcome.elapsed.as_secs_f64() * 1_000.0;
            let throughput = if elapsed_ms > 0.0 {
                outcome.snapshot.total_portions() as f64 / (elapsed_ms / 1_000.0)
            } else {
                0.0
            };
            let violations = if validate {
                pipeline::audit(&outcome, &catalog)?
            } else {
                Vec::new()
            };
            println!(
                "{},{},{},{},{:.2},{:.1},{:.2},{:.2},{},{},{}",
                waiters,
                chefs,
                outcome.generated.orders,
                outcome.generated.dishes,
                elapsed_ms,
                outcome.virtual_elapsed.as_secs_f64() / 60.0,
                throughput,
                outcome.snapshot.overall_average_service().as_secs_f64() * 1_000_000.0,
                cpu_user,
                cpu_sys,
                violations.len()
            );
            log_violations(&violations);
        }
    }
    Ok(())
}
