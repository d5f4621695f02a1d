mod catalog;
mod chef;
mod clock;
mod config;
mod coordinator;
mod error;
mod generator;
mod logging;
mod pipeline;
mod pool;
mod prompt;
mod queue;
mod report;
mod reporter;
mod sim;
mod stats;
mod types;
mod waiter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::{Result, SimError};

#[derive(Parser)]
#[command(name = "restaurant_sim", version)]
#[command(about = "Concurrent restaurant order pipeline simulation", long_about = None)]
struct Cli {
    /// Log every order and dish (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a short fixed day and print a summary (default)
    Demo,
    /// Run one day with the given settings
    Run(RunArgs),
    /// Ask for the settings on the terminal, then run
    Interactive {
        #[command(flatten)]
        menu: MenuArgs,
        /// Print the final statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sweep waiter/chef counts and print CSV metrics
    Stress(StressArgs),
}

#[derive(Args)]
struct MenuArgs {
    /// TOML menu with [[dish]] entries (defaults to the house menu)
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

impl MenuArgs {
    fn load(&self) -> Result<Arc<Catalog>> {
        let catalog = match &self.catalog {
            Some(path) => Catalog::load(path)?,
            None => Catalog::standard(),
        };
        info!(dishes = catalog.dish_count(), "menu loaded");
        Ok(Arc::new(catalog))
    }
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, default_value_t = 3)]
    waiters: usize,
    #[arg(long, default_value_t = 2)]
    chefs: usize,
    #[arg(long, default_value_t = 3)]
    max_dishes: usize,
    #[arg(long, default_value_t = 10)]
    tables: u32,
    /// Opening hours in virtual minutes
    #[arg(long, default_value_t = 660)]
    minutes: u64,
    /// Stop taking orders after this many
    #[arg(long)]
    order_limit: Option<u64>,
    #[arg(long, default_value_t = 100)]
    order_capacity: usize,
    #[arg(long, default_value_t = 100)]
    dish_capacity: usize,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Log current statistics every N real seconds
    #[arg(long, value_name = "SECS")]
    report_every_secs: Option<u64>,
    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    menu: MenuArgs,
}

impl RunArgs {
    fn settings(&self) -> Result<Settings> {
        let settings = Settings {
            waiters: self.waiters,
            chefs: self.chefs,
            max_dishes_per_order: self.max_dishes,
            tables: self.tables,
            order_limit: self.order_limit,
            order_queue_capacity: self.order_capacity,
            dish_queue_capacity: self.dish_capacity,
            seed: self.seed,
            report_every: self.report_every_secs.map(Duration::from_secs),
            ..Settings::default()
        }
        .with_duration_minutes(self.minutes)?;
        Ok(settings)
    }
}

#[derive(Args)]
struct StressArgs {
    /// Comma-separated waiter counts
    #[arg(long, value_delimiter = ',', default_values_t = [1, 2, 4])]
    waiters: Vec<usize>,
    /// Comma-separated chef counts
    #[arg(long, value_delimiter = ',', default_values_t = [1, 2, 4])]
    chefs: Vec<usize>,
    /// Opening hours per run in virtual minutes
    #[arg(long, default_value_t = 20)]
    minutes: u64,
    #[arg(long)]
    seed: Option<u64>,
    /// Audit every run and report bookkeeping violations
    #[arg(long)]
    validate: bool,
    #[command(flatten)]
    menu: MenuArgs,
}

fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Demo => sim::run_demo(),
        Command::Run(args) => sim::run_with(&args.settings()?, args.menu.load()?, args.json),
        Command::Interactive { menu, json } => sim::run_interactive(menu.load()?, json),
        Command::Stress(args) => {
            let base = Settings {
                seed: args.seed,
                ..Settings::default()
            }
            .with_duration_minutes(args.minutes)?;
            sim::run_stress(&args.waiters, &args.chefs, &base, args.menu.load()?, args.validate)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match dispatch(cli.command.unwrap_or(Command::Demo)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            match err {
                SimError::Config(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
