//! Optional periodic statistics while the restaurant is running.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use tracing::info;

use crate::clock::{SimClock, format_clock};
use crate::error::Result;
use crate::pool::{self, Worker};
use crate::stats::StatsAggregator;

/// Logs a snapshot every interval until [`PeriodicReporter::stop`] is called.
pub struct PeriodicReporter {
    stop: mpsc::Sender<()>,
    worker: Worker<u64>,
}

impl PeriodicReporter {
    /// Start the `reporter` thread, logging every `every` of real time.
    pub fn spawn(stats: Arc<StatsAggregator>, clock: SimClock, every: Duration) -> Result<Self> {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let worker = pool::spawn("reporter".to_string(), move || {
            let mut ticks = 0u64;
            loop {
                match stop_rx.recv_timeout(every) {
                    Err(RecvTimeoutError::Timeout) => {
                        let snapshot = stats.snapshot();
                        ticks += 1;
                        info!(
                            at = %format_clock(clock.virtual_elapsed()),
                            orders = snapshot.total_orders(),
                            profit = snapshot.total_profit(),
                            portions = snapshot.total_portions(),
                            revenue = snapshot.total_revenue(),
                            "current statistics"
                        );
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(ticks),
                }
            }
        })?;
        Ok(Self { stop, worker })
    }

    /// Stop reporting and return how many reports were produced.
    pub fn stop(self) -> Result<u64> {
        // The reporter may already be gone; join tells us how it ended.
        let _ = self.stop.send(());
        self.worker.join()
    }
}
