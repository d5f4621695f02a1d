use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. Every line carries the thread name, so
/// waiter and chef activity can be told apart.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` enables per-order and
/// per-dish events; release builds stay at warnings unless asked.
pub fn init(verbose: bool) {
    let level = if verbose {
        "debug"
    } else if cfg!(debug_assertions) {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("restaurant_sim={level}")));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
