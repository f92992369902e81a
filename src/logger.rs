use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "RTC_LOADGEN_LOG";

/// Installs the global subscriber. A second call keeps the first one and
/// only reports the conflict on stderr.
pub fn init_logging(verbose: bool, no_color: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(verbose))
        .with_ansi(!no_color)
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

fn log_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    [LOG_ENV, "RUST_LOG"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}
