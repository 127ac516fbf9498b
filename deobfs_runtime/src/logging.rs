use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Accepted `--log` values.
pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Install the global subscriber. `RUST_LOG` wins over `level`; unknown
/// levels fall back to info. Returns false if a subscriber was already
/// installed, which leaves that one in place.
pub fn init_logging(level: &str) -> bool {
    let level = if LOG_LEVELS.contains(&level) { level } else { "info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_keeps_first() {
        init_logging("debug");
        assert!(!init_logging("warn"));
    }
}
