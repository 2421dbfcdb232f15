//! Tracing subscriber setup for the command-line binary.
//!
//! Library code only emits `tracing` events. The binary decides where they
//! go: stderr, filtered by `RUST_LOG` when set, otherwise by
//! `logging.level` from the settings.

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when neither `RUST_LOG` nor the configured level parses.
const FALLBACK_FILTER: &str = "warn";

/// Builds the filter: `RUST_LOG` first, then the configured level.
pub fn env_filter(config: &LoggingConfig, debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if debug { "debug" } else { config.level.as_str() };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
    })
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_logging(config: &LoggingConfig, debug: bool) {
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(config, debug))
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid filter".to_string(),
        };
        // Must not panic
        let _filter = env_filter(&config, false);
        init_logging(&config, false);
        init_logging(&config, true);
    }
}
