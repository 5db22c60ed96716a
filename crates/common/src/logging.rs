//! Logging and tracing initialization.
//!
//! Library crates only emit `tracing` events. Installing a subscriber is
//! left to binaries, so embedding applications stay silent by default.

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level` when set.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Initialize logging, forcing debug output for the ReelSwipe crates.
pub fn init_verbose_logging(config: &LoggingConfig) {
    let verbose = LoggingConfig {
        level: "reelswipe_gesture=debug,reelswipe=debug,info".to_string(),
        ..config.clone()
    };
    init_logging(&verbose);
}
