//! Logging Infrastructure
//!
//! `RUST_LOG` takes precedence over the configured level. A second
//! initialisation leaves the first subscriber in place, so tests and hosts
//! can both call in.

use crate::core::EngineConfig;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "pricing-engine";

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_file(None, None);
}

pub fn init_logger_from_config(config: &EngineConfig) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}

/// Initialize the logger, writing daily rolling files under `log_dir` when given
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    let Some(dir) = log_dir else {
        let _ = builder.try_init();
        return;
    };

    match std::fs::create_dir_all(dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let _ = builder.with_ansi(false).with_writer(appender).try_init();
        }
        Err(e) => {
            let _ = builder.try_init();
            tracing::warn!(log_dir = %dir, error = %e, "Cannot create log directory, logging to stdout");
        }
    }
}
