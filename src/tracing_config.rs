use std::env;

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogFormat, LogLevel};

/// Initialize tracing for the application
///
/// `RUST_LOG` takes precedence over `level` when set. The console format can
/// be forced with `AUTOPOWER_LOG_FORMAT=json|pretty`. With `log_to_file`, logs
/// are additionally written to a daily rotated file in the log directory;
/// the returned guard must be kept alive for the file to be flushed.
///
/// # Errors
/// Returns error if the log directory cannot be created or a subscriber is already set
pub fn init(
    level: LogLevel,
    format: LogFormat,
    log_to_file: bool,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    const DAYS_TO_KEEP: usize = 7;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autopower={level},warn")));

    let format = match env::var("AUTOPOWER_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        Ok("pretty") => LogFormat::Pretty,
        _ => format,
    };

    let (file_layer, guard) = if log_to_file {
        let file_appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .max_log_files(DAYS_TO_KEEP)
            .filename_prefix("autopower")
            .filename_suffix("log")
            .build(ConfigPaths::log_dir()?)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_level(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().with_target(true).with_level(true))
                .try_init()?;
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_level(true)
                        .with_thread_names(true),
                )
                .try_init()?;
        }
    }

    Ok(guard)
}
