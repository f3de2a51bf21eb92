//! Console and rolling file logging.

use dnacap_core::get_log_dir;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging.
///
/// The console layer writes to stderr so it does not interleave with the
/// progress readout. `RUST_LOG` overrides the verbosity flag.
pub fn setup(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console_layer = fmt::layer()
        .with_target(verbosity > 1)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let log_dir = get_log_dir();
    let file_layer = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "dnacap.log");
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(appender)
                    .with_filter(EnvFilter::new("info")),
            )
        }
        Err(e) => {
            eprintln!("Warning: failed to create log directory {log_dir:?}: {e}");
            None
        }
    };

    tracing_subscriber::registry().with(console_layer).with(file_layer).init();

    tracing::info!(?log_dir, "logging initialized");
}
