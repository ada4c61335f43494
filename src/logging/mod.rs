pub mod formatter;

use crate::cli::TracingFormat;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Configure and initialize logging for the application.
pub fn setup_logging(log_level: &str, tracing_format: TracingFormat) {
    // Dependencies stay at warn; RUST_LOG replaces the whole filter when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,offerings={log_level}")));

    match tracing_format {
        TracingFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .event_format(formatter::CustomPrettyFormatter)
                        .fmt_fields(formatter::compact_fields()),
                )
                .init();
        }
        TracingFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_target(true)
                        .with_current_span(false),
                )
                .init();
        }
    }
}
