use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Initialize the tracing subscriber for the demo binary. Picks
/// human-readable output for an interactive terminal and JSON for
/// anything else (log shippers, `systemd` journal pipes, etc.), the same
/// split a deployed supplicant process uses.
pub fn init_stdout(max_level: Level) {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(max_level);

    if std::io::stdout().is_terminal() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(filter),
            )
            .init();
    }
}
