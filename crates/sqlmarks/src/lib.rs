pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

use tracing::Level;

/// Install the stderr log subscriber. Each `verbosity` step raises the level from `WARN`.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
