// Process-wide tracing setup for the crop advisor binary.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Map a configured level name to a tracing level.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global fmt subscriber. Returns false when a subscriber was
/// already installed, which happens when tests or embedders set their own.
pub fn init_tracing(level: &str) -> bool {
    let level = parse_level(level).unwrap_or(Level::INFO);
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .is_ok()
}
