// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The command takes no flags, so the level comes from the `MIGCHECK_LOG`
//! environment variable (e.g. "info", "debug") and defaults to `info`.

use anyhow::Result;
use tracing_subscriber::fmt;

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup; calling it twice panics, which is fine
/// because only `main` calls it.
pub fn init_logging() -> Result<()> {
    let level = std::env::var("MIGCHECK_LOG")
        .ok()
        .and_then(|s| parse_level_str(&s))
        .unwrap_or(tracing::Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level_str("debug"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level_str(" WARN "), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
    }

    #[test]
    fn rejects_unknown_levels() {
        assert_eq!(parse_level_str("verbose"), None);
        assert_eq!(parse_level_str(""), None);
    }
}
