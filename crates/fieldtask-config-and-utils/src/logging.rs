//! Logging initialization.
//!
//! Thin wrapper over the observability package: structured JSONL goes to
//! `~/.fieldtask/logs/dev.jsonl` and, when `also_stderr` is set, a compact
//! human-readable stream goes to stderr.

use crate::Paths;
use observability::LogConfig;

/// Service name stamped on every log line.
const SERVICE_NAME: &str = "fieldtask";

/// Initialize the logging system.
///
/// Log level comes from `RUST_LOG` when set, otherwise from `level`
/// (unknown names fall back to `info`).
///
/// ```ignore
/// init_logging("info", &paths, true);
/// tracing::info!("registration client started");
/// ```
pub fn init_logging(level: &str, paths: &Paths, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_insensitive_and_fallback() {
        assert_eq!(parse_level("DEBUG"), tracing::Level::DEBUG);
        assert_eq!(parse_level("Warn"), tracing::Level::WARN);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }
}
