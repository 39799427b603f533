//! Tracing setup for the `quickdraw` binary.
//!
//! The `-v` count raises the level of the engine's own targets only. Tokio
//! and the other dependencies stay at `warn` unless `QUICKDRAW_LOG_LEVEL`
//! supplies a full filter. Logs go to stderr so stdout stays free for the
//! JSONL event stream, and JSON output carries the `match` span so every
//! line can be tied back to a `match_id`.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable holding a full `EnvFilter` directive string.
pub const LOG_LEVEL_ENV: &str = "QUICKDRAW_LOG_LEVEL";

/// Target prefix shared by every engine log line.
const ENGINE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Engine log level for a `-v` count, or `None` when only warnings show.
#[must_use]
pub const fn engine_level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::INFO),
        2 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Filter directives for a `-v` count.
///
/// `-v` shows phase transitions, shots, and round ends. `-vv` adds timer
/// bookkeeping (stale and cancelled timers, schedules). `-vvv` traces
/// everything the engine logs.
#[must_use]
pub fn filter_directives(verbosity: u8) -> String {
    engine_level(verbosity).map_or_else(
        || "warn".to_string(),
        |level| format!("warn,{ENGINE_TARGET}={}", level.as_str().to_lowercase()),
    )
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)));

    // Module paths only help once timer bookkeeping is visible
    let show_target = verbosity >= 2;

    let use_ansi = match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_default_is_warn_everywhere() {
        assert_eq!(engine_level(0), None);
        assert_eq!(filter_directives(0), "warn");
    }

    #[test]
    fn verbosity_only_raises_engine_targets() {
        assert_eq!(filter_directives(1), "warn,quickdraw=info");
        assert_eq!(filter_directives(2), "warn,quickdraw=debug");
        assert_eq!(filter_directives(3), "warn,quickdraw=trace");
        assert_eq!(filter_directives(u8::MAX), "warn,quickdraw=trace");
    }

    #[test]
    fn directives_parse_as_env_filter() {
        for verbosity in 0..=4 {
            let directives = filter_directives(verbosity);
            assert!(
                EnvFilter::try_new(&directives).is_ok(),
                "{directives} should parse"
            );
        }
    }
}
