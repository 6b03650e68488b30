//! Status output and diagnostic logging.
//!
//! Two layers with different audiences:
//!
//! - [`Logger`] carries the user-facing status lines (generation, removal,
//!   errors). It is injected into the pipeline and dispatcher as a trait
//!   object so tests can capture output; there is no process-wide logger.
//! - `tracing` carries internal diagnostics (watch registration failures,
//!   filtered events), configured per module with `RUST_LOG` overrides.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! "plantwatch::watcher" = "debug"
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Sink for user-facing status lines.
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

/// Writes each status line to stdout, prefixed with the local wall-clock
/// time as zero-padded `HH:MM:SS`.
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("{} {message}", timestamp());
    }
}

/// Current local time formatted as zero-padded `HH:MM:SS`.
pub(crate) fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Compact time format for diagnostics: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Initialize diagnostic logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes
/// effect). The `RUST_LOG` environment variable takes precedence over config
/// settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            let mut filter_str = config.default.clone();
            for (module, level) in &config.modules {
                filter_str.push_str(&format!(",{module}={level}"));
            }
            EnvFilter::new(&filter_str)
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Initialize diagnostic logging with default configuration.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_zero_padded_hh_mm_ss() {
        let stamp = timestamp();
        let bytes = stamp.as_bytes();
        assert_eq!(bytes.len(), 8, "unexpected stamp: {stamp}");
        assert_eq!(bytes[2], b':');
        assert_eq!(bytes[5], b':');
        for i in [0, 1, 3, 4, 6, 7] {
            assert!(bytes[i].is_ascii_digit(), "unexpected stamp: {stamp}");
        }
    }
}
