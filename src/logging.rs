//! Structured logging for invalidate-cdn
//!
//! Logs go to stderr so they never mix with the workflow commands
//! (`::error::`, `::warning::`) written to stdout.
//!
//! # Log Format Conventions
//!
//! - `operation`: The step being performed (e.g., "install", "authenticate", "exec")
//! - `status`: The result status ("success", "skipped")
//! - `version`: gcloud version involved
//! - `component`: gcloud component involved ("alpha", "beta")
//!
//! # Examples
//!
//! ```rust
//! use tracing::info;
//!
//! let version = "450.0.0";
//! info!(operation = "install", status = "success", version, "gcloud cached");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::{fmt as std_fmt, io};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

/// RFC 3339 timestamp in UTC, the only zone the `Z` suffix may describe
fn timestamp<Tz: TimeZone>(at: DateTime<Tz>) -> String {
    at.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

/// Custom formatter that shows "invalidate-cdn" instead of full module path
struct ActionFormatter {
    with_ansi: bool,
}

impl<S, N> FormatEvent<S, N> for ActionFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let meta = event.metadata();

        write!(writer, "{} ", timestamp(Utc::now()))?;

        if self.with_ansi {
            let level_style = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m", // Red
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::TRACE => "\x1b[35m", // Magenta
            };
            write!(
                writer,
                "{}{:5}(invalidate-cdn)\x1b[0m: ",
                level_style,
                meta.level()
            )?;
        } else {
            write!(writer, "{:5}(invalidate-cdn): ", meta.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format (default for local runs)
    Pretty,
    /// Compact format (for CI)
    Compact,
    /// JSON format (for log aggregation systems)
    Json,
}

impl LogFormat {
    /// Resolve from INVALIDATE_CDN_LOG_FORMAT, then the config file, then `CI`
    pub fn resolve(configured: Option<&str>) -> Self {
        let env = std::env::var("INVALIDATE_CDN_LOG_FORMAT").ok();
        let ci = std::env::var("CI").is_ok();
        Self::select(env.as_deref().or(configured), ci)
    }

    fn select(requested: Option<&str>, ci: bool) -> Self {
        match requested.unwrap_or_default().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            _ => {
                if ci {
                    Self::Compact
                } else {
                    Self::Pretty
                }
            }
        }
    }
}

/// Initialize the global tracing subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: Overrides `default_level` (e.g., "debug", "warn")
/// - `INVALIDATE_CDN_LOG_FORMAT`: Set format ("pretty", "compact", "json")
/// - `CI`: If set, defaults to compact format
pub fn init(default_level: &str, format: Option<&str>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match LogFormat::resolve(format) {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .event_format(ActionFormatter { with_ansi: true })
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .event_format(ActionFormatter { with_ansi: false })
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_ansi(false)
                        .with_writer(io::stderr)
                        .json(),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_format() {
        assert_eq!(LogFormat::select(Some("json"), false), LogFormat::Json);
        assert_eq!(LogFormat::select(Some("COMPACT"), false), LogFormat::Compact);
        assert_eq!(LogFormat::select(Some("pretty"), true), LogFormat::Pretty);
        assert_eq!(LogFormat::select(None, true), LogFormat::Compact);
        assert_eq!(LogFormat::select(Some("unknown"), false), LogFormat::Pretty);
    }

    #[test]
    fn test_timestamp_is_utc() {
        let local = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .unwrap();
        assert_eq!(timestamp(local), "2024-03-01T10:30:00.000000Z");

        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(timestamp(utc), "2024-03-01T12:30:00.000000Z");
    }
}
