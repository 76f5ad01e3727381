//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log levels via `EnvFilter`
//! - Zero-cost when disabled
//! - Optional JSON and file output

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

// Re-export tracing macros for use throughout the runtime
pub use tracing::{debug, error, info, trace, warn};

use crate::kind::ElementKind;

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level: trace, debug, info, warn, error
    pub level: String,
    /// Log file path; console only when unset
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // PYRT_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("PYRT_LOG_LEVEL") {
            config.level = level.to_lowercase();
        }

        // PYRT_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("PYRT_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("PYRT_LOG_JSON").is_ok();
        config.show_spans = std::env::var("PYRT_LOG_SPANS").is_ok();

        config
    }

    /// Parsed level, falling back to INFO for unknown names
    pub fn level(&self) -> Level {
        match self.level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Create debug config (verbose logging)
    pub fn debug() -> Self {
        Self {
            level: "trace".to_string(),
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

/// Initialize logging with custom configuration. Only the first call has
/// an effect; later calls (or an already-installed global subscriber) are
/// ignored.
pub fn init_with_config(config: &LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("pyrt={}", config.level().as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let console = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
                .boxed()
        } else {
            fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
                .with_target(true)
                .with_line_number(cfg!(debug_assertions))
                .boxed()
        };

        let file = config.log_path.as_deref().map(|path| {
            let path = Path::new(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().map(|n| n.to_owned()).unwrap_or_else(|| "pyrt.log".into());
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let _ = FILE_GUARD.set(guard);
            fmt::layer().with_writer(writer).with_ansi(false).boxed()
        });

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .with(file)
            .try_init();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Log native storage allocation
#[inline]
pub fn log_allocation(entity: &'static str, size: usize, ptr: *const u8) {
    trace!(event = "allocation", entity, size_bytes = size, address = ?ptr, "Memory allocated");
}

/// Log native storage release
#[inline]
pub fn log_deallocation(entity: &'static str, size: usize, ptr: *const u8) {
    trace!(event = "deallocation", entity, size_bytes = size, address = ?ptr, "Memory deallocated");
}

/// Log a buffer reallocation
#[inline]
pub fn log_buffer_growth(kind: ElementKind, old_capacity: usize, new_capacity: usize) {
    debug!(
        event = "buffer_growth",
        kind = kind.name(),
        old_capacity,
        new_capacity,
        "Buffer storage grown"
    );
}

/// Log creation of a non-owning array view
#[inline]
pub fn log_view_created(kind: ElementKind, rank: usize, len: usize) {
    trace!(event = "view_created", kind = kind.name(), rank, len, "Array view created");
}

/// Log a host/native conversion
#[inline]
pub fn log_conversion(from_type: &str, to_type: &str) {
    trace!(event = "type_conversion", from = from_type, to = to_type, "Type conversion performed");
}

/// Log a failed conversion
pub fn log_conversion_error(target: &str, error: &dyn std::fmt::Display) {
    debug!(event = "conversion_error", target_type = target, error = %error, "Conversion failed");
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_levels() {
        let config = LogConfig::default();
        assert_eq!(config.level(), Level::INFO);
        assert!(config.log_path.is_none());

        assert_eq!(LogConfig::debug().level(), Level::TRACE);

        let odd = LogConfig {
            level: "loud".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(odd.level(), Level::INFO);
    }

    #[test]
    fn test_init_idempotent() {
        init_with_config(&LogConfig::default());
        init_with_config(&LogConfig::debug()); // Should not panic
        assert!(is_initialized());
    }
}
