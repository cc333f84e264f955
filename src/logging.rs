//! Logging setup for dependency-autowire
//!
//! The container emits `tracing` events under the `dependency_autowire`
//! target: bindings at DEBUG, every resolution step at TRACE. This module
//! installs a `tracing-subscriber` to print them.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Colorful multi-line output
//!
//! Without one of the subscriber features, `init` does nothing and events go
//! to whatever subscriber the application installs itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use dependency_autowire::logging;
//!
//! logging::builder()
//!     .trace()
//!     .autowire_only()
//!     .compact()
//!     .init();
//! ```

use tracing::Level;

/// Crate log target
pub const TARGET: &str = "dependency_autowire";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line, colored
    Pretty,
    /// Single line per event
    Compact,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Include per-step resolution events
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Bindings, singleton creation and failures
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only show events from one target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show container events
    pub fn autowire_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// `EnvFilter` directive for the configured level and target
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber globally.
    ///
    /// Does nothing if a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Install the subscriber globally, failing if one is already set
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> Result<(), tracing_subscriber::util::TryInitError> {
        use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

        let filter = EnvFilter::new(self.directive());
        let base = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let layer = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => base.json().with_filter(filter).boxed(),
            // Without logging-json, JSON falls back to the default text format
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => base.with_filter(filter).boxed(),
            LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
            LogFormat::Compact => base.compact().with_filter(filter).boxed(),
        };

        tracing_subscriber::registry().with(layer).try_init()
    }

    /// No subscriber feature enabled: nothing to install
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// JSON if `logging-json` is enabled, else pretty
pub fn init() {
    #[cfg(feature = "logging-json")]
    {
        builder().json().init();
    }
    #[cfg(all(feature = "logging-pretty", not(feature = "logging-json")))]
    {
        builder().pretty().init();
    }
}

/// Pretty output restricted to container events, including every resolution step
pub fn init_autowire_only() {
    builder().pretty().trace().autowire_only().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(builder.target.is_none());
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .compact()
            .with_file()
            .with_line_number()
            .autowire_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Compact);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.directive(), "dependency_autowire=trace");
    }
}
