use std::panic::Location;
use std::sync::Arc;

use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use super::config::LogConfig;
use super::format::JsonEventFormat;
use super::rotation::{FilePattern, RotatingFileWriter, RotationPolicy};
use super::writer::LockedWriter;
use crate::domain::errors::{LoggerError, LoggerResult};
use crate::domain::models::{fields_to_json, DurationUnit, Field};
use crate::domain::ports::{Clock, Level, SystemClock, TraceContext};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Outcome of building a logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitStatus {
    /// Every configured sink is active
    Ready,
    /// The logger works, but some sinks could not be set up
    Degraded {
        /// Why each missing sink was dropped
        reasons: Vec<String>,
    },
}

impl InitStatus {
    /// Whether every configured sink is active
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Builds a [`Logger`] from a [`LogConfig`]
///
/// The clock and the console writer can be replaced, which is how tests
/// capture output and simulate rotation boundaries.
pub struct LoggerBuilder {
    config: LogConfig,
    clock: Arc<dyn Clock>,
    console_writer: Option<BoxMakeWriter>,
}

impl LoggerBuilder {
    /// Start from `config`
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            console_writer: None,
        }
    }

    /// Use `clock` for timestamps and rotation
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Write console entries to `writer` instead of stdout/stderr
    #[must_use]
    pub fn console_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        self.console_writer = Some(BoxMakeWriter::new(writer));
        self
    }

    /// Build the logger
    ///
    /// Invalid configuration is an error. A file sink whose first file
    /// cannot be created is dropped instead, and the returned status says
    /// why; the console sink keeps working.
    pub fn build(self) -> LoggerResult<(Logger, InitStatus)> {
        let Self {
            config,
            clock,
            console_writer,
        } = self;

        let console_level: Level = config.console.level.parse()?;
        let file_level: Level = config.file.level.parse()?;
        let console_filter = sink_filter(console_level, config.console.filter.as_deref())?;
        let file_filter = sink_filter(file_level, config.file.filter.as_deref())?;
        let pattern = FilePattern::parse(&config.file.pattern)?;
        let policy = RotationPolicy::from_config(&config.file)?;

        let format = JsonEventFormat::new(config.encoder.clone(), Arc::clone(&clock));
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guards = Vec::new();
        let mut reasons = Vec::new();
        let mut file_writer = None;

        if config.console.enabled {
            let writer = console_writer.unwrap_or_else(|| {
                BoxMakeWriter::new(LockedWriter::console(config.console.target))
            });
            layers.push(
                tracing_subscriber::fmt::layer()
                    .event_format(format.clone())
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(console_filter)
                    .boxed(),
            );
        }

        if config.file.enabled {
            match RotatingFileWriter::open(
                pattern,
                policy,
                Arc::clone(&clock),
                config.encoder.time_zone,
            ) {
                Ok(writer) => {
                    let file_layer = tracing_subscriber::fmt::layer()
                        .event_format(format)
                        .with_ansi(false);
                    let layer = if config.file.non_blocking {
                        let (non_blocking, guard) = tracing_appender::non_blocking(writer.clone());
                        guards.push(guard);
                        file_layer
                            .with_writer(non_blocking)
                            .with_filter(file_filter)
                            .boxed()
                    } else {
                        file_layer
                            .with_writer(writer.clone())
                            .with_filter(file_filter)
                            .boxed()
                    };
                    layers.push(layer);
                    file_writer = Some(writer);
                }
                Err(e) => reasons.push(format!(
                    "file sink disabled: cannot open log file for pattern '{}': {e}",
                    config.file.pattern
                )),
            }
        }

        let dispatch = Dispatch::new(tracing_subscriber::registry().with(layers));
        let status = if reasons.is_empty() {
            InitStatus::Ready
        } else {
            InitStatus::Degraded { reasons }
        };

        let logger = Logger {
            inner: Arc::new(LoggerInner {
                dispatch,
                duration_unit: config.encoder.duration_unit,
                file_writer,
                _guards: guards,
            }),
        };

        if let InitStatus::Degraded { reasons } = &status {
            for reason in reasons {
                logger.warn(None, "logger degraded", &[Field::str("reason", reason.clone())]);
            }
        }

        Ok((logger, status))
    }
}

fn sink_filter(level: Level, directive: Option<&str>) -> LoggerResult<EnvFilter> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .parse(directive.unwrap_or_default())?;
    Ok(filter)
}

struct LoggerInner {
    dispatch: Dispatch,
    duration_unit: DurationUnit,
    file_writer: Option<RotatingFileWriter>,
    // flushes the background file worker on drop
    _guards: Vec<WorkerGuard>,
}

/// Request-correlated structured logger
///
/// Constructed once at service startup and shared by reference (clones are
/// cheap and share the same sinks). Emit calls never fail: sink errors are
/// reported on stderr and the entry is dropped.
///
/// # Example
///
/// ```no_run
/// use ctxlog::{field, LogConfig, Logger};
///
/// let (logger, status) = Logger::builder(LogConfig::default()).build()?;
/// assert!(status.is_ready());
///
/// logger.info(Some(&"req-001"), "user login", &[field("user_id", 42)]);
/// logger.debug(None, "cache warmed", &[]);
/// # Ok::<(), ctxlog::LoggerError>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("duration_unit", &self.inner.duration_unit)
            .field("file_writer", &self.inner.file_writer)
            .finish_non_exhaustive()
    }
}

macro_rules! dispatch_event {
    ($level:expr, $caller:expr, $trace_id:expr, $fields:expr, $message:expr) => {
        tracing::event!(
            target: "ctxlog",
            $level,
            caller.file = $caller.file(),
            caller.line = $caller.line(),
            trace_id = $trace_id,
            caller.fields = $fields,
            "{}",
            $message
        )
    };
}

impl Logger {
    /// Start building a logger
    pub fn builder(config: LogConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    /// Build a logger with default clock and console stream
    pub fn new(config: LogConfig) -> LoggerResult<(Self, InitStatus)> {
        LoggerBuilder::new(config).build()
    }

    /// Route plain `tracing` macros from the whole process to this logger's sinks
    ///
    /// Can succeed at most once per process.
    pub fn install_global(&self) -> LoggerResult<()> {
        tracing::dispatcher::set_global_default(self.inner.dispatch.clone())
            .map_err(|_| LoggerError::GlobalAlreadySet)
    }

    /// The underlying dispatcher, for `tracing::dispatcher::with_default`
    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// The rotating file writer, when the file sink is active
    pub fn file_writer(&self) -> Option<&RotatingFileWriter> {
        self.inner.file_writer.as_ref()
    }

    /// Emit one entry at `level`
    ///
    /// With a context, the entry carries a `trace_id` field holding the
    /// context's identifier (empty when its header is missing). Without
    /// one, no `trace_id` key is written. The recorded source location is
    /// the caller's.
    #[track_caller]
    pub fn emit(&self, level: Level, ctx: Option<&dyn TraceContext>, message: &str, fields: &[Field]) {
        let caller = Location::caller();
        let trace_id = ctx.map(|c| c.trace_id());
        let encoded = (!fields.is_empty())
            .then(|| serde_json::to_string(&fields_to_json(fields, self.inner.duration_unit)).ok())
            .flatten();
        let trace_id = trace_id.as_deref();
        let encoded = encoded.as_deref();

        tracing::dispatcher::with_default(&self.inner.dispatch, || match level {
            Level::Trace => dispatch_event!(tracing::Level::TRACE, caller, trace_id, encoded, message),
            Level::Debug => dispatch_event!(tracing::Level::DEBUG, caller, trace_id, encoded, message),
            Level::Info => dispatch_event!(tracing::Level::INFO, caller, trace_id, encoded, message),
            Level::Warn => dispatch_event!(tracing::Level::WARN, caller, trace_id, encoded, message),
            Level::Error => dispatch_event!(tracing::Level::ERROR, caller, trace_id, encoded, message),
        });
    }

    /// Emit at `DEBUG`
    #[track_caller]
    pub fn debug(&self, ctx: Option<&dyn TraceContext>, message: &str, fields: &[Field]) {
        self.emit(Level::Debug, ctx, message, fields);
    }

    /// Emit at `INFO`
    #[track_caller]
    pub fn info(&self, ctx: Option<&dyn TraceContext>, message: &str, fields: &[Field]) {
        self.emit(Level::Info, ctx, message, fields);
    }

    /// Emit at `WARN`
    #[track_caller]
    pub fn warn(&self, ctx: Option<&dyn TraceContext>, message: &str, fields: &[Field]) {
        self.emit(Level::Warn, ctx, message, fields);
    }

    /// Emit at `ERROR`
    #[track_caller]
    pub fn error(&self, ctx: Option<&dyn TraceContext>, message: &str, fields: &[Field]) {
        self.emit(Level::Error, ctx, message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::field;
    use crate::domain::ports::ManualClock;
    use crate::infrastructure::logging::config::TimeZoneMode;
    use crate::infrastructure::logging::writer::LockedWriter;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tempfile::TempDir;

    fn console_only() -> (Logger, LockedWriter<Vec<u8>>) {
        let mut config = LogConfig::default();
        config.file.enabled = false;
        config.encoder.time_zone = TimeZoneMode::Utc;
        let console = LockedWriter::buffer();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
        let (logger, status) = Logger::builder(config)
            .clock(Arc::new(clock))
            .console_writer(console.clone())
            .build()
            .unwrap();
        assert!(status.is_ready());
        (logger, console)
    }

    fn parse(output: &str) -> Vec<Value> {
        output.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut config = LogConfig::default();
        config.console.level = "loud".to_string();
        assert!(matches!(
            Logger::new(config).unwrap_err(),
            LoggerError::InvalidLevel(_)
        ));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut config = LogConfig::default();
        config.file.pattern = "   ".to_string();
        assert!(matches!(
            Logger::new(config).unwrap_err(),
            LoggerError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_caller_location_is_the_call_site() {
        let (logger, console) = console_only();
        let line = line!() + 1;
        logger.info(None, "here", &[]);

        let entries = parse(&console.contents());
        assert_eq!(entries[0]["file"], format!("logging/logger.rs:{line}"));
    }

    #[test]
    fn test_trace_id_only_with_context() {
        let (logger, console) = console_only();
        logger.info(Some(&"abc123"), "with", &[]);
        logger.info(None, "without", &[]);

        let entries = parse(&console.contents());
        assert_eq!(entries[0]["trace_id"], "abc123");
        assert!(entries[1].get("trace_id").is_none());
    }

    #[test]
    fn test_fields_and_duration_unit() {
        let (logger, console) = console_only();
        logger.warn(
            None,
            "slow query",
            &[
                field("rows", 12_u64),
                Field::duration("elapsed", std::time::Duration::from_millis(250)),
            ],
        );

        let entries = parse(&console.contents());
        assert_eq!(entries[0]["level"], "WARN");
        assert_eq!(entries[0]["rows"], 12);
        assert_eq!(entries[0]["elapsed"], 250);
    }

    #[test]
    fn test_trace_level_filtered_from_console() {
        let (logger, console) = console_only();
        logger.emit(Level::Trace, None, "too verbose", &[]);
        logger.debug(None, "visible", &[]);

        let entries = parse(&console.contents());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["msg"], "visible");
    }

    #[test]
    fn test_unwritable_directory_degrades_to_console() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = LogConfig::default();
        config.file.pattern = format!("{}/%Y%m%d/info.log", blocker.display());
        let console = LockedWriter::buffer();
        let (logger, status) = Logger::builder(config)
            .console_writer(console.clone())
            .build()
            .unwrap();

        match &status {
            InitStatus::Degraded { reasons } => assert_eq!(reasons.len(), 1),
            InitStatus::Ready => panic!("expected degraded status"),
        }
        assert!(logger.file_writer().is_none());

        logger.error(None, "still logging", &[]);
        let entries = parse(&console.contents());
        assert_eq!(entries[0]["msg"], "logger degraded");
        assert_eq!(entries[1]["msg"], "still logging");
    }
}
