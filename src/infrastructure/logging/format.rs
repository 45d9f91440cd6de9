//! JSON line encoding of log entries
//!
//! Every entry is written as one JSON object on one line:
//!
//! ```text
//! {"level":"INFO","ts":"2024-03-01 08:00:00","file":"handlers/user.rs:42","msg":"user login","trace_id":"req-001","user_id":42}
//! ```
//!
//! Key names come from [`EncoderConfig`]. Reserved keys are never
//! overwritten by caller fields.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::config::{EncoderConfig, TimeZoneMode};
use crate::domain::ports::{Clock, Level};

/// Field carrying the caller's source file, set by the emit facade
pub(crate) const CALLER_FILE: &str = "caller.file";
/// Field carrying the caller's source line, set by the emit facade
pub(crate) const CALLER_LINE: &str = "caller.line";
/// Field carrying the caller-supplied fields as a JSON object
pub(crate) const CALLER_FIELDS: &str = "caller.fields";
/// Trace-correlation key
pub const TRACE_ID: &str = "trace_id";

const MESSAGE: &str = "message";

/// Shorten a source path to its last directory and file name plus line,
/// e.g. `src/handlers/user.rs` and 42 become `handlers/user.rs:42`
pub fn short_caller(file: &str, line: Option<u32>) -> String {
    let trimmed = file
        .rfind(['/', '\\'])
        .and_then(|last| file[..last].rfind(['/', '\\']).map(|prev| &file[prev + 1..]))
        .unwrap_or(file);
    let trimmed = trimmed.replace('\\', "/");
    match line {
        Some(line) => format!("{trimmed}:{line}"),
        None => trimmed,
    }
}

/// Formats tracing events as JSON lines
#[derive(Clone)]
pub struct JsonEventFormat {
    config: Arc<EncoderConfig>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JsonEventFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonEventFormat")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JsonEventFormat {
    /// Create a formatter using `clock` for the time key
    pub fn new(config: EncoderConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            clock,
        }
    }

    fn timestamp(&self, now: DateTime<Utc>) -> String {
        match self.config.time_zone {
            TimeZoneMode::Local => now
                .with_timezone(&Local)
                .format(&self.config.time_format)
                .to_string(),
            TimeZoneMode::Utc => now.format(&self.config.time_format).to_string(),
        }
    }

    /// Build the JSON object for one event
    pub(crate) fn render(&self, event: &Event<'_>) -> Map<String, Value> {
        let meta = event.metadata();
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let caller = match visitor.caller_file.as_deref() {
            Some(file) => short_caller(file, visitor.caller_line),
            None => short_caller(meta.file().unwrap_or(meta.target()), meta.line()),
        };

        let cfg = &self.config;
        let mut line = Map::new();
        line.insert(
            cfg.level_key.clone(),
            Value::from(Level::from(meta.level()).as_str()),
        );
        line.insert(cfg.time_key.clone(), Value::from(self.timestamp(self.clock.now())));
        line.insert(cfg.caller_key.clone(), Value::from(caller));
        line.insert(
            cfg.message_key.clone(),
            Value::from(visitor.message.unwrap_or_default()),
        );
        if let Some(trace_id) = visitor.trace_id {
            line.insert(TRACE_ID.to_string(), Value::from(trace_id));
        }

        let caller_fields = visitor
            .caller_fields
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(&raw).ok())
            .unwrap_or_default();
        // trace_id only ever comes from the request context
        for (key, value) in visitor.fields.into_iter().chain(caller_fields) {
            if key != TRACE_ID {
                line.entry(key).or_insert(value);
            }
        }
        line
    }
}

impl<S, N> FormatEvent<S, N> for JsonEventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let line = self.render(event);
        let encoded = serde_json::to_string(&line).map_err(|_| fmt::Error)?;
        writeln!(writer, "{encoded}")
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: Option<String>,
    caller_file: Option<String>,
    caller_line: Option<u32>,
    caller_fields: Option<String>,
    trace_id: Option<String>,
    fields: Map<String, Value>,
}

impl EntryVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            MESSAGE => self.message = Some(value.to_string()),
            CALLER_FILE => self.caller_file = Some(value.to_string()),
            CALLER_FIELDS => self.caller_fields = Some(value.to_string()),
            TRACE_ID => self.trace_id = Some(value.to_string()),
            _ => self.put(field, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == CALLER_LINE {
            self.caller_line = u32::try_from(value).ok();
        } else {
            self.put(field, Value::from(value));
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        match field.name() {
            MESSAGE => self.message = Some(rendered),
            TRACE_ID => self.trace_id = Some(rendered),
            _ => self.put(field, Value::from(rendered)),
        }
    }
}
