//! Implementation of the `ctxlog emit` command.

use anyhow::{bail, Result};
use clap::Args;

use crate::domain::models::{Field, FieldValue};
use crate::domain::ports::{Level, TraceContext};
use crate::infrastructure::config::ServiceConfig;

#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Message text
    pub message: String,

    /// Entry level
    #[arg(short, long, default_value = "info")]
    pub level: Level,

    /// Trace id to attach; omit for an entry without `trace_id`
    #[arg(short, long)]
    pub trace_id: Option<String>,

    /// Extra field as key=value (repeatable)
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<Field>,
}

/// Parse `key=value`, typing the value as integer, float, bool or string
pub fn parse_field(raw: &str) -> Result<Field> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected key=value, got '{raw}'");
    };
    if key.is_empty() {
        bail!("field key cannot be empty");
    }

    let value = if let Ok(i) = value.parse::<i64>() {
        FieldValue::Int(i)
    } else if let Ok(f) = value.parse::<f64>() {
        FieldValue::Float(f)
    } else if let Ok(b) = value.parse::<bool>() {
        FieldValue::Bool(b)
    } else {
        FieldValue::Str(value.to_string())
    };
    Ok(Field::new(key.to_string(), value))
}

pub fn execute(args: EmitArgs, config: &ServiceConfig) -> Result<()> {
    let logger = super::start_logger(config)?;
    let ctx = args.trace_id.as_ref().map(|id| id as &dyn TraceContext);
    logger.emit(args.level, ctx, &args.message, &args.fields);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_types() {
        assert_eq!(parse_field("user_id=42").unwrap().value(), &FieldValue::Int(42));
        assert_eq!(parse_field("ratio=0.5").unwrap().value(), &FieldValue::Float(0.5));
        assert_eq!(parse_field("ok=true").unwrap().value(), &FieldValue::Bool(true));
        assert_eq!(
            parse_field("name=a=b").unwrap().value(),
            &FieldValue::Str("a=b".to_string())
        );
    }

    #[test]
    fn test_parse_field_rejects_malformed() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=1").is_err());
    }
}
