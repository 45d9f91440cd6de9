//! Caller-supplied structured fields.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Unit used to render [`FieldValue::Duration`] values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    /// Whole seconds
    Secs,
    /// Whole milliseconds
    #[default]
    Millis,
    /// Whole nanoseconds
    Nanos,
}

impl DurationUnit {
    fn render(self, duration: Duration) -> Value {
        let amount = match self {
            Self::Secs => u128::from(duration.as_secs()),
            Self::Millis => duration.as_millis(),
            Self::Nanos => duration.as_nanos(),
        };
        u64::try_from(amount).map_or_else(|_| Value::from(u64::MAX), Value::from)
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// UTF-8 string
    Str(String),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point; non-finite values are written as `null`
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Elapsed time, rendered in the logger's [`DurationUnit`]
    Duration(Duration),
    /// Arbitrary JSON
    Json(Value),
}

impl FieldValue {
    /// Render this value as JSON
    pub fn to_json(&self, unit: DurationUnit) -> Value {
        match self {
            Self::Str(s) => Value::String(s.clone()),
            Self::Int(i) => Value::from(*i),
            Self::Uint(u) => Value::from(*u),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Bool(b) => Value::Bool(*b),
            Self::Duration(d) => unit.render(*d),
            Self::Json(v) => v.clone(),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::$variant($conv(value))
                }
            }
        )*
    };
}

impl_from! {
    String => Str(|v| v),
    &str => Str(str::to_string),
    i64 => Int(|v| v),
    i32 => Int(i64::from),
    u64 => Uint(|v| v),
    u16 => Uint(u64::from),
    u32 => Uint(u64::from),
    usize => Uint(|v: usize| v as u64),
    f64 => Float(|v| v),
    bool => Bool(|v| v),
    Duration => Duration(|v| v),
    Value => Json(|v| v),
}

/// A named structured field attached to one log entry
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
}

impl Field {
    /// Build a field from any value convertible into [`FieldValue`]
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// String field
    pub fn str(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    /// Signed integer field
    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    /// Unsigned integer field
    pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint(value))
    }

    /// Float field
    pub fn float(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, FieldValue::Float(value))
    }

    /// Boolean field
    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    /// Duration field
    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    /// Arbitrary JSON field
    pub fn json(key: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self::new(key, FieldValue::Json(value))
    }

    /// Field name
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Field value
    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Shorthand for [`Field::new`]
pub fn field(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Field {
    Field::new(key, value)
}

/// Render fields as an ordered JSON object; later duplicates replace earlier ones
pub fn fields_to_json(fields: &[Field], unit: DurationUnit) -> Map<String, Value> {
    let mut map = Map::with_capacity(fields.len());
    for f in fields {
        map.insert(f.key.to_string(), f.value.to_json(unit));
    }
    map
}
