//! Domain models

pub mod field;

pub use field::{field, fields_to_json, DurationUnit, Field, FieldValue};
