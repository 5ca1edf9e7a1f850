//! Typed view of a decoded container record.
//!
//! Avro values are converted into a small tagged representation so the rest
//! of the decoder never inspects schema-specific variants. Access is explicit:
//! `Record::get_int` fails with a typed error instead of coercing strings or
//! floats into integers.

use apache_avro::types::Value as AvroValue;
use kp_common::FieldError;
use std::collections::BTreeMap;
use std::fmt;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    /// Avro `int`, `long`, and the date/time logical types.
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<FieldValue>),
    /// Avro records and maps.
    Nested(Record),
    /// Logical types with no direct mapping (decimals, durations, ...), kept
    /// only for diagnostics.
    Other(String),
}

impl FieldValue {
    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::List(_) => "array",
            FieldValue::Nested(_) => "record",
            FieldValue::Other(_) => "unsupported logical type",
        }
    }
}

impl From<AvroValue> for FieldValue {
    fn from(value: AvroValue) -> Self {
        match value {
            AvroValue::Null => FieldValue::Null,
            AvroValue::Boolean(b) => FieldValue::Bool(b),
            AvroValue::Int(i) => FieldValue::Int(i64::from(i)),
            AvroValue::Long(l) => FieldValue::Int(l),
            AvroValue::Float(f) => FieldValue::Float(f64::from(f)),
            AvroValue::Double(d) => FieldValue::Float(d),
            AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => FieldValue::Bytes(b),
            AvroValue::String(s) | AvroValue::Enum(_, s) => FieldValue::Str(s),
            AvroValue::Union(_, inner) => FieldValue::from(*inner),
            AvroValue::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            AvroValue::Map(entries) => FieldValue::Nested(Record {
                fields: entries
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            }),
            AvroValue::Record(fields) => FieldValue::Nested(Record {
                fields: fields
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            }),
            AvroValue::Date(days) => FieldValue::Int(i64::from(days)),
            AvroValue::TimeMillis(ms) => FieldValue::Int(i64::from(ms)),
            AvroValue::TimeMicros(us) => FieldValue::Int(us),
            AvroValue::TimestampMillis(ms) | AvroValue::LocalTimestampMillis(ms) => {
                FieldValue::Int(ms)
            }
            AvroValue::TimestampMicros(us) | AvroValue::LocalTimestampMicros(us) => {
                FieldValue::Int(us)
            }
            other => FieldValue::Other(format!("{other:?}")),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Str(s) => write!(f, "{s:?}"),
            FieldValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            FieldValue::Nested(record) => write!(f, "{record}"),
            FieldValue::Other(s) => f.write_str(s),
        }
    }
}

/// Field name → value mapping for one logical record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Integer value of `name`; no coercion from other types.
    pub fn get_int(&self, name: &str) -> Result<i64, FieldError> {
        match self.fields.get(name) {
            Some(FieldValue::Int(i)) => Ok(*i),
            Some(other) => Err(FieldError::NotAnInteger {
                field: name.to_string(),
                found: other.kind(),
            }),
            None => Err(FieldError::Missing {
                field: name.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
