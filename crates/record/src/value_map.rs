use crate::{RecordError, TimeSpan, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An immutable, ordered mapping from names to raw [`Value`]s with
/// type-coercing accessors.
///
/// Every request-data source (URL query, form body, cookies) is wrapped in
/// one of these, giving otherwise untyped text a uniform read API. Insertion
/// order is preserved and observable through the ordinal lookups. Duplicate
/// names keep every entry positionally; by-name lookup resolves to the first
/// occurrence.
///
/// Strict accessors fail with [`RecordError::UndefinedValue`] when the name
/// is absent and [`RecordError::InvalidFormat`] when the raw value cannot be
/// coerced. Nullable accessors return `None` for a null raw value (and, for
/// the scalar kinds, an empty string) but still fail on a wholly absent name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap {
    values: Vec<Value>,
    names: Vec<String>,
    ordinals: HashMap<String, usize>,
}

impl ValueMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<Value>,
    {
        let mut map = Self::default();

        for (name, value) in pairs {
            map.push(name.into(), value.into());
        }

        map
    }

    pub fn from_values_names(values: Vec<Value>, names: Vec<String>) -> Result<Self, RecordError> {
        if values.len() != names.len() {
            return Err(RecordError::logic("number of names must match number of values"));
        }

        let mut map = Self::default();

        for (name, value) in names.into_iter().zip(values) {
            map.push(name, value);
        }

        Ok(map)
    }

    fn push(&mut self, name: String, value: Value) {
        let ordinal = self.values.len();
        self.values.push(value);
        self.ordinals.entry(name.clone()).or_insert(ordinal);
        self.names.push(name);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True only if every given name is present.
    pub fn contains(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.ordinals.contains_key(*name))
    }

    pub fn get_raw(&self, name: &str) -> Result<&Value, RecordError> {
        self.ordinals
            .get(name)
            .map(|&ordinal| &self.values[ordinal])
            .ok_or_else(|| RecordError::undefined_value(name))
    }

    pub fn raw_at(&self, ordinal: usize) -> Result<&Value, RecordError> {
        self.values
            .get(ordinal)
            .ok_or_else(|| RecordError::undefined_value(ordinal))
    }

    pub fn name(&self, ordinal: usize) -> Result<&str, RecordError> {
        self.names
            .get(ordinal)
            .map(String::as_str)
            .ok_or_else(|| RecordError::undefined_value(ordinal))
    }

    pub fn ordinal(&self, name: &str) -> Result<usize, RecordError> {
        self.ordinals
            .get(name)
            .copied()
            .ok_or_else(|| RecordError::undefined_value(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    /// The untouched backing values, round-trip identical with construction.
    pub fn to_pairs(&self) -> Vec<(String, Value)> {
        self.names.iter().cloned().zip(self.values.iter().cloned()).collect()
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, RecordError> {
        parse_bool(self.get_raw(name)?)
    }

    pub fn get_int(&self, name: &str) -> Result<i64, RecordError> {
        parse_int(self.get_raw(name)?)
    }

    pub fn get_float(&self, name: &str) -> Result<f64, RecordError> {
        parse_float(self.get_raw(name)?)
    }

    pub fn get_string(&self, name: &str) -> Result<String, RecordError> {
        parse_string(self.get_raw(name)?)
    }

    pub fn get_date_time(&self, name: &str) -> Result<NaiveDateTime, RecordError> {
        parse_date_time(self.get_raw(name)?, DEFAULT_DATETIME_FORMAT)
    }

    pub fn get_date_time_with_format(&self, name: &str, format: &str) -> Result<NaiveDateTime, RecordError> {
        parse_date_time(self.get_raw(name)?, format)
    }

    pub fn get_time_span(&self, name: &str) -> Result<TimeSpan, RecordError> {
        parse_time_span(self.get_raw(name)?)
    }

    pub fn get_uuid(&self, name: &str) -> Result<Uuid, RecordError> {
        parse_uuid(self.get_raw(name)?)
    }

    pub fn get_map(&self, name: &str) -> Result<&ValueMap, RecordError> {
        parse_map(self.get_raw(name)?)
    }

    pub fn get_object<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, RecordError> {
        parse_object(self.get_raw(name)?)
    }

    pub fn get_nullable_bool(&self, name: &str) -> Result<Option<bool>, RecordError> {
        self.nullable_scalar(name)?.map(parse_bool).transpose()
    }

    pub fn get_nullable_int(&self, name: &str) -> Result<Option<i64>, RecordError> {
        self.nullable_scalar(name)?.map(parse_int).transpose()
    }

    pub fn get_nullable_float(&self, name: &str) -> Result<Option<f64>, RecordError> {
        self.nullable_scalar(name)?.map(parse_float).transpose()
    }

    /// An empty string is still a string; only a null raw value maps to `None`.
    pub fn get_nullable_string(&self, name: &str) -> Result<Option<String>, RecordError> {
        self.nullable(name)?.map(parse_string).transpose()
    }

    pub fn get_nullable_date_time(&self, name: &str) -> Result<Option<NaiveDateTime>, RecordError> {
        self.nullable_scalar(name)?
            .map(|value| parse_date_time(value, DEFAULT_DATETIME_FORMAT))
            .transpose()
    }

    pub fn get_nullable_date_time_with_format(
        &self,
        name: &str,
        format: &str,
    ) -> Result<Option<NaiveDateTime>, RecordError> {
        self.nullable_scalar(name)?
            .map(|value| parse_date_time(value, format))
            .transpose()
    }

    pub fn get_nullable_time_span(&self, name: &str) -> Result<Option<TimeSpan>, RecordError> {
        self.nullable_scalar(name)?.map(parse_time_span).transpose()
    }

    pub fn get_nullable_uuid(&self, name: &str) -> Result<Option<Uuid>, RecordError> {
        self.nullable_scalar(name)?.map(parse_uuid).transpose()
    }

    pub fn get_nullable_map(&self, name: &str) -> Result<Option<&ValueMap>, RecordError> {
        self.nullable(name)?.map(parse_map).transpose()
    }

    pub fn get_nullable_object<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, RecordError> {
        self.nullable(name)?.map(parse_object).transpose()
    }

    /// Absence is not null: a missing name still fails with `UndefinedValue`.
    fn nullable(&self, name: &str) -> Result<Option<&Value>, RecordError> {
        match self.get_raw(name)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    /// Scalar kinds additionally treat an empty string as null.
    fn nullable_scalar(&self, name: &str) -> Result<Option<&Value>, RecordError> {
        match self.get_raw(name)? {
            Value::Null => Ok(None),
            Value::Str(s) if s.is_empty() => Ok(None),
            value => Ok(Some(value)),
        }
    }
}

fn cannot_convert(value: &Value, target: &str) -> RecordError {
    RecordError::invalid_format(format!(
        "cannot convert value of type {} to {}",
        value.type_name(),
        target
    ))
}

fn parse_bool(value: &Value) -> Result<bool, RecordError> {
    match value {
        Value::Bool(v) => Ok(*v),
        Value::Int(0) => Ok(false),
        Value::Int(1) => Ok(true),
        Value::Str(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            _ => Err(RecordError::invalid_format(format!("cannot parse '{s}' as a boolean"))),
        },
        other => Err(cannot_convert(other, "boolean")),
    }
}

fn parse_int(value: &Value) -> Result<i64, RecordError> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Float(v) => Ok(*v as i64),
        Value::Str(s) => {
            // no sign, no decimal point
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RecordError::invalid_format(format!("cannot parse '{s}' as an integer")));
            }

            s.parse()
                .map_err(|_| RecordError::invalid_format(format!("cannot parse '{s}' as an integer")))
        }
        other => Err(cannot_convert(other, "integer")),
    }
}

fn parse_float(value: &Value) -> Result<f64, RecordError> {
    match value {
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        Value::Str(s) => s
            .parse()
            .map_err(|_| RecordError::invalid_format(format!("cannot parse '{s}' as a float"))),
        other => Err(cannot_convert(other, "float")),
    }
}

fn parse_string(value: &Value) -> Result<String, RecordError> {
    match value {
        Value::Bool(v) => Ok(if *v { "1" } else { "0" }.to_owned()),
        Value::Str(s) => Ok(s.clone()),
        Value::Int(v) => Ok(v.to_string()),
        Value::Float(v) => Ok(v.to_string()),
        Value::Uuid(v) => Ok(v.to_string()),
        Value::TimeSpan(v) => Ok(v.to_string()),
        other => Err(cannot_convert(other, "string")),
    }
}

fn parse_date_time(value: &Value, format: &str) -> Result<NaiveDateTime, RecordError> {
    match value {
        Value::DateTime(v) => Ok(*v),
        Value::Int(v) => date_time_from_secs(*v),
        Value::Float(v) => date_time_from_secs_f64(*v),
        Value::Str(s) => {
            // numeric strings are unix timestamps
            if let Ok(seconds) = s.parse::<f64>() {
                return date_time_from_secs_f64(seconds);
            }

            // date-only formats fill in midnight
            NaiveDateTime::parse_from_str(s, format)
                .or_else(|_| NaiveDate::parse_from_str(s, format).map(|date| date.and_time(NaiveTime::MIN)))
                .map_err(|_| {
                    RecordError::invalid_format(format!(
                        "cannot parse '{s}' as a date/time using the format '{format}'"
                    ))
                })
        }
        other => Err(cannot_convert(other, "date/time")),
    }
}

fn date_time_from_secs(seconds: i64) -> Result<NaiveDateTime, RecordError> {
    DateTime::from_timestamp(seconds, 0)
        .map(|v| v.naive_utc())
        .ok_or_else(|| RecordError::invalid_format(format!("timestamp {seconds} is out of range")))
}

fn date_time_from_secs_f64(seconds: f64) -> Result<NaiveDateTime, RecordError> {
    if !seconds.is_finite() {
        return Err(RecordError::invalid_format("timestamp must be a finite number"));
    }

    DateTime::from_timestamp_micros((seconds * 1_000_000.0) as i64)
        .map(|v| v.naive_utc())
        .ok_or_else(|| RecordError::invalid_format(format!("timestamp {seconds} is out of range")))
}

fn parse_time_span(value: &Value) -> Result<TimeSpan, RecordError> {
    match value {
        Value::TimeSpan(v) => Ok(*v),
        Value::DateTime(v) => Ok(TimeSpan::from_date_time(v)),
        Value::Int(v) => {
            if *v < 0 {
                return Err(RecordError::invalid_format(format!(
                    "failed to convert '{v}' to time span: seconds must be greater than or equal to zero"
                )));
            }

            Ok(TimeSpan::from_secs(*v as u64))
        }
        Value::Float(v) => TimeSpan::from_secs_f64(*v)
            .map_err(|e| RecordError::invalid_format(format!("failed to convert '{v}' to time span: {e}"))),
        Value::Str(s) => {
            // numeric strings are counts of seconds
            if let Ok(seconds) = s.parse::<f64>() {
                return TimeSpan::from_secs_f64(seconds).map_err(|e| {
                    RecordError::invalid_format(format!("failed to convert '{s}' to time span: {e}"))
                });
            }

            s.parse()
        }
        other => Err(cannot_convert(other, "time span")),
    }
}

fn parse_uuid(value: &Value) -> Result<Uuid, RecordError> {
    match value {
        Value::Uuid(v) => Ok(*v),
        Value::Int(v) => {
            if *v < 0 {
                return Err(RecordError::invalid_format(format!("cannot parse '{v}' as a UUID")));
            }

            Ok(Uuid::from_u128(*v as u128))
        }
        Value::Str(s) => {
            // a 16-byte string is raw UUID bytes, anything else is canonical text
            let result = if s.len() == 16 {
                Uuid::from_slice(s.as_bytes())
            } else {
                Uuid::parse_str(s)
            };

            result.map_err(|e| RecordError::invalid_format(format!("cannot parse '{s}' as a UUID: {e}")))
        }
        other => Err(cannot_convert(other, "uuid")),
    }
}

fn parse_map(value: &Value) -> Result<&ValueMap, RecordError> {
    match value {
        Value::Map(map) => Ok(map),
        other => Err(cannot_convert(other, "map")),
    }
}

fn parse_object<T: Any + Send + Sync>(value: &Value) -> Result<Arc<T>, RecordError> {
    match value {
        Value::Object(object) => Arc::clone(object).downcast().map_err(|_| {
            RecordError::invalid_format(format!(
                "cannot convert object to {}",
                std::any::type_name::<T>()
            ))
        }),
        other => Err(cannot_convert(other, "object")),
    }
}
