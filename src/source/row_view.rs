use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::constants::decode::NESTED_SEPARATOR;
use crate::types::FieldName;
use crate::utils::parse_finite;

/// One raw input value before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// Text as produced by CSV parsing or a JSON string.
    Text(String),
    /// A JSON number.
    Number(f64),
    /// A JSON boolean.
    Bool(bool),
    /// A JSON null or an explicitly missing cell.
    Null,
}

impl RawValue {
    /// True when the value carries nothing usable (null or whitespace-only text).
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(text) => text.trim().is_empty(),
            RawValue::Number(_) | RawValue::Bool(_) => false,
        }
    }

    /// Render the value as text, if it is not null.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawValue::Text(text) => Some(Cow::Borrowed(text.as_str())),
            RawValue::Number(value) => Some(Cow::Owned(value.to_string())),
            RawValue::Bool(value) => Some(Cow::Owned(value.to_string())),
            RawValue::Null => None,
        }
    }

    /// Coerce to a finite number using standard decimal parsing.
    ///
    /// Text that does not parse to a finite number is absent, never zero.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(value) if value.is_finite() => Some(*value),
            RawValue::Text(text) => parse_finite(text),
            RawValue::Number(_) | RawValue::Bool(_) | RawValue::Null => None,
        }
    }

    /// Convert a JSON scalar. Objects and arrays have no scalar form and map to `Null`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(text) => RawValue::Text(text.clone()),
            Value::Number(number) => number.as_f64().map_or(RawValue::Null, RawValue::Number),
            Value::Bool(flag) => RawValue::Bool(*flag),
            Value::Null | Value::Object(_) | Value::Array(_) => RawValue::Null,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// A named field in a raw row.
#[derive(Clone, Debug, PartialEq)]
pub struct RawField {
    /// Field name as it appeared in the input (CSV header or dotted JSON path).
    pub name: FieldName,
    /// Field value.
    pub value: RawValue,
}

/// Source-agnostic row contract shared by CSV and JSON inputs.
///
/// Field order follows the input; duplicate names keep the first occurrence
/// for lookups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<RawField>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row of text values from `(name, value)` pairs.
    pub fn from_text_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = Self::new();
        for (name, value) in pairs {
            row.push(name, value);
        }
        row
    }

    /// Flatten a JSON object into a row.
    ///
    /// Nested objects become dotted field names (`location.lat`). Arrays are
    /// skipped; callers that care about array content expand it beforehand.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut row = Self::new();
        row.extend_from_json(None, object);
        row
    }

    fn extend_from_json(&mut self, prefix: Option<&str>, object: &Map<String, Value>) {
        for (key, value) in object {
            let name = match prefix {
                Some(prefix) => format!("{prefix}{NESTED_SEPARATOR}{key}"),
                None => key.clone(),
            };
            match value {
                Value::Object(nested) => self.extend_from_json(Some(&name), nested),
                Value::Array(_) => {}
                scalar => self.push(name, RawValue::from_json(scalar)),
            }
        }
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<FieldName>, value: impl Into<RawValue>) {
        self.fields.push(RawField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Builder-style [`push`](Self::push).
    pub fn with_field(mut self, name: impl Into<FieldName>, value: impl Into<RawValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append `name` only when no field of that name (ignoring ASCII case) exists.
    pub fn push_if_absent(&mut self, name: &str, value: impl Into<RawValue>) {
        if !self.contains(name) {
            self.push(name, value);
        }
    }

    /// True if a field named `name` exists, ignoring ASCII case.
    pub fn contains(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Iterate `(name, value)` pairs in input order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), &field.value))
    }

    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
