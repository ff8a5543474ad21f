//! Form schemas
//!
//! A [`Schema`] is the declarative description of a form: an ordered list of
//! typed fields with optional defaults. The frontend renders it; the flow
//! manager uses it to validate and coerce what the user submits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::SchemaError;

/// Type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    /// One value out of [`FormField::options`]
    Select,
}

impl FieldType {
    fn expected(self) -> &'static str {
        match self {
            FieldType::String => "str",
            FieldType::Integer => "int",
            FieldType::Select => "one of the options",
        }
    }
}

/// Form field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// `[value, label]` pairs for select fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<(String, String)>,
    /// Smallest accepted value for integer fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
}

impl FormField {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            default: None,
            options: Vec::new(),
            min: None,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_options<V, L>(mut self, options: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<String>,
        L: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(value, label)| (value.into(), label.into()))
            .collect();
        self
    }

    pub fn with_min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Coerce a submitted value to this field's type
    fn coerce(&self, value: &Value) -> Result<Value, SchemaError> {
        let invalid = || SchemaError::InvalidType {
            field: self.name.clone(),
            expected: self.field_type.expected(),
        };

        match self.field_type {
            FieldType::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                _ => Err(invalid()),
            },
            FieldType::Integer => {
                // Numbers and numeric strings share the i64 range
                let number = match value {
                    Value::Number(n) => n.as_i64().ok_or_else(invalid)?,
                    Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(invalid()),
                };
                match self.min {
                    Some(min) if number < min => Err(SchemaError::OutOfRange {
                        field: self.name.clone(),
                        value: number,
                        min,
                    }),
                    _ => Ok(Value::from(number)),
                }
            }
            FieldType::Select => {
                let choice = value.as_str().ok_or_else(invalid)?;
                if self.options.iter().any(|(option, _)| option == choice) {
                    Ok(value.clone())
                } else {
                    Err(SchemaError::InvalidChoice {
                        field: self.name.clone(),
                        value: choice.to_string(),
                    })
                }
            }
        }
    }
}

/// An ordered list of form fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FormField>,
}

impl Schema {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate submitted input, filling in defaults for missing fields.
    ///
    /// Keys not declared by the schema are rejected.
    pub fn validate(&self, input: &Value) -> Result<UserInput, SchemaError> {
        let submitted = input.as_object().ok_or(SchemaError::NotAnObject)?;

        if let Some(extra) = submitted.keys().find(|key| self.field(key).is_none()) {
            return Err(SchemaError::ExtraField(extra.clone()));
        }

        let mut values = HashMap::new();
        for field in &self.fields {
            match submitted.get(&field.name).or(field.default.as_ref()) {
                Some(value) => {
                    values.insert(field.name.clone(), field.coerce(value)?);
                }
                None if field.required => {
                    return Err(SchemaError::MissingField(field.name.clone()));
                }
                None => {}
            }
        }

        Ok(UserInput(values))
    }
}

/// Validated user input for a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInput(HashMap<String, Value>);

impl UserInput {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Read a validated non-negative integer, failing instead of guessing
    pub fn require_u64(&self, key: &str) -> Result<u64, SchemaError> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| SchemaError::MissingField(key.to_string()))?;
        value.as_u64().ok_or_else(|| SchemaError::InvalidType {
            field: key.to_string(),
            expected: "non-negative int",
        })
    }

    pub fn into_inner(self) -> HashMap<String, Value> {
        self.0
    }
}

impl From<HashMap<String, Value>> for UserInput {
    fn from(values: HashMap<String, Value>) -> Self {
        Self(values)
    }
}
