//! Structural value types and coercion for resolved parameters.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Declared structural type of a parameter.
///
/// Front ends deliver overrides as text, so [`coerce`] parses strings into
/// the integer/number/boolean shapes before the structural check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// No structural constraint.
    Any,
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Any => "any",
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        };
        write!(f, "{name}")
    }
}

/// Coerce `value` toward `ty`, then check the structural type.
///
/// String inputs parse into integers, numbers, and booleans where the
/// declared type asks for one; booleans additionally accept the usual textual
/// spellings ("true"/"false", "yes"/"no", "1"/"0"). Anything that still does
/// not match fails with [`BridgeError::TypeValidation`].
pub fn coerce(param: &str, ty: ParamType, value: Value) -> Result<Value> {
    let value = match (ty, value) {
        (ParamType::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(s),
        },
        (ParamType::Number, Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::String(s)),
            Err(_) => Value::String(s),
        },
        (ParamType::Boolean, Value::String(s)) => {
            let lowered = s.trim().to_lowercase();
            match lowered.as_str() {
                "true" | "yes" | "y" | "1" => Value::Bool(true),
                "false" | "no" | "n" | "0" => Value::Bool(false),
                _ => Value::String(s),
            }
        }
        (_, value) => value,
    };

    if ty.matches(&value) {
        Ok(value)
    } else {
        Err(BridgeError::TypeValidation {
            param: param.to_string(),
            expected: ty,
            actual: json_type_name(&value),
        })
    }
}

/// Human-readable name for the JSON type of a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a value for display: strings appear bare, everything else as JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
