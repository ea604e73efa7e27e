//! Parameter specs: default/validation policy wrapped around a source.

use std::fmt;

use serde_json::Value;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::schema::{self, ParamType};
use crate::source::{ParamSource, SourceKind};

/// A default applied when the source yields no value.
///
/// Producers are evaluated lazily at resolution time against the current
/// context and are never memoized.
pub enum DefaultValue {
    Literal(Value),
    Producer(Box<dyn Fn(&Context) -> Value + Send + Sync>),
}

impl DefaultValue {
    fn evaluate(&self, context: &Context) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Producer(produce) => produce(context),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

type Validator = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// One parameter of a registration: a source plus type, default, and
/// validation policy. The parameter's name and position live on the
/// [`Registration`](crate::Registration).
pub struct ParameterSpec {
    source: Box<dyn ParamSource>,
    ty: ParamType,
    required: bool,
    description: Option<String>,
    default: Option<DefaultValue>,
    validator: Option<Validator>,
}

impl ParameterSpec {
    /// A parameter that must resolve to a value (or have a default).
    pub fn required(ty: ParamType, source: impl ParamSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            ty,
            required: true,
            description: None,
            default: None,
            validator: None,
        }
    }

    /// A parameter that resolves to JSON null when absent.
    pub fn optional(ty: ParamType, source: impl ParamSource + 'static) -> Self {
        Self {
            required: false,
            ..Self::required(ty, source)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Use `value` when the source yields nothing.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Evaluate `produce` against the current context when the source yields
    /// nothing.
    pub fn with_default_producer(
        mut self,
        produce: impl Fn(&Context) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::Producer(Box::new(produce)));
        self
    }

    /// Reject resolved values for which `predicate` returns false.
    pub fn with_validator(
        mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(predicate));
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn ty(&self) -> ParamType {
        self.ty
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.source.placeholder()
    }

    /// Resolve this parameter: source, then default, then required policy,
    /// then type coercion, then the validator.
    pub(crate) fn resolve(
        &self,
        param: &str,
        context: &Context,
        supplied: Option<&Value>,
    ) -> Result<Value> {
        let value = match self.source.resolve(param, context, supplied)? {
            Some(value) => value,
            None => match &self.default {
                Some(default) => default.evaluate(context),
                None if self.required => {
                    return Err(BridgeError::MissingRequiredParameter(param.to_string()))
                }
                // Absent optional parameters resolve to null and skip the
                // structural check and validator.
                None => return Ok(Value::Null),
            },
        };

        let value = schema::coerce(param, self.ty, value)?;

        if let Some(predicate) = &self.validator {
            if !predicate(&value) {
                return Err(BridgeError::Validation {
                    param: param.to_string(),
                    reason: format!("validator rejected value {value}"),
                });
            }
        }

        Ok(value)
    }
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("source", &self.source.kind())
            .field("ty", &self.ty)
            .field("required", &self.required)
            .field("description", &self.description)
            .field("default", &self.default)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}
