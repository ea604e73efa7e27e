//! A callable bound to ordered parameter specs and output destinations.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::output::OutputDestination;
use crate::param::ParameterSpec;
use crate::source::SourceKind;

/// Resolved parameters in declaration order, keyed by parameter name.
pub type ArgMap = IndexMap<String, Value>;

/// The underlying callable: resolved parameters in, result value out.
/// An `Err` is the callable's own fault message.
pub type Handler = Box<dyn Fn(&ArgMap) -> std::result::Result<Value, String> + Send + Sync>;

/// A named callable with its ordered parameter specs and output destinations.
///
/// Parameter order is the order of [`Registration::with_param`] calls; that
/// order is the authoritative signature order for resolution and for hook and
/// introspection consumers. Immutable once registered on a bridge.
pub struct Registration {
    name: String,
    description: String,
    params: Vec<(String, ParameterSpec)>,
    outputs: Vec<Box<dyn OutputDestination>>,
    handler: Handler,
}

impl Registration {
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&ArgMap) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            description: format!("Execute {name}"),
            name,
            params: Vec::new(),
            outputs: Vec::new(),
            handler: Box::new(handler),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a parameter in signature order. Re-declaring a name replaces
    /// the earlier spec without changing its position.
    pub fn with_param(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        let name = name.into();
        if let Some(slot) = self.params.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.params.push((name, spec));
        }
        self
    }

    /// Append an output destination in registration order.
    pub fn with_output(mut self, destination: impl OutputDestination + 'static) -> Self {
        self.outputs.push(Box::new(destination));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameters in signature order.
    pub fn params(&self) -> &[(String, ParameterSpec)] {
        &self.params
    }

    /// Destinations in registration order.
    pub fn outputs(&self) -> &[Box<dyn OutputDestination>] {
        &self.outputs
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Serializable metadata view handed to hooks and front ends.
    pub fn summary(&self) -> RegistrationSummary {
        RegistrationSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            params: self
                .params
                .iter()
                .map(|(name, spec)| ParamSummary {
                    name: name.clone(),
                    description: spec.description().map(str::to_string),
                    required: spec.is_required(),
                    has_default: spec.has_default(),
                    source: spec.source_kind(),
                    placeholder: spec.placeholder().map(str::to_string),
                })
                .collect(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

/// Introspection view of a registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSummary {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSummary>,
}

/// Introspection view of one parameter, in signature order.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSummary {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub has_default: bool,
    pub source: SourceKind,
    pub placeholder: Option<String>,
}
