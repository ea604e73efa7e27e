//! Parameter sources: strategies for producing a parameter's raw value.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::schema::{self, ParamType};

/// Variant tag for a parameter source, used by introspection so front ends
/// know how to collect the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    DirectInput,
    MenuSelection,
    DelimitedList,
    FileContent,
    ContextLookup,
    Custom,
}

/// Strategy for producing a parameter's raw value.
///
/// Given the current context and any caller-supplied override, a source
/// produces a raw value or `None` to signal that no value is available (the
/// parameter spec then applies its default/required policy).
pub trait ParamSource: Send + Sync {
    /// Variant tag for introspection. Custom implementations keep the default.
    fn kind(&self) -> SourceKind {
        SourceKind::Custom
    }

    /// Placeholder text surfaced to prompting front ends, if any.
    fn placeholder(&self) -> Option<&str> {
        None
    }

    /// Resolve the raw value for parameter `param`.
    fn resolve(&self, param: &str, context: &Context, supplied: Option<&Value>)
        -> Result<Option<Value>>;
}

/// Passes the caller-supplied override through unchanged.
#[derive(Debug, Clone, Default)]
pub struct DirectInput {
    placeholder: Option<String>,
}

impl DirectInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach placeholder text for prompting front ends.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

impl ParamSource for DirectInput {
    fn kind(&self) -> SourceKind {
        SourceKind::DirectInput
    }

    fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    fn resolve(
        &self,
        _param: &str,
        _context: &Context,
        supplied: Option<&Value>,
    ) -> Result<Option<Value>> {
        Ok(supplied.cloned())
    }
}

/// One selectable choice of a [`MenuSelection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuChoice {
    pub label: String,
    pub value: Value,
}

/// Accepts only values drawn from a fixed, ordered set of choices.
#[derive(Debug, Clone)]
pub struct MenuSelection {
    choices: Vec<MenuChoice>,
}

impl MenuSelection {
    /// Build from plain values; labels default to each value's rendering.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            choices: values
                .into_iter()
                .map(|value| MenuChoice {
                    label: schema::render(&value),
                    value,
                })
                .collect(),
        }
    }

    /// Build from explicit (label, value) pairs.
    pub fn labeled(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            choices: pairs
                .into_iter()
                .map(|(label, value)| MenuChoice { label, value })
                .collect(),
        }
    }

    /// The ordered set of allowed choices.
    pub fn choices(&self) -> &[MenuChoice] {
        &self.choices
    }
}

impl ParamSource for MenuSelection {
    fn kind(&self) -> SourceKind {
        SourceKind::MenuSelection
    }

    fn resolve(
        &self,
        param: &str,
        _context: &Context,
        supplied: Option<&Value>,
    ) -> Result<Option<Value>> {
        match supplied {
            None => Ok(None),
            Some(value) => {
                if self.choices.iter().any(|c| c.value == *value) {
                    Ok(Some(value.clone()))
                } else {
                    Err(BridgeError::InvalidChoice {
                        param: param.to_string(),
                        value: value.clone(),
                    })
                }
            }
        }
    }
}

/// Splits a string override on a separator into an ordered sequence.
///
/// Overrides that are already arrays pass through unchanged. An empty string
/// yields an empty sequence, not absence.
#[derive(Debug, Clone)]
pub struct DelimitedList {
    separator: String,
}

impl Default for DelimitedList {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
        }
    }
}

impl DelimitedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl ParamSource for DelimitedList {
    fn kind(&self) -> SourceKind {
        SourceKind::DelimitedList
    }

    fn resolve(
        &self,
        param: &str,
        _context: &Context,
        supplied: Option<&Value>,
    ) -> Result<Option<Value>> {
        match supplied {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(Value::Array(items.clone()))),
            Some(Value::String(s)) if s.is_empty() => Ok(Some(Value::Array(Vec::new()))),
            Some(Value::String(s)) => Ok(Some(Value::Array(
                s.split(self.separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ))),
            Some(other) => Err(BridgeError::TypeValidation {
                param: param.to_string(),
                expected: ParamType::Array,
                actual: schema::json_type_name(other),
            }),
        }
    }
}

/// Reads the full content of a file as the parameter value.
///
/// The override is treated as the path; a fixed path may be configured
/// instead. Unreadable or missing paths fail, never yielding partial content.
#[derive(Debug, Clone, Default)]
pub struct FileContent {
    path: Option<PathBuf>,
}

impl FileContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always read from `path`, ignoring overrides.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl ParamSource for FileContent {
    fn kind(&self) -> SourceKind {
        SourceKind::FileContent
    }

    fn resolve(
        &self,
        param: &str,
        _context: &Context,
        supplied: Option<&Value>,
    ) -> Result<Option<Value>> {
        let path = match (&self.path, supplied) {
            (Some(path), _) => path.clone(),
            (None, Some(Value::String(s))) => PathBuf::from(s),
            (None, Some(other)) => {
                return Err(BridgeError::TypeValidation {
                    param: param.to_string(),
                    expected: ParamType::String,
                    actual: schema::json_type_name(other),
                })
            }
            (None, None) => return Ok(None),
        };
        let content = fs::read_to_string(&path).map_err(|source| BridgeError::SourceUnavailable {
            param: param.to_string(),
            path,
            source,
        })?;
        Ok(Some(Value::String(content)))
    }
}

/// Looks the value up in the bridge context under a configured key.
///
/// Caller overrides are ignored; an absent key signals absence.
#[derive(Debug, Clone)]
pub struct ContextLookup {
    key: String,
}

impl ContextLookup {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ParamSource for ContextLookup {
    fn kind(&self) -> SourceKind {
        SourceKind::ContextLookup
    }

    fn resolve(
        &self,
        _param: &str,
        context: &Context,
        _supplied: Option<&Value>,
    ) -> Result<Option<Value>> {
        Ok(context.get(&self.key).cloned())
    }
}
