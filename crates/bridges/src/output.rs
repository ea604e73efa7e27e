//! Output destinations: strategies for consuming an invocation result.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::error::{BridgeError, Result};
use crate::schema;

/// Variant tag for a destination, used in per-destination outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    Display,
    FileWrite,
    ContextStore,
    Custom,
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DestinationKind::Display => "display",
            DestinationKind::FileWrite => "file_write",
            DestinationKind::ContextStore => "context_store",
            DestinationKind::Custom => "custom",
        };
        write!(f, "{name}")
    }
}

/// Strategy for consuming one invocation result.
///
/// A destination performs a side effect against the result and context and
/// may return a rendered string (the display variant does) for the front end
/// to present.
pub trait OutputDestination: Send + Sync {
    /// Variant tag for outcomes. Custom implementations keep the default.
    fn kind(&self) -> DestinationKind {
        DestinationKind::Custom
    }

    /// Consume `value`, optionally mutating `context` or returning rendered
    /// text.
    fn send(&self, value: &Value, context: &mut Context) -> Result<Option<String>>;
}

/// Renders the result through a format template for presentation.
///
/// The template references the result as `{value}`; strings render bare,
/// other values as JSON.
#[derive(Debug, Clone)]
pub struct Display {
    format: String,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            format: "{value}".to_string(),
        }
    }
}

impl Display {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl OutputDestination for Display {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Display
    }

    fn send(&self, value: &Value, _context: &mut Context) -> Result<Option<String>> {
        Ok(Some(self.format.replace("{value}", &schema::render(value))))
    }
}

/// Writes the rendered result to a file, replacing previous content.
#[derive(Debug, Clone)]
pub struct FileWrite {
    path: PathBuf,
}

impl FileWrite {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputDestination for FileWrite {
    fn kind(&self) -> DestinationKind {
        DestinationKind::FileWrite
    }

    fn send(&self, value: &Value, _context: &mut Context) -> Result<Option<String>> {
        fs::write(&self.path, schema::render(value)).map_err(|e| BridgeError::DestinationFailure {
            kind: DestinationKind::FileWrite,
            message: format!("{}: {e}", self.path.display()),
        })?;
        Ok(None)
    }
}

/// Stores the result in the context under a configured key.
///
/// This is the one built-in destination that mutates context, so the store
/// snapshots once per dispatch.
#[derive(Debug, Clone)]
pub struct ContextStore {
    key: String,
}

impl ContextStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl OutputDestination for ContextStore {
    fn kind(&self) -> DestinationKind {
        DestinationKind::ContextStore
    }

    fn send(&self, value: &Value, context: &mut Context) -> Result<Option<String>> {
        context.update(self.key.clone(), value.clone());
        Ok(None)
    }
}

/// Outcome of handing the result to one destination during dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct DestinationOutcome {
    /// Position of the destination in registration order.
    pub index: usize,
    pub kind: DestinationKind,
    /// Rendered text, when the destination produced any.
    pub rendered: Option<String>,
    /// Failure message, when the destination failed.
    pub error: Option<String>,
}

impl DestinationOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
