use std::fmt;
use std::path::PathBuf;

use crate::output::DestinationKind;
use crate::schema::ParamType;

/// Stage of the hook pipeline an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Pre,
    Post,
    Error,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Pre => write!(f, "pre"),
            HookStage::Post => write!(f, "post"),
            HookStage::Error => write!(f, "error"),
        }
    }
}

/// Unified error type for the bridges crate.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("missing required parameter '{0}'")]
    MissingRequiredParameter(String),

    #[error("invalid choice for parameter '{param}': {value}")]
    InvalidChoice {
        param: String,
        value: serde_json::Value,
    },

    #[error("type validation failed for parameter '{param}': expected {expected}, got {actual}")]
    TypeValidation {
        param: String,
        expected: ParamType,
        actual: &'static str,
    },

    #[error("validation failed for parameter '{param}': {reason}")]
    Validation { param: String, reason: String },

    #[error("source unavailable for parameter '{param}': {path}")]
    SourceUnavailable {
        param: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} hook failed for '{registration}': {message}")]
    Hook {
        stage: HookStage,
        registration: String,
        message: String,
    },

    #[error("execution of '{registration}' failed: {message}")]
    ExecutionFault {
        registration: String,
        message: String,
    },

    #[error("{kind} destination failed: {message}")]
    DestinationFailure {
        kind: DestinationKind,
        message: String,
    },

    #[error("duplicate registration '{0}'")]
    DuplicateRegistration(String),

    #[error("unknown registration '{0}'")]
    UnknownRegistration(String),

    #[error("duplicate bridge '{0}'")]
    DuplicateBridge(String),

    #[error("unknown bridge '{0}'")]
    UnknownBridge(String),

    #[error("duplicate instance '{0}'")]
    DuplicateInstance(String),

    #[error("unknown instance '{0}'")]
    UnknownInstance(String),

    #[error("history index {index} out of range (history has {len} snapshots)")]
    RangeError { index: usize, len: usize },
}

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;
