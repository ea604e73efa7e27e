//! Typed, introspectable invocation core.
//!
//! This crate lets arbitrary callable units be exposed as named, typed
//! operations that any front end (CLI, web, API) can invoke uniformly:
//! - Parameters are resolved from pluggable sources (direct input, menu
//!   selection, delimited lists, file content, context lookup), defaulted,
//!   coerced, and validated.
//! - Results are fanned out to pluggable destinations (display formatting,
//!   file write, context store) on a best-effort basis.
//! - Each [`Bridge`] owns a key/value [`Context`] with full snapshot history,
//!   plus ordered pre/post/error hook lists around execution.
//! - A [`BridgeRegistry`] holds multiple bridges with one active selection and
//!   supports independently-named instances with isolated contexts.
//!
//! The core is synchronous and in-memory; interactive front ends consume the
//! introspection summaries and the invocation surface, they are not part of
//! this crate.

pub mod bridge;
pub mod context;
pub mod error;
pub mod output;
pub mod param;
pub mod registration;
pub mod registry;
pub mod schema;
pub mod source;

pub use bridge::{Bridge, ErrorHook, InvocationOutcome, InvocationResult, PostHook, PreHook};
pub use context::{Context, ContextMap};
pub use error::{BridgeError, HookStage, Result};
pub use output::{
    ContextStore, DestinationKind, DestinationOutcome, Display, FileWrite, OutputDestination,
};
pub use param::{DefaultValue, ParameterSpec};
pub use registration::{ArgMap, ParamSummary, Registration, RegistrationSummary};
pub use registry::BridgeRegistry;
pub use schema::ParamType;
pub use source::{
    ContextLookup, DelimitedList, DirectInput, FileContent, MenuChoice, MenuSelection, ParamSource,
    SourceKind,
};
