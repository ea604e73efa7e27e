//! Bridge: named registry of registrations orchestrating the invoke pipeline.

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::Context;
use crate::error::{BridgeError, HookStage, Result};
use crate::output::DestinationOutcome;
use crate::registration::{ArgMap, Registration, RegistrationSummary};

/// Runs before execution with the resolved parameters and the registration
/// metadata. An `Err` aborts the invocation.
pub type PreHook = Box<dyn Fn(&ArgMap, &RegistrationSummary) -> Result<()> + Send + Sync>;

/// Runs after successful execution with the result and the registration
/// metadata. An `Err` aborts before dispatch.
pub type PostHook = Box<dyn Fn(&Value, &RegistrationSummary) -> Result<()> + Send + Sync>;

/// Runs when execution faults, with the fault and the registration metadata.
/// Failures are logged and swallowed, never re-raised.
pub type ErrorHook = Box<dyn Fn(&BridgeError, &RegistrationSummary) -> Result<()> + Send + Sync>;

/// How an invocation ended: the callable's value, or its fault.
#[derive(Debug)]
pub enum InvocationOutcome {
    Success(Value),
    Fault(BridgeError),
}

/// Result of one invocation: the outcome plus per-destination dispatch
/// outcomes in registration order (empty when dispatch was skipped).
#[derive(Debug)]
pub struct InvocationResult {
    pub outcome: InvocationOutcome,
    pub destinations: Vec<DestinationOutcome>,
}

impl InvocationResult {
    /// The result value, when execution succeeded.
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            InvocationOutcome::Success(value) => Some(value),
            InvocationOutcome::Fault(_) => None,
        }
    }

    /// The execution fault, when the callable failed.
    pub fn fault(&self) -> Option<&BridgeError> {
        match &self.outcome {
            InvocationOutcome::Success(_) => None,
            InvocationOutcome::Fault(fault) => Some(fault),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Success(_))
    }

    /// True when execution succeeded but at least one destination failed.
    pub fn is_partial(&self) -> bool {
        self.is_success() && self.destinations.iter().any(|d| !d.succeeded())
    }
}

/// A named registry of registrations sharing one context.
///
/// Invocations run synchronously through a fixed pipeline: resolve
/// parameters, run pre-hooks, execute the callable, run post-hooks (or error
/// hooks on fault), then dispatch the result to each destination
/// best-effort. Instance invocations run the same pipeline against an
/// isolated per-instance context while sharing registrations and hooks.
pub struct Bridge {
    name: String,
    version: String,
    registrations: IndexMap<String, Registration>,
    context: Context,
    instances: IndexMap<String, Context>,
    pre_hooks: Vec<PreHook>,
    post_hooks: Vec<PostHook>,
    error_hooks: Vec<ErrorHook>,
}

impl Bridge {
    /// Create a named bridge with an empty context and no registrations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            registrations: IndexMap::new(),
            context: Context::new(),
            instances: IndexMap::new(),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            error_hooks: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Register a callable. Fails with
    /// [`BridgeError::DuplicateRegistration`] on a name collision.
    pub fn register(&mut self, registration: Registration) -> Result<()> {
        let name = registration.name().to_string();
        if self.registrations.contains_key(&name) {
            return Err(BridgeError::DuplicateRegistration(name));
        }
        tracing::debug!(bridge = %self.name, registration = %name, "registered");
        self.registrations.insert(name, registration);
        Ok(())
    }

    /// Registration names in registration order.
    pub fn registration_names(&self) -> Vec<&str> {
        self.registrations.keys().map(String::as_str).collect()
    }

    pub fn registration(&self, name: &str) -> Option<&Registration> {
        self.registrations.get(name)
    }

    /// Introspection summaries for every registration, in registration order.
    pub fn summaries(&self) -> Vec<RegistrationSummary> {
        self.registrations.values().map(Registration::summary).collect()
    }

    pub fn add_pre_hook(
        &mut self,
        hook: impl Fn(&ArgMap, &RegistrationSummary) -> Result<()> + Send + Sync + 'static,
    ) {
        self.pre_hooks.push(Box::new(hook));
    }

    pub fn add_post_hook(
        &mut self,
        hook: impl Fn(&Value, &RegistrationSummary) -> Result<()> + Send + Sync + 'static,
    ) {
        self.post_hooks.push(Box::new(hook));
    }

    pub fn add_error_hook(
        &mut self,
        hook: impl Fn(&BridgeError, &RegistrationSummary) -> Result<()> + Send + Sync + 'static,
    ) {
        self.error_hooks.push(Box::new(hook));
    }

    /// The bridge-owned context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the bridge-owned context (update, clear, restore).
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Create a named instance with a fresh, isolated context.
    pub fn create_instance(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.instances.contains_key(&name) {
            return Err(BridgeError::DuplicateInstance(name));
        }
        self.instances.insert(name, Context::new());
        Ok(())
    }

    /// Instance names in creation order.
    pub fn instance_names(&self) -> Vec<&str> {
        self.instances.keys().map(String::as_str).collect()
    }

    pub fn instance_context(&self, instance: &str) -> Result<&Context> {
        self.instances
            .get(instance)
            .ok_or_else(|| BridgeError::UnknownInstance(instance.to_string()))
    }

    /// Invoke a registration against the bridge context.
    ///
    /// Returns `Err` for failures that abort before the callable runs
    /// (unknown registration, resolution, hook errors); otherwise
    /// `Ok(InvocationResult)` carrying the value or the execution fault plus
    /// per-destination outcomes.
    pub fn invoke(&mut self, name: &str, overrides: &ArgMap) -> Result<InvocationResult> {
        let registration = self
            .registrations
            .get(name)
            .ok_or_else(|| BridgeError::UnknownRegistration(name.to_string()))?;
        run_pipeline(
            registration,
            &self.pre_hooks,
            &self.post_hooks,
            &self.error_hooks,
            &mut self.context,
            overrides,
        )
    }

    /// Invoke a registration against a named instance's isolated context.
    pub fn invoke_on(
        &mut self,
        instance: &str,
        name: &str,
        overrides: &ArgMap,
    ) -> Result<InvocationResult> {
        let registration = self
            .registrations
            .get(name)
            .ok_or_else(|| BridgeError::UnknownRegistration(name.to_string()))?;
        let context = self
            .instances
            .get_mut(instance)
            .ok_or_else(|| BridgeError::UnknownInstance(instance.to_string()))?;
        run_pipeline(
            registration,
            &self.pre_hooks,
            &self.post_hooks,
            &self.error_hooks,
            context,
            overrides,
        )
    }
}

/// The invocation pipeline: Resolving → PreHooks → Executing →
/// {PostHooks | ErrorHooks} → Dispatching.
///
/// Resolution is all-or-nothing: any parameter failure returns before the
/// callable runs, with the context untouched. Dispatch is best-effort: a
/// destination failure is recorded and the remaining destinations still run.
fn run_pipeline(
    registration: &Registration,
    pre_hooks: &[PreHook],
    post_hooks: &[PostHook],
    error_hooks: &[ErrorHook],
    context: &mut Context,
    overrides: &ArgMap,
) -> Result<InvocationResult> {
    let summary = registration.summary();
    let name = registration.name();

    tracing::debug!(registration = %name, "resolving parameters");
    let mut args = ArgMap::new();
    for (param, spec) in registration.params() {
        let value = spec.resolve(param, context, overrides.get(param))?;
        args.insert(param.clone(), value);
    }

    for hook in pre_hooks {
        hook(&args, &summary).map_err(|e| BridgeError::Hook {
            stage: HookStage::Pre,
            registration: name.to_string(),
            message: e.to_string(),
        })?;
    }

    tracing::debug!(registration = %name, "executing");
    let value = match (registration.handler())(&args) {
        Ok(value) => value,
        Err(message) => {
            let fault = BridgeError::ExecutionFault {
                registration: name.to_string(),
                message,
            };
            for hook in error_hooks {
                if let Err(e) = hook(&fault, &summary) {
                    tracing::warn!(registration = %name, error = %e, "error hook failed");
                }
            }
            return Ok(InvocationResult {
                outcome: InvocationOutcome::Fault(fault),
                destinations: Vec::new(),
            });
        }
    };

    for hook in post_hooks {
        hook(&value, &summary).map_err(|e| BridgeError::Hook {
            stage: HookStage::Post,
            registration: name.to_string(),
            message: e.to_string(),
        })?;
    }

    tracing::debug!(registration = %name, "dispatching");
    let mut destinations = Vec::with_capacity(registration.outputs().len());
    for (index, destination) in registration.outputs().iter().enumerate() {
        match destination.send(&value, context) {
            Ok(rendered) => destinations.push(DestinationOutcome {
                index,
                kind: destination.kind(),
                rendered,
                error: None,
            }),
            Err(e) => {
                tracing::warn!(registration = %name, index, error = %e, "destination failed");
                destinations.push(DestinationOutcome {
                    index,
                    kind: destination.kind(),
                    rendered: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(InvocationResult {
        outcome: InvocationOutcome::Success(value),
        destinations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ContextStore, Display, FileWrite, OutputDestination};
    use crate::param::ParameterSpec;
    use crate::schema::ParamType;
    use crate::source::{ContextLookup, DirectInput, MenuSelection};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn overrides(pairs: &[(&str, Value)]) -> ArgMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn int_param() -> ParameterSpec {
        ParameterSpec::required(ParamType::Integer, DirectInput::new())
    }

    fn add_registration() -> Registration {
        Registration::new("add", |args| {
            let a = args["a"].as_i64().ok_or("a is not an integer")?;
            let b = args["b"].as_i64().ok_or("b is not an integer")?;
            Ok(json!(a + b))
        })
        .with_param("a", int_param())
        .with_param("b", int_param())
    }

    #[test]
    fn add_scenario_with_display_destination() {
        let mut bridge = Bridge::new("calc");
        bridge
            .register(add_registration().with_output(Display::new("Result: {value}")))
            .unwrap();

        let result = bridge
            .invoke("add", &overrides(&[("a", json!("2")), ("b", json!("3"))]))
            .unwrap();

        assert_eq!(result.value(), Some(&json!(5)));
        assert_eq!(result.destinations.len(), 1);
        assert_eq!(
            result.destinations[0].rendered.as_deref(),
            Some("Result: 5")
        );
        assert!(!result.is_partial());
    }

    #[test]
    fn context_store_scenario_grows_history_by_one() {
        let mut bridge = Bridge::new("calc");
        bridge
            .register(add_registration().with_output(ContextStore::new("last_result")))
            .unwrap();

        let before = bridge.context().history().len();
        bridge
            .invoke("add", &overrides(&[("a", json!(2)), ("b", json!(3))]))
            .unwrap();

        assert_eq!(bridge.context().get("last_result"), Some(&json!(5)));
        assert_eq!(bridge.context().history().len(), before + 1);
    }

    #[test]
    fn unknown_registration_fails() {
        let mut bridge = Bridge::new("b");
        let err = bridge.invoke("missing", &ArgMap::new()).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownRegistration(name) if name == "missing"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut bridge = Bridge::new("b");
        bridge.register(add_registration()).unwrap();
        let err = bridge.register(add_registration()).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateRegistration(name) if name == "add"));
    }

    #[test]
    fn missing_required_aborts_before_callable_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mut bridge = Bridge::new("b");
        bridge
            .register(
                Registration::new("f", move |_args| {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(null))
                })
                .with_param("a", int_param())
                .with_output(ContextStore::new("out")),
            )
            .unwrap();

        let err = bridge.invoke("f", &ArgMap::new()).unwrap_err();
        assert!(matches!(err, BridgeError::MissingRequiredParameter(name) if name == "a"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // Context untouched by the failed attempt.
        assert!(bridge.context().history().is_empty());
    }

    #[test]
    fn resolution_order_is_declaration_order() {
        let mut bridge = Bridge::new("b");
        bridge
            .register(
                Registration::new("f", |args| {
                    let order: Vec<_> = args.keys().cloned().collect();
                    Ok(json!(order))
                })
                .with_param("first", int_param().with_default(json!(1)))
                .with_param("second", int_param().with_default(json!(2)))
                .with_param("third", int_param().with_default(json!(3))),
            )
            .unwrap();

        for _ in 0..3 {
            let result = bridge.invoke("f", &ArgMap::new()).unwrap();
            assert_eq!(result.value(), Some(&json!(["first", "second", "third"])));
        }
    }

    #[test]
    fn invalid_choice_fails_despite_default() {
        let mut bridge = Bridge::new("b");
        bridge
            .register(
                Registration::new("f", |args| Ok(args["op"].clone())).with_param(
                    "op",
                    ParameterSpec::required(
                        ParamType::String,
                        MenuSelection::new([json!("+"), json!("-")]),
                    )
                    .with_default(json!("+")),
                ),
            )
            .unwrap();

        let err = bridge
            .invoke("f", &overrides(&[("op", json!("%"))]))
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidChoice { .. }));
    }

    #[test]
    fn pre_hooks_run_in_order_and_see_resolved_args() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut bridge = Bridge::new("b");
        for tag in ["one", "two"] {
            let seen = seen.clone();
            bridge.add_pre_hook(move |args, meta| {
                seen.lock().unwrap().push((tag, meta.name.clone(), args["a"].clone()));
                Ok(())
            });
        }
        bridge
            .register(
                Registration::new("f", |_| Ok(json!(null))).with_param("a", int_param()),
            )
            .unwrap();

        bridge.invoke("f", &overrides(&[("a", json!("7"))])).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![("one", "f".to_string(), json!(7)), ("two", "f".to_string(), json!(7))]);
    }

    #[test]
    fn failing_pre_hook_skips_execution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mut bridge = Bridge::new("b");
        bridge.add_pre_hook(|_, _| {
            Err(BridgeError::Validation {
                param: "a".into(),
                reason: "denied".into(),
            })
        });
        bridge
            .register(Registration::new("f", move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(json!(null))
            }))
            .unwrap();

        let err = bridge.invoke("f", &ArgMap::new()).unwrap_err();
        assert!(matches!(err, BridgeError::Hook { stage: HookStage::Pre, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn execution_fault_runs_error_hooks_and_skips_dispatch() {
        let faults = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = faults.clone();
        let mut bridge = Bridge::new("b");
        bridge.add_error_hook(move |fault, _meta| {
            seen.lock().unwrap().push(fault.to_string());
            Ok(())
        });
        bridge
            .register(
                Registration::new("boom", |_| Err("it broke".to_string()))
                    .with_output(ContextStore::new("out")),
            )
            .unwrap();

        let result = bridge.invoke("boom", &ArgMap::new()).unwrap();
        assert!(!result.is_success());
        assert!(result.destinations.is_empty());
        assert!(result.fault().unwrap().to_string().contains("it broke"));
        assert_eq!(faults.lock().unwrap().len(), 1);
        // Dispatch skipped: nothing stored.
        assert!(bridge.context().get("out").is_none());
    }

    #[test]
    fn failing_error_hook_is_swallowed() {
        let mut bridge = Bridge::new("b");
        bridge.add_error_hook(|_, _| {
            Err(BridgeError::Validation {
                param: "x".into(),
                reason: "hook broke too".into(),
            })
        });
        bridge
            .register(Registration::new("boom", |_| Err("fault".to_string())))
            .unwrap();

        // The hook failure is logged, not surfaced.
        let result = bridge.invoke("boom", &ArgMap::new()).unwrap();
        assert!(!result.is_success());
    }

    #[test]
    fn post_hooks_see_the_result() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let slot = seen.clone();
        let mut bridge = Bridge::new("b");
        bridge.add_post_hook(move |value, _meta| {
            *slot.lock().unwrap() = Some(value.clone());
            Ok(())
        });
        bridge.register(add_registration()).unwrap();

        bridge
            .invoke("add", &overrides(&[("a", json!(1)), ("b", json!(2))]))
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!(3)));
    }

    #[test]
    fn failing_destination_does_not_stop_the_rest() {
        struct Exploding;
        impl OutputDestination for Exploding {
            fn send(
                &self,
                _value: &Value,
                _context: &mut Context,
            ) -> Result<Option<String>> {
                Err(BridgeError::DestinationFailure {
                    kind: crate::output::DestinationKind::Custom,
                    message: "sink offline".to_string(),
                })
            }
        }

        let mut bridge = Bridge::new("b");
        bridge
            .register(
                add_registration()
                    .with_output(Exploding)
                    .with_output(ContextStore::new("last_result")),
            )
            .unwrap();

        let result = bridge
            .invoke("add", &overrides(&[("a", json!(2)), ("b", json!(3))]))
            .unwrap();

        assert!(result.is_partial());
        assert!(!result.destinations[0].succeeded());
        assert!(result.destinations[1].succeeded());
        // The second destination's side effect is still observed.
        assert_eq!(bridge.context().get("last_result"), Some(&json!(5)));
    }

    #[test]
    fn file_write_destination_persists_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");
        let mut bridge = Bridge::new("b");
        bridge
            .register(add_registration().with_output(FileWrite::new(&path)))
            .unwrap();

        bridge
            .invoke("add", &overrides(&[("a", json!(20)), ("b", json!(22))]))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42");
    }

    #[test]
    fn default_producer_reads_context_before_dispatch() {
        let mut bridge = Bridge::new("b");
        bridge
            .register(
                Registration::new("inc", |args| {
                    let current = args["current"].as_i64().ok_or("not an integer")?;
                    let amount = args["amount"].as_i64().ok_or("not an integer")?;
                    Ok(json!(current + amount))
                })
                .with_param(
                    "current",
                    ParameterSpec::required(ParamType::Integer, ContextLookup::new("value"))
                        .with_default(json!(0)),
                )
                .with_param("amount", int_param().with_default(json!(1)))
                .with_output(ContextStore::new("value")),
            )
            .unwrap();

        bridge.invoke("inc", &ArgMap::new()).unwrap();
        bridge
            .invoke("inc", &overrides(&[("amount", json!(10))]))
            .unwrap();
        assert_eq!(bridge.context().get("value"), Some(&json!(11)));
    }

    #[test]
    fn instances_have_isolated_contexts() {
        let mut bridge = Bridge::new("counter");
        bridge
            .register(
                Registration::new("increment", |args| {
                    let current = args["current"].as_i64().ok_or("not an integer")?;
                    let amount = args["amount"].as_i64().ok_or("not an integer")?;
                    Ok(json!(current + amount))
                })
                .with_param(
                    "current",
                    ParameterSpec::required(ParamType::Integer, ContextLookup::new("value"))
                        .with_default(json!(0)),
                )
                .with_param("amount", int_param().with_default(json!(1)))
                .with_output(ContextStore::new("value")),
            )
            .unwrap();
        bridge.create_instance("alice").unwrap();
        bridge.create_instance("bob").unwrap();

        bridge
            .invoke_on("alice", "increment", &overrides(&[("amount", json!(5))]))
            .unwrap();

        assert_eq!(
            bridge.instance_context("alice").unwrap().get("value"),
            Some(&json!(5))
        );
        // Bob's context is untouched.
        assert!(bridge.instance_context("bob").unwrap().get("value").is_none());
        // So is the bridge-owned context.
        assert!(bridge.context().get("value").is_none());
    }

    #[test]
    fn duplicate_and_unknown_instances_fail() {
        let mut bridge = Bridge::new("b");
        bridge
            .register(Registration::new("f", |_| Ok(json!(null))))
            .unwrap();
        bridge.create_instance("alice").unwrap();
        assert!(matches!(
            bridge.create_instance("alice"),
            Err(BridgeError::DuplicateInstance(name)) if name == "alice"
        ));
        assert!(matches!(
            bridge.invoke_on("ghost", "f", &ArgMap::new()),
            Err(BridgeError::UnknownInstance(name)) if name == "ghost"
        ));
    }
}
