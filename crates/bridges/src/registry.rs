//! Named collection of bridges with one active selection.

use indexmap::IndexMap;

use crate::bridge::{Bridge, InvocationResult};
use crate::error::{BridgeError, Result};
use crate::registration::ArgMap;

/// Holds named bridges and tracks which one is active.
///
/// The first bridge added becomes active. Instance enumeration and
/// instance-scoped invocation are forwarded to the owning bridge, so multiple
/// independently-named stateful instances live under one registry without
/// sharing context.
#[derive(Default)]
pub struct BridgeRegistry {
    bridges: IndexMap<String, Bridge>,
    active: Option<String>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bridge. Fails with [`BridgeError::DuplicateBridge`] on a name
    /// collision; the first bridge added becomes the active selection.
    pub fn add(&mut self, bridge: Bridge) -> Result<()> {
        let name = bridge.name().to_string();
        if self.bridges.contains_key(&name) {
            return Err(BridgeError::DuplicateBridge(name));
        }
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        self.bridges.insert(name, bridge);
        Ok(())
    }

    /// Make `name` the active bridge.
    pub fn switch(&mut self, name: &str) -> Result<()> {
        if !self.bridges.contains_key(name) {
            return Err(BridgeError::UnknownBridge(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// The currently active bridge, if any.
    pub fn active(&self) -> Option<&Bridge> {
        self.active.as_ref().and_then(|name| self.bridges.get(name))
    }

    /// Mutable access to the active bridge.
    pub fn active_mut(&mut self) -> Option<&mut Bridge> {
        let name = self.active.clone()?;
        self.bridges.get_mut(&name)
    }

    /// Bridge names in insertion order.
    pub fn list(&self) -> Vec<&str> {
        self.bridges.keys().map(String::as_str).collect()
    }

    pub fn bridge(&self, name: &str) -> Result<&Bridge> {
        self.bridges
            .get(name)
            .ok_or_else(|| BridgeError::UnknownBridge(name.to_string()))
    }

    pub fn bridge_mut(&mut self, name: &str) -> Result<&mut Bridge> {
        self.bridges
            .get_mut(name)
            .ok_or_else(|| BridgeError::UnknownBridge(name.to_string()))
    }

    /// Invoke a registration on a named bridge.
    pub fn invoke(
        &mut self,
        bridge: &str,
        registration: &str,
        overrides: &ArgMap,
    ) -> Result<InvocationResult> {
        self.bridge_mut(bridge)?.invoke(registration, overrides)
    }

    /// Invoke a registration against a named instance of a bridge.
    pub fn invoke_on(
        &mut self,
        bridge: &str,
        instance: &str,
        registration: &str,
        overrides: &ArgMap,
    ) -> Result<InvocationResult> {
        self.bridge_mut(bridge)?
            .invoke_on(instance, registration, overrides)
    }

    /// Active instance names for a bridge, in creation order.
    pub fn instances(&self, bridge: &str) -> Result<Vec<&str>> {
        Ok(self.bridge(bridge)?.instance_names())
    }
}
