//! The per-plugin state machine and the gated setup/start/stop passes.
//!
//! Every hook invocation is isolated: a hook error (or a cancellation
//! observed around it) disables that plugin and never reaches its peers or
//! the service façade. The live-instance map is only locked for brief,
//! non-suspending reads and writes; hooks always run with the lock released.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;

use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::instance::{PluginContext, PluginInstance};
use crate::plugin_system::state::PluginState;
use crate::plugin_system::traits::Plugin;

#[derive(Debug, Default)]
pub(crate) struct LifecycleEngine {
    instances: Arc<RwLock<HashMap<PluginIdentifier, PluginInstance>>>,
}

impl LifecycleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every live instance.
    pub fn snapshot(&self) -> Vec<PluginInstance> {
        self.instances.read().expect("live map poisoned").values().cloned().collect()
    }

    pub fn get(&self, id: &PluginIdentifier) -> Option<PluginInstance> {
        self.instances.read().expect("live map poisoned").get(id).cloned()
    }

    pub fn contains(&self, id: &PluginIdentifier) -> bool {
        self.instances.read().expect("live map poisoned").contains_key(id)
    }

    /// Insert the instance unless one with the same identifier is live.
    /// Returns whether the map changed.
    pub fn insert_if_absent(&self, instance: PluginInstance) -> bool {
        let mut map = self.instances.write().expect("live map poisoned");
        if map.contains_key(instance.id()) {
            return false;
        }
        map.insert(instance.id().clone(), instance);
        true
    }

    pub fn remove(&self, id: &PluginIdentifier) -> Option<PluginInstance> {
        self.instances.write().expect("live map poisoned").remove(id)
    }

    pub fn clear(&self) {
        self.instances.write().expect("live map poisoned").clear();
    }

    /// Identifiers of live `Enabled` instances that hard-depend on `id`.
    pub fn enabled_dependents(&self, id: &PluginIdentifier) -> Vec<PluginIdentifier> {
        let map = self.instances.read().expect("live map poisoned");
        map.values()
            .filter(|inst| inst.state() == PluginState::Enabled && inst.manifest().depends_on(id))
            .map(|inst| inst.id().clone())
            .collect()
    }

    fn set_state(&self, id: &PluginIdentifier, state: PluginState) {
        if let Some(instance) = self.instances.write().expect("live map poisoned").get_mut(id) {
            instance.set_state(state);
        }
    }

    /// Check that every hard dependency of `id` is live and has reached
    /// `required`. Comparison uses the state ordering, so a dependency that
    /// has advanced past the required state still satisfies the gate.
    fn check_dependency_gate(
        &self,
        id: &PluginIdentifier,
        required: PluginState,
        stage: &str,
    ) -> Result<(), String> {
        let map = self.instances.read().expect("live map poisoned");
        let Some(instance) = map.get(id) else {
            return Err(format!("plugin '{}' is not in the live map", id));
        };
        for dep in instance.manifest().hard_dependencies() {
            match map.get(&dep.id) {
                None => {
                    return Err(format!(
                        "cannot run {} for '{}': dependency '{}' is not loaded",
                        stage, id, dep.id
                    ));
                }
                Some(dep_instance) if dep_instance.state() < required => {
                    return Err(format!(
                        "cannot run {} for '{}': dependency '{}' is {} but {} requires at least {}",
                        stage,
                        id,
                        dep.id,
                        dep_instance.state(),
                        stage,
                        required
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Drive one instance through the setup stage. Returns whether the
    /// instance is still live afterwards.
    pub async fn setup_instance(&self, id: &PluginIdentifier, cancel: &CancellationToken) -> bool {
        if let Err(message) = self.check_dependency_gate(id, PluginState::Setup, "Setup") {
            log::error!("{}", message);
            self.disable_and_remove(id).await;
            return false;
        }

        let Some((plugin, context)) = self.hook_parts(id) else {
            return false;
        };

        log::debug!("Setting up plugin '{}'", id);
        self.set_state(id, PluginState::Setup);

        let result = if cancel.is_cancelled() {
            Err("setup cancelled before it began".to_string())
        } else {
            match plugin.setup(&context, cancel).await {
                Ok(()) if cancel.is_cancelled() => Err("setup observed cancellation".to_string()),
                Ok(()) => Ok(()),
                Err(e) => Err(e.to_string()),
            }
        };

        match result {
            Ok(()) => true,
            Err(message) => {
                log::error!("Setup of plugin '{}' failed: {}", id, message);
                self.disable_and_remove(id).await;
                false
            }
        }
    }

    /// Drive one instance through the start stage. Returns whether the
    /// instance ended up `Enabled`.
    pub async fn start_instance(&self, id: &PluginIdentifier, cancel: &CancellationToken) -> bool {
        if let Err(message) = self.check_dependency_gate(id, PluginState::Enabled, "Start") {
            log::error!("{}", message);
            self.disable_and_remove(id).await;
            return false;
        }

        let Some((plugin, context)) = self.hook_parts(id) else {
            return false;
        };

        log::debug!("Starting plugin '{}'", id);
        self.set_state(id, PluginState::Start);

        let result = if cancel.is_cancelled() {
            Err("start cancelled before it began".to_string())
        } else {
            match plugin.start(&context, cancel).await {
                Ok(()) if cancel.is_cancelled() => Err("start observed cancellation".to_string()),
                Ok(()) => Ok(()),
                Err(e) => Err(e.to_string()),
            }
        };

        match result {
            Ok(()) => {
                self.set_state(id, PluginState::Enabled);
                log::info!("Plugin '{}' enabled", id);
                true
            }
            Err(message) => {
                log::error!("Start of plugin '{}' failed: {}", id, message);
                self.disable_and_remove(id).await;
                false
            }
        }
    }

    /// Drive one instance through shutdown. The stop hook runs to
    /// completion; its errors are logged, never propagated, and the state
    /// ends at `Disabled` regardless. The instance stays in the map.
    pub async fn shutdown_instance(&self, id: &PluginIdentifier) {
        let Some((plugin, context)) = self.hook_parts(id) else {
            return;
        };

        log::debug!("Shutting down plugin '{}'", id);
        self.set_state(id, PluginState::Shutdown);

        if let Err(e) = plugin.stop(&context).await {
            log::error!("Stop hook of plugin '{}' failed: {}", id, e);
        }
        self.set_state(id, PluginState::Disabled);
    }

    /// Shutdown followed by removal from the live map.
    pub async fn disable_and_remove(&self, id: &PluginIdentifier) {
        self.shutdown_instance(id).await;
        self.remove(id);
    }

    /// Run the setup stage over the resolved order, strictly in sequence.
    pub async fn setup_pass(&self, order: &[PluginIdentifier], cancel: &CancellationToken) {
        for id in order {
            self.setup_instance(id, cancel).await;
        }
    }

    /// Run the start stage over the resolved order, strictly in sequence.
    /// Only instances that survived setup are touched.
    pub async fn start_pass(&self, order: &[PluginIdentifier], cancel: &CancellationToken) {
        for id in order {
            if self.contains(id) {
                self.start_instance(id, cancel).await;
            }
        }
    }

    fn hook_parts(&self, id: &PluginIdentifier) -> Option<(Arc<dyn Plugin>, PluginContext)> {
        let map = self.instances.read().expect("live map poisoned");
        map.get(id).map(|inst| (inst.plugin().clone(), inst.context().clone()))
    }
}
