//! The plugin service façade.
//!
//! [`PluginService`] owns the candidate registry, the live-instance map, and
//! the service-wide state. Lifecycle operations (`setup`, `start`, `stop`,
//! `load`, `unload`, `reload`) are serialized through a single async mutex;
//! read-only queries bypass it and observe a snapshot-consistent view of the
//! live map.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, RwLock};

use semver::Version;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::plugin_system::candidate::{CandidateRegistry, CandidateUnit};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::instance::PluginInstance;
use crate::plugin_system::lifecycle::LifecycleEngine;
use crate::plugin_system::resolver;
use crate::plugin_system::state::PluginState;
use crate::plugin_system::traits::PluginFactory;
use crate::plugin_system::version::VersionRange;

pub struct PluginService {
    host_version: Version,
    factory: Arc<dyn PluginFactory>,
    /// Serializes lifecycle operations; never held across a query.
    lifecycle_gate: Mutex<()>,
    state: RwLock<PluginState>,
    registry: StdMutex<CandidateRegistry>,
    /// Every candidate ever drained, including disabled-by-default units,
    /// so runtime `load` can locate them.
    available: RwLock<BTreeMap<PluginIdentifier, CandidateUnit>>,
    engine: LifecycleEngine,
    /// Resolved order cached between the setup and start passes.
    load_order: StdMutex<Option<Vec<PluginIdentifier>>>,
    /// Instantiation order, consumed in reverse at shutdown.
    load_sequence: StdMutex<Vec<PluginIdentifier>>,
}

impl PluginService {
    pub fn new(host_version: Version, factory: Arc<dyn PluginFactory>) -> Self {
        Self {
            host_version,
            factory,
            lifecycle_gate: Mutex::new(()),
            state: RwLock::new(PluginState::None),
            registry: StdMutex::new(CandidateRegistry::new()),
            available: RwLock::new(BTreeMap::new()),
            engine: LifecycleEngine::new(),
            load_order: StdMutex::new(None),
            load_sequence: StdMutex::new(Vec::new()),
        }
    }

    /// Construct the service with an initial candidate set.
    pub fn with_candidates(
        host_version: Version,
        factory: Arc<dyn PluginFactory>,
        candidates: Vec<CandidateUnit>,
    ) -> Result<Self, PluginSystemError> {
        let service = Self::new(host_version, factory);
        for unit in candidates {
            service.register(unit)?;
        }
        Ok(service)
    }

    /// Register a candidate unit (and, transitively, its sub-units).
    ///
    /// Only valid before `setup`. A duplicate identifier is reported as an
    /// error; whether that aborts startup is the host's call.
    pub fn register(&self, unit: CandidateUnit) -> Result<(), PluginSystemError> {
        let state = self.state();
        if state != PluginState::None {
            return Err(PluginSystemError::InvalidServiceState {
                operation: "register",
                required: "None",
                actual: state,
            });
        }
        self.registry.lock().expect("registry poisoned").register(unit)
    }

    /// Current service-wide state.
    pub fn state(&self) -> PluginState {
        *self.state.read().expect("state poisoned")
    }

    pub fn host_version(&self) -> &Version {
        &self.host_version
    }

    /// Drain the registry, resolve a load order, instantiate the candidates,
    /// and run the gated setup pass over them.
    pub async fn setup(&self, cancel: &CancellationToken) -> Result<(), PluginSystemError> {
        let _gate = self.lifecycle_gate.lock().await;
        self.transition(PluginState::None, PluginState::Setup, "setup")?;

        let drained = self.registry.lock().expect("registry poisoned").drain();
        {
            let mut available = self.available.write().expect("catalog poisoned");
            for (id, unit) in &drained {
                available.insert(id.clone(), unit.clone());
            }
        }

        let boot: BTreeMap<_, _> = drained
            .into_iter()
            .filter(|(id, unit)| {
                if unit.manifest.disabled_by_default {
                    log::info!("Plugin '{}' is disabled by default; registered as available only", id);
                    false
                } else {
                    true
                }
            })
            .collect();

        let (validated, dropped) =
            resolver::validate_candidates(boot, &self.host_version, &self.loaded_versions());
        for (id, reason) in &dropped {
            log::error!("Dropping candidate '{}': {}", id, reason);
        }

        let ordered = match resolver::resolve_load_order(validated) {
            Ok(ordered) => ordered,
            Err(e) => {
                // Leave the service re-armable with a corrected candidate set.
                *self.state.write().expect("state poisoned") = PluginState::None;
                return Err(e.into());
            }
        };

        let mut order_ids = Vec::with_capacity(ordered.len());
        for unit in ordered {
            match self.instantiate(&unit) {
                Ok(instance) => {
                    let id = instance.id().clone();
                    if self.engine.insert_if_absent(instance) {
                        self.load_sequence.lock().expect("sequence poisoned").push(id.clone());
                        order_ids.push(id);
                    }
                }
                Err(e) => log::error!("{}", e),
            }
        }

        log::info!("Running setup pass over {} plugin(s)", order_ids.len());
        self.engine.setup_pass(&order_ids, cancel).await;
        *self.load_order.lock().expect("order poisoned") = Some(order_ids);
        Ok(())
    }

    /// Run the gated start pass over the order produced by `setup`. The
    /// cached order is discarded on completion.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), PluginSystemError> {
        let _gate = self.lifecycle_gate.lock().await;
        self.transition(PluginState::Setup, PluginState::Start, "start")?;

        let order = self
            .load_order
            .lock()
            .expect("order poisoned")
            .take()
            .ok_or_else(|| PluginSystemError::InternalError("no load order cached for start".to_string()))?;

        log::info!("Running start pass over {} plugin(s)", order.len());
        self.engine.start_pass(&order, cancel).await;
        Ok(())
    }

    /// Shut down every enabled instance in reverse-load order, then clear
    /// the live map. Never cancelled and never fails; stop hooks run to
    /// completion and their errors are logged.
    pub async fn stop(&self, _cancel: &CancellationToken) {
        let _gate = self.lifecycle_gate.lock().await;
        *self.state.write().expect("state poisoned") = PluginState::Shutdown;

        let sequence = std::mem::take(&mut *self.load_sequence.lock().expect("sequence poisoned"));
        for id in sequence.iter().rev() {
            if let Some(instance) = self.engine.get(id) {
                if instance.state() == PluginState::Enabled {
                    self.engine.shutdown_instance(id).await;
                }
            }
        }
        self.engine.clear();
        *self.load_order.lock().expect("order poisoned") = None;
        log::info!("All plugins shut down");
    }

    /// Load a single registered candidate at runtime, driving it through
    /// setup and start with dependency gating. Returns whether the plugin
    /// ended up `Enabled`.
    pub async fn load(
        &self,
        id: &PluginIdentifier,
        cancel: &CancellationToken,
    ) -> Result<bool, PluginSystemError> {
        let _gate = self.lifecycle_gate.lock().await;
        self.load_locked(id, cancel).await
    }

    /// Shut down and remove a single instance. Refused (returning `false`)
    /// while any enabled instance still hard-depends on it, so dependents
    /// are never silently orphaned.
    pub async fn unload(
        &self,
        id: &PluginIdentifier,
        cancel: &CancellationToken,
    ) -> Result<bool, PluginSystemError> {
        let _gate = self.lifecycle_gate.lock().await;
        self.unload_locked(id, cancel).await
    }

    /// `unload` followed by `load`; true only when both succeed.
    pub async fn reload(
        &self,
        id: &PluginIdentifier,
        cancel: &CancellationToken,
    ) -> Result<bool, PluginSystemError> {
        let _gate = self.lifecycle_gate.lock().await;
        if !self.unload_locked(id, cancel).await? {
            return Ok(false);
        }
        self.load_locked(id, cancel).await
    }

    /// Snapshot of every live instance.
    pub fn get_plugins(&self) -> Vec<PluginInstance> {
        self.engine.snapshot()
    }

    pub fn get_plugin(&self, id: &PluginIdentifier) -> Result<PluginInstance, PluginSystemError> {
        self.engine
            .get(id)
            .ok_or_else(|| PluginSystemError::PluginNotFound(id.to_string()))
    }

    pub fn try_get_plugin(&self, id: &PluginIdentifier) -> Option<PluginInstance> {
        self.engine.get(id)
    }

    /// Whether a live instance exists for `id`, optionally also checking
    /// that its declared version satisfies `range`.
    pub fn has_plugin(&self, id: &PluginIdentifier, range: Option<&VersionRange>) -> bool {
        let Some(instance) = self.engine.get(id) else {
            return false;
        };
        match range {
            None => true,
            Some(range) => match instance.version().map(semver::Version::parse) {
                Some(Ok(version)) => range.includes(&version),
                _ => false,
            },
        }
    }

    async fn load_locked(
        &self,
        id: &PluginIdentifier,
        cancel: &CancellationToken,
    ) -> Result<bool, PluginSystemError> {
        let state = self.state();
        if state < PluginState::Setup {
            return Err(PluginSystemError::InvalidServiceState {
                operation: "load",
                required: "Setup or later",
                actual: state,
            });
        }

        let Some(unit) = self.available.read().expect("catalog poisoned").get(id).cloned() else {
            log::warn!("Cannot load '{}': no such candidate is registered", id);
            return Ok(false);
        };

        let mut single = BTreeMap::new();
        single.insert(id.clone(), unit);
        let (validated, dropped) =
            resolver::validate_candidates(single, &self.host_version, &self.loaded_versions());
        if let Some((_, reason)) = dropped.first() {
            log::error!("Cannot load '{}': {}", id, reason);
            return Ok(false);
        }
        let unit = validated
            .into_values()
            .next()
            .ok_or_else(|| PluginSystemError::InternalError("validated candidate vanished".to_string()))?;

        if !self.engine.contains(id) {
            let instance = match self.instantiate(&unit) {
                Ok(instance) => instance,
                Err(e) => {
                    log::error!("{}", e);
                    return Ok(false);
                }
            };
            self.engine.insert_if_absent(instance);
            self.load_sequence.lock().expect("sequence poisoned").push(id.clone());
        }

        if !self.engine.setup_instance(id, cancel).await {
            self.forget_sequence(id);
            return Ok(false);
        }
        if !self.engine.start_instance(id, cancel).await {
            self.forget_sequence(id);
            return Ok(false);
        }
        Ok(true)
    }

    async fn unload_locked(
        &self,
        id: &PluginIdentifier,
        _cancel: &CancellationToken,
    ) -> Result<bool, PluginSystemError> {
        let state = self.state();
        if state < PluginState::Setup {
            return Err(PluginSystemError::InvalidServiceState {
                operation: "unload",
                required: "Setup or later",
                actual: state,
            });
        }

        let Some(instance) = self.engine.get(id) else {
            log::warn!("Cannot unload '{}': not loaded", id);
            return Ok(false);
        };
        if instance.state() != PluginState::Enabled {
            log::warn!("Cannot unload '{}': plugin is {}", id, instance.state());
            return Ok(false);
        }

        let dependents = self.engine.enabled_dependents(id);
        if !dependents.is_empty() {
            let names: Vec<String> = dependents.iter().map(|d| d.to_string()).collect();
            log::error!("Cannot unload '{}': still required by {}", id, names.join(", "));
            return Ok(false);
        }

        self.engine.disable_and_remove(id).await;
        self.forget_sequence(id);
        Ok(true)
    }

    fn instantiate(&self, unit: &CandidateUnit) -> Result<PluginInstance, PluginSystemError> {
        let id = unit.identifier()?;
        let Some(entry_point) = unit.manifest.entry_point.as_deref() else {
            return Err(PluginSystemError::InstantiationError {
                id: id.to_string(),
                message: "manifest declares no entry point".to_string(),
            });
        };
        let plugin = self.factory.construct(entry_point, &unit.manifest)?;
        Ok(PluginInstance::new(unit.manifest.clone(), id, Arc::from(plugin)))
    }

    fn loaded_versions(&self) -> BTreeMap<PluginIdentifier, Option<Version>> {
        self.engine
            .snapshot()
            .into_iter()
            .map(|instance| {
                let version = instance.version().and_then(|v| Version::parse(v).ok());
                (instance.id().clone(), version)
            })
            .collect()
    }

    fn forget_sequence(&self, id: &PluginIdentifier) {
        self.load_sequence.lock().expect("sequence poisoned").retain(|entry| entry != id);
    }

    fn transition(
        &self,
        required: PluginState,
        next: PluginState,
        operation: &'static str,
    ) -> Result<(), PluginSystemError> {
        let mut state = self.state.write().expect("state poisoned");
        if *state != required {
            return Err(PluginSystemError::InvalidServiceState {
                operation,
                required: match required {
                    PluginState::None => "None",
                    PluginState::Setup => "Setup",
                    _ => "a different state",
                },
                actual: *state,
            });
        }
        *state = next;
        Ok(())
    }
}

impl std::fmt::Debug for PluginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginService")
            .field("host_version", &self.host_version)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
