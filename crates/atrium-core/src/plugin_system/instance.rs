use std::fmt;
use std::sync::Arc;

use log::Level;

use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::state::PluginState;
use crate::plugin_system::traits::Plugin;

/// Log handle scoped to a single plugin.
///
/// Messages are emitted through the `log` facade with a target derived from
/// the plugin's name, so sinks can route or filter per plugin.
#[derive(Debug, Clone)]
pub struct PluginLogger {
    target: String,
}

impl PluginLogger {
    pub fn for_plugin(name: &str) -> Self {
        Self {
            target: format!("{}.plugin", name),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn debug(&self, message: &str) {
        log::log!(target: self.target.as_str(), Level::Debug, "{}", message);
    }

    pub fn info(&self, message: &str) {
        log::log!(target: self.target.as_str(), Level::Info, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        log::log!(target: self.target.as_str(), Level::Warn, "{}", message);
    }

    pub fn error(&self, message: &str) {
        log::log!(target: self.target.as_str(), Level::Error, "{}", message);
    }
}

/// What the engine injects around a constructed plugin: its manifest, its
/// identifier, and a logger scoped to it. Passed to every hook.
#[derive(Debug, Clone)]
pub struct PluginContext {
    manifest: Arc<PluginManifest>,
    id: PluginIdentifier,
    logger: PluginLogger,
}

impl PluginContext {
    pub fn new(manifest: Arc<PluginManifest>, id: PluginIdentifier) -> Self {
        let logger = PluginLogger::for_plugin(id.name());
        Self { manifest, id, logger }
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    pub fn id(&self) -> &PluginIdentifier {
        &self.id
    }

    pub fn logger(&self) -> &PluginLogger {
        &self.logger
    }
}

/// A live, lifecycle-bearing plugin. Identity equals the manifest
/// identifier; transitions mutate the state field only.
#[derive(Clone)]
pub struct PluginInstance {
    manifest: Arc<PluginManifest>,
    id: PluginIdentifier,
    plugin: Arc<dyn Plugin>,
    context: PluginContext,
    state: PluginState,
}

impl PluginInstance {
    pub fn new(manifest: Arc<PluginManifest>, id: PluginIdentifier, plugin: Arc<dyn Plugin>) -> Self {
        let context = PluginContext::new(manifest.clone(), id.clone());
        Self {
            manifest,
            id,
            plugin,
            context,
            state: PluginState::None,
        }
    }

    pub fn id(&self) -> &PluginIdentifier {
        &self.id
    }

    pub fn manifest(&self) -> &Arc<PluginManifest> {
        &self.manifest
    }

    pub fn version(&self) -> Option<&str> {
        self.manifest.version.as_deref()
    }

    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PluginState) {
        self.state = state;
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("id", &self.id)
            .field("version", &self.manifest.version)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
