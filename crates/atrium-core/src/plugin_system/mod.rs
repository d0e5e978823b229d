//! # Atrium Plugin System
//!
//! Infrastructure for extending the Atrium host through declared plugin
//! units. It covers the entire lifecycle: candidate registration, manifest
//! validation and sub-plugin expansion, dependency resolution into a
//! deterministic load order, instantiation, and the gated setup → start →
//! enabled → shutdown state machine.
//!
//! ## Key submodules and responsibilities:
//!
//! - **[`identifier`]**: the `group:name` identity of a plugin unit.
//! - **[`manifest`]**: declared metadata ([`PluginManifest`]), the builder,
//!   and sub-plugin inheritance.
//! - **[`candidate`]**: units awaiting load ([`CandidateUnit`]) and the
//!   registry that collects and expands them.
//! - **[`dependency`]**: declared relations between units and the errors a
//!   single unit's validation can produce.
//! - **[`resolver`]**: version validation and the topological load order,
//!   with composite diagnostics for missing and cyclic relations.
//! - **[`state`]**: the ordered [`PluginState`] enumeration shared by
//!   plugins and the service.
//! - **[`instance`]**: live instances and the injected per-plugin context.
//! - **[`lifecycle`]**: the gated setup/start/stop passes and fault
//!   isolation.
//! - **[`manager`]**: the [`PluginService`] façade exposed to the host.
//! - **[`traits`]**: the [`Plugin`] hook trait and the instance factory.
//! - **[`version`]**: semver-backed version ranges.

pub mod candidate;
pub mod dependency;
pub mod error;
pub mod identifier;
pub mod instance;
mod lifecycle;
pub mod manager;
pub mod manifest;
pub mod resolver;
pub mod state;
pub mod traits;
pub mod version;

pub use candidate::{CandidateRegistry, CandidateUnit};
pub use dependency::PluginDependency;
pub use identifier::PluginIdentifier;
pub use instance::{PluginContext, PluginInstance, PluginLogger};
pub use manager::PluginService;
pub use manifest::{ManifestBuilder, PluginManifest};
pub use state::PluginState;
pub use traits::{Plugin, PluginError, PluginFactory};
pub use version::VersionRange;

#[cfg(test)]
mod tests;
